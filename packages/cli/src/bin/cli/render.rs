// ABOUTME: `adapt render` mounts a module file once inside the sandbox guest
// ABOUTME: Prints the runtime report and the rendered markup

use std::path::Path;

use anyhow::{Context, Result};

use adapt_cli::args::parse_props;
use adapt_cli::display::report_line;
use adapt_config::AdaptConfig;
use adapt_pipeline::PipelineError;
use adapt_sandbox::SandboxHost;

pub async fn run(file: &Path, props: Option<&str>) -> Result<()> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let props = parse_props(props)?;

    let config = AdaptConfig::from_env()?;
    let host = SandboxHost::from_config(&config).context("Failed to locate render guest")?;
    let output = host.render_detailed(&code, &props).await;
    host.stop().await;
    let output = output?;

    println!("{}", report_line(&output.report));
    if let Some(markup) = &output.markup {
        println!("{}", markup);
    }

    if output.report.is_ok() {
        Ok(())
    } else {
        let message = output.report.message.unwrap_or_default();
        Err(PipelineError::GuestRuntimeFault(message).into())
    }
}
