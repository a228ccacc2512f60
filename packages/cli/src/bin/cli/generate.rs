// ABOUTME: `adapt generate` runs the full loop for one prompt against the Node guest
// ABOUTME: Prints each repair attempt, the final status, and the accepted module

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::*;
use tracing::warn;

use adapt_ai::AIService;
use adapt_cli::args::{build_request, parse_mood};
use adapt_cli::display::{attempt_line, status_label};
use adapt_config::AdaptConfig;
use adapt_pipeline::{AuditLog, Orchestrator, RunOutcome, SessionCell};
use adapt_sandbox::SandboxHost;

pub struct GenerateOptions {
    pub prompt: String,
    pub mood: Option<String>,
    pub context: Vec<String>,
    pub max_attempts: Option<u32>,
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let mut config = AdaptConfig::from_env()?;
    if let Some(max_attempts) = options.max_attempts {
        config.max_attempts = max_attempts;
    }

    let mood = options.mood.as_deref().map(parse_mood).transpose()?;
    let request = build_request(&options.prompt, mood, &options.context);

    let ai = AIService::from_config(&config).context("Failed to build AI client")?;
    let host = Arc::new(SandboxHost::from_config(&config).context("Failed to locate render guest")?);
    let audit = AuditLog::from_config(&config).await?;
    let orchestrator = Orchestrator::from_config(&config, Arc::new(ai), host.clone(), audit)?;
    let session = SessionCell::new();

    println!("{} {}", "Generating:".bold(), options.prompt);
    let report = orchestrator.run(&session, request).await;
    host.stop().await;

    for attempt in &report.attempts {
        println!("{}", attempt_line(attempt));
    }
    println!(
        "{} {} after {} repair attempt(s)",
        "Status:".bold(),
        status_label(report.status()),
        report.attempts.len()
    );

    let failures = orchestrator.audit().failure_count();
    if failures > 0 {
        warn!(failures, "Some audit records could not be written");
    }

    match report.outcome {
        RunOutcome::Succeeded { code } => {
            println!();
            println!("{}", code);
            Ok(())
        }
        RunOutcome::Failed(e) => Err(e.into()),
        RunOutcome::Superseded => Ok(()),
    }
}
