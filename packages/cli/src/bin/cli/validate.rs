// ABOUTME: `adapt validate` checks a module file and prints the ValidationResult as JSON
// ABOUTME: Uses the remote validator plus heuristics, or heuristics alone when offline

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapt_ai::AIService;
use adapt_config::AdaptConfig;
use adapt_core::ValidationResult;
use adapt_pipeline::{heuristic_issues, AiValidator, ComponentValidator, SystemContracts};
use adapt_prompts::PromptManager;

pub async fn run(file: &Path, offline: bool) -> Result<()> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let result = if offline {
        let issues = heuristic_issues(&code);
        if issues.is_empty() {
            ValidationResult::passed()
        } else {
            ValidationResult::failed(issues)
        }
    } else {
        let config = AdaptConfig::from_env()?;
        let ai = AIService::from_config(&config).context("Failed to build AI client")?;
        let mut prompts = PromptManager::new(config.prompts_dir.clone());
        let contracts = SystemContracts::load(&mut prompts)?;

        AiValidator::new(Arc::new(ai), &config.validation_model, contracts.validator)
            .validate(&code)
            .await?
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
