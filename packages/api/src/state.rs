// ABOUTME: Shared handler state: the orchestrator and the server's single session
// ABOUTME: Built from configuration with the Node guest and the configured audit sink

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use adapt_ai::AIService;
use adapt_config::AdaptConfig;
use adapt_pipeline::{AuditLog, Orchestrator, SessionCell};
use adapt_sandbox::SandboxHost;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub session: Arc<SessionCell>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            session: Arc::new(SessionCell::new()),
        }
    }

    pub async fn from_config(config: &AdaptConfig) -> anyhow::Result<Self> {
        let ai = AIService::from_config(config).context("Failed to build AI client")?;
        let host = SandboxHost::from_config(config).context("Failed to locate render guest")?;
        let audit = AuditLog::from_config(config)
            .await
            .context("Failed to open audit log")?;

        let orchestrator = Orchestrator::from_config(config, Arc::new(ai), Arc::new(host), audit)
            .context("Failed to load system prompts")?;
        info!(
            max_attempts = orchestrator.config().max_attempts,
            "Orchestrator ready"
        );
        Ok(Self::new(orchestrator))
    }
}
