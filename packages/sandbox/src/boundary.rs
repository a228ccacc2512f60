// ABOUTME: Render boundary abstraction consumed by the orchestrator
// ABOUTME: Lets the loop run against the Node.js guest or an in-process fake

use async_trait::async_trait;

use adapt_core::RuntimeReport;

use crate::Result;

/// Result of one render round-trip
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub report: RuntimeReport,
    pub markup: Option<String>,
}

impl RenderOutput {
    pub fn from_report(report: RuntimeReport) -> Self {
        Self {
            report,
            markup: None,
        }
    }
}

#[async_trait]
pub trait RenderBoundary: Send + Sync {
    /// Mount `code` with `props` inside the isolated guest.
    ///
    /// Component faults come back as an error `RuntimeReport`; `Err` is
    /// reserved for the boundary itself being unusable.
    async fn render(&self, code: &str, props: &serde_json::Value) -> Result<RenderOutput>;
}
