// ABOUTME: Audit record type definitions
// ABOUTME: One record per attempt outcome, mirrored by the error_log table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub component_id: Option<String>,
    pub error_message: String,
    pub fix_summary: String,
    pub success: bool,
    /// Repair cycle the record belongs to; 0 outside the repair loop
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        attempt: u32,
        error_message: impl Into<String>,
        fix_summary: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            component_id: None,
            error_message: error_message.into(),
            fix_summary: fix_summary.into(),
            success,
            attempt,
            created_at: Utc::now(),
        }
    }

    pub fn with_component_id(mut self, component_id: impl Into<String>) -> Self {
        self.component_id = Some(component_id.into());
        self
    }
}
