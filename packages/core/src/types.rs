// ABOUTME: Data model for the generate, validate, render, and repair loop
// ABOUTME: Session state, candidate modules, issues, validation results, and runtime reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a generation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Generating,
    Validating,
    Rendering,
    Repairing,
    Succeeded,
    Failed,
}

impl SessionStatus {
    /// Succeeded and Failed end an epoch; only a new prompt leaves them
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Succeeded | SessionStatus::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Generating => "generating",
            SessionStatus::Validating => "validating",
            SessionStatus::Rendering => "rendering",
            SessionStatus::Repairing => "repairing",
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// The only mutable state the orchestrator owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub current_code: Option<String>,
    pub status: SessionStatus,
    pub attempt: u32,
    pub last_error: Option<String>,
    pub generation_epoch: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            current_code: None,
            status: SessionStatus::Idle,
            attempt: 0,
            last_error: None,
            generation_epoch: 0,
        }
    }
}

/// Where a candidate module came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Generated,
    Repaired,
}

/// Immutable code string plus the step that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateModule {
    pub code: String,
    pub provenance: Provenance,
    pub attempt: u32,
}

impl CandidateModule {
    pub fn generated(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            provenance: Provenance::Generated,
            attempt: 0,
        }
    }

    pub fn repaired(code: impl Into<String>, attempt: u32) -> Self {
        Self {
            code: code.into(),
            provenance: Provenance::Repaired,
            attempt,
        }
    }
}

/// Category of a validation finding
///
/// Remote validators are free-form; anything that is not one of the known
/// categories (the original prompt used `react`) is treated as behavioral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum IssueKind {
    Security,
    Syntax,
    Behavioral,
    Performance,
}

impl From<String> for IssueKind {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "security" => IssueKind::Security,
            "syntax" => IssueKind::Syntax,
            "performance" => IssueKind::Performance,
            _ => IssueKind::Behavioral,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::Security => "security",
            IssueKind::Syntax => "syntax",
            IssueKind::Behavioral => "behavioral",
            IssueKind::Performance => "performance",
        };
        write!(f, "{}", s)
    }
}

/// A single validator finding, serialized as `{type, message}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Security, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Syntax, message)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn passed() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    pub fn failed(issues: Vec<Issue>) -> Self {
        Self {
            valid: false,
            issues,
        }
    }

    /// Issue messages joined with ` | `, the form used in audit records
    pub fn summary(&self) -> String {
        join_issue_messages(&self.issues)
    }
}

/// Join issue messages for audit records and error text
pub fn join_issue_messages(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join(" | ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderOutcome {
    Ok,
    Error,
}

/// What the sandbox boundary reports after attempting to mount a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeReport {
    pub outcome: RenderOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuntimeReport {
    pub fn ok() -> Self {
        Self {
            outcome: RenderOutcome::Ok,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            outcome: RenderOutcome::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == RenderOutcome::Ok
    }
}

/// One loop iteration, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairAttempt {
    pub attempt_index: u32,
    pub input_code: String,
    pub issues: Vec<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_error: Option<String>,
    /// None when the repairer call itself failed
    pub output_code: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_issue_wire_format() {
        let issue = Issue::syntax("Missing default export");
        let json = serde_json::to_string(&issue).unwrap();
        assert_eq!(json, r#"{"type":"syntax","message":"Missing default export"}"#);
    }

    #[test]
    fn test_unknown_issue_kind_maps_to_behavioral() {
        let issue: Issue =
            serde_json::from_str(r#"{"type":"react","message":"Missing key prop"}"#).unwrap();
        assert_eq!(issue.kind, IssueKind::Behavioral);

        let issue: Issue =
            serde_json::from_str(r#"{"type":"Security","message":"fetch"}"#).unwrap();
        assert_eq!(issue.kind, IssueKind::Security);
    }

    #[test]
    fn test_validation_result_defaults_issues() {
        let result: ValidationResult = serde_json::from_str(r#"{"valid":true}"#).unwrap();
        assert_eq!(result, ValidationResult::passed());
    }

    #[test]
    fn test_validation_summary_joins_messages() {
        let result = ValidationResult::failed(vec![
            Issue::syntax("Missing default export"),
            Issue::security("Contains fetch()"),
        ]);
        assert_eq!(result.summary(), "Missing default export | Contains fetch()");
    }

    #[test]
    fn test_session_starts_idle() {
        let session = Session::default();
        assert_eq!(session.status, SessionStatus::Idle);
        assert_eq!(session.generation_epoch, 0);
        assert!(session.current_code.is_none());
        assert!(!session.status.is_terminal());
    }

    #[test]
    fn test_runtime_report_serialization() {
        let json = serde_json::to_string(&RuntimeReport::ok()).unwrap();
        assert_eq!(json, r#"{"outcome":"ok"}"#);

        let report = RuntimeReport::error("boom");
        assert!(!report.is_ok());
        assert_eq!(report.message.as_deref(), Some("boom"));
    }
}
