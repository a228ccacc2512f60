// ABOUTME: Validator combining local heuristics with a remote semantic judgment
// ABOUTME: Fail-open on unparseable remote replies, fail-closed on heuristic findings

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use adapt_ai::{AIServiceError, ChatMessage, TextGeneration};
use adapt_core::constants::{DEFAULT_TEMPERATURE, VALIDATION_PAYLOAD_LIMIT};
use adapt_core::{extract_code, Issue, IssueKind, ValidationResult};

use crate::error::{PipelineError, Result};
use crate::heuristics::heuristic_issues;

const SERVICE: &str = "validator";

#[async_trait]
pub trait ComponentValidator: Send + Sync {
    /// Classify `code`; `Err` means the validator itself could not be reached
    async fn validate(&self, code: &str) -> Result<ValidationResult>;
}

#[derive(Debug, Deserialize)]
struct RemoteIssue {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteVerdict {
    #[serde(default = "default_valid")]
    valid: bool,
    #[serde(default)]
    issues: Vec<RemoteIssue>,
}

fn default_valid() -> bool {
    true
}

/// Parse the remote reply; anything unparseable counts as `valid: true` with no issues
pub fn parse_remote_verdict(reply: &str) -> ValidationResult {
    let body = extract_code(reply);
    match serde_json::from_str::<RemoteVerdict>(&body) {
        Ok(verdict) => ValidationResult {
            valid: verdict.valid,
            issues: verdict
                .issues
                .into_iter()
                .map(|issue| {
                    Issue::new(
                        issue.kind.map(IssueKind::from).unwrap_or(IssueKind::Behavioral),
                        issue
                            .message
                            .unwrap_or_else(|| "Unspecified issue".to_string()),
                    )
                })
                .collect(),
        },
        Err(e) => {
            warn!("Remote validator reply was not JSON, relying on heuristics: {}", e);
            ValidationResult::passed()
        }
    }
}

/// Union remote and local findings; heuristics act as a hard veto
pub fn merge_verdicts(remote: ValidationResult, local: Vec<Issue>) -> ValidationResult {
    let mut issues = remote.issues;
    issues.extend(local);
    ValidationResult {
        valid: remote.valid && issues.is_empty(),
        issues,
    }
}

/// Validator backed by the text-generation collaborator
pub struct AiValidator {
    ai: Arc<dyn TextGeneration>,
    model: String,
    system_prompt: String,
}

impl AiValidator {
    pub fn new(ai: Arc<dyn TextGeneration>, model: impl Into<String>, system_prompt: String) -> Self {
        Self {
            ai,
            model: model.into(),
            system_prompt,
        }
    }
}

#[async_trait]
impl ComponentValidator for AiValidator {
    async fn validate(&self, code: &str) -> Result<ValidationResult> {
        let local = heuristic_issues(code);
        let payload: String = code.chars().take(VALIDATION_PAYLOAD_LIMIT).collect();

        let messages = [
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(payload),
        ];

        let remote = match self
            .ai
            .complete(&self.model, &messages, DEFAULT_TEMPERATURE)
            .await
        {
            Ok(reply) => parse_remote_verdict(&reply),
            Err(AIServiceError::MalformedResponse { .. }) => {
                warn!("Remote validator envelope malformed, relying on heuristics");
                ValidationResult::passed()
            }
            Err(e) => return Err(PipelineError::from_ai(SERVICE, e)),
        };

        let result = merge_verdicts(remote, local);
        debug!(
            valid = result.valid,
            issues = result.issues.len(),
            "Validation finished"
        );
        Ok(result)
    }
}
