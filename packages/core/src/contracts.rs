// ABOUTME: Request and response bodies for the component endpoints
// ABOUTME: Generation, validation, and repair contracts shared by the pipeline and HTTP API

use serde::{Deserialize, Serialize};

use crate::types::Issue;

/// Optional mood hint passed to the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerateComponentRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<ContextItem>>,
}

impl GenerateComponentRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            mood: None,
            context: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateComponentResponse {
    pub code: String,
    pub description: String,
    pub intent: String,
    /// Set when the generated module has no export slot; does not block the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidateComponentRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairComponentRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairComponentResponse {
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IssueKind;

    #[test]
    fn test_repair_request_wire_names() {
        let json = r#"{"code":"x","issues":[{"type":"syntax","message":"m"}],"runtimeError":"boom"}"#;
        let request: RepairComponentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.issues[0].kind, IssueKind::Syntax);
        assert_eq!(request.runtime_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_generate_request_optional_fields() {
        let request: GenerateComponentRequest =
            serde_json::from_str(r#"{"prompt":"Create a counter"}"#).unwrap();
        assert_eq!(request, GenerateComponentRequest::new("Create a counter"));

        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"prompt":"Create a counter"}"#);
    }

    #[test]
    fn test_generate_request_with_mood_and_context() {
        let json = r#"{"prompt":"p","mood":{"label":"calm","score":7},"context":[{"content":"likes blue"}]}"#;
        let request: GenerateComponentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.mood.unwrap().label, "calm");
        assert_eq!(request.context.unwrap()[0].content, "likes blue");
    }
}
