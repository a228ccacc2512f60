// ABOUTME: Component repairer sending prior code plus issues or a runtime error
// ABOUTME: Falls back to the input code when the reply yields nothing usable

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use adapt_ai::{ChatMessage, TextGeneration};
use adapt_core::{extract_code, RepairComponentRequest};

use crate::error::{PipelineError, Result};
use crate::generator::completion_text;

const SERVICE: &str = "repairer";

#[async_trait]
pub trait ComponentRepairer: Send + Sync {
    /// Return the repaired module code
    async fn repair(&self, request: &RepairComponentRequest) -> Result<String>;
}

/// User message: original code, then validator issues and runtime error when present
pub fn repair_message(request: &RepairComponentRequest) -> String {
    let mut parts = vec![format!("Original code:\n\n{}", request.code)];

    if !request.issues.is_empty() {
        let lines: Vec<String> = request
            .issues
            .iter()
            .map(|i| format!("- [{}] {}", i.kind, i.message))
            .collect();
        parts.push(format!("Validator issues:\n{}", lines.join("\n")));
    }
    if let Some(error) = request.runtime_error.as_deref().filter(|e| !e.is_empty()) {
        parts.push(format!("Runtime error: {}", error));
    }

    parts.join("\n\n")
}

pub struct AiRepairer {
    ai: Arc<dyn TextGeneration>,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl AiRepairer {
    pub fn new(
        ai: Arc<dyn TextGeneration>,
        model: impl Into<String>,
        temperature: f32,
        system_prompt: String,
    ) -> Self {
        Self {
            ai,
            model: model.into(),
            temperature,
            system_prompt,
        }
    }
}

#[async_trait]
impl ComponentRepairer for AiRepairer {
    async fn repair(&self, request: &RepairComponentRequest) -> Result<String> {
        if request.code.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("Missing code".to_string()));
        }

        let messages = [
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(repair_message(request)),
        ];
        let reply = completion_text(
            SERVICE,
            self.ai.complete(&self.model, &messages, self.temperature).await,
        )?;

        let fixed = extract_code(&reply);
        if fixed.is_empty() {
            warn!("Repairer returned no code, keeping the input module");
            return Ok(request.code.clone());
        }

        debug!(bytes = fixed.len(), "Repaired component");
        Ok(fixed)
    }
}
