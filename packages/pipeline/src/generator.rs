// ABOUTME: Component generator building requests to the text-generation collaborator
// ABOUTME: Adds optional mood and context hints and extracts the code block from the reply

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use adapt_ai::{AIServiceError, ChatMessage, TextGeneration};
use adapt_core::{extract_code, has_export_slot, GenerateComponentRequest, GenerateComponentResponse};

use crate::error::{PipelineError, Result};

const SERVICE: &str = "generator";

pub const MISSING_EXPORT_NOTE: &str = "No default export detected; validator will likely flag this.";

#[async_trait]
pub trait ComponentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateComponentRequest) -> Result<GenerateComponentResponse>;
}

/// User message: the request, then mood and context hints when present
pub fn generation_message(request: &GenerateComponentRequest) -> String {
    let mut parts = vec![format!("User request: {}", request.prompt)];

    if let Some(mood) = &request.mood {
        parts.push(format!("Mood: {} ({}/10)", mood.label, mood.score));
    }
    if let Some(context) = request.context.as_ref().filter(|c| !c.is_empty()) {
        let lines: Vec<String> = context.iter().map(|c| format!("- {}", c.content)).collect();
        parts.push(format!("Context:\n{}", lines.join("\n")));
    }

    parts.join("\n")
}

/// Completion text, or the raw body when the envelope could not be parsed
pub(crate) fn completion_text(
    service: &'static str,
    result: std::result::Result<String, AIServiceError>,
) -> Result<String> {
    match result {
        Ok(text) => Ok(text),
        Err(AIServiceError::MalformedResponse { body }) => {
            warn!("{} reply envelope malformed, extracting code from raw text", service);
            Ok(body)
        }
        Err(e) => Err(PipelineError::from_ai(service, e)),
    }
}

pub struct AiGenerator {
    ai: Arc<dyn TextGeneration>,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl AiGenerator {
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
impl ComponentGenerator for AiGenerator {
    async fn generate(&self, request: &GenerateComponentRequest) -> Result<GenerateComponentResponse> {
        if request.prompt.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("Missing prompt".to_string()));
        }

        let messages = [
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(generation_message(request)),
        ];
        let reply = completion_text(
            SERVICE,
            self.ai.complete(&self.model, &messages, self.temperature).await,
        )?;

        let code = extract_code(&reply);
        if code.is_empty() {
            return Err(PipelineError::MalformedResponse { service: SERVICE });
        }

        let note = if has_export_slot(&code) {
            None
        } else {
            Some(MISSING_EXPORT_NOTE.to_string())
        };
        info!(
            bytes = code.len(),
            has_export = note.is_none(),
            "Generated component"
        );

        Ok(GenerateComponentResponse {
            code,
            description: "Generated component".to_string(),
            intent: "unspecified".to_string(),
            note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_ai::AIServiceResult;
    use adapt_core::{ContextItem, Mood};
    use mockall::mock;
    use pretty_assertions::assert_eq;

    mock! {
        Llm {}

        #[async_trait::async_trait]
        impl TextGeneration for Llm {
            async fn complete(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> AIServiceResult<String>;
        }
    }

    fn generator(llm: MockLlm) -> AiGenerator {
        AiGenerator::new(Arc::new(llm), "llama-3.3-70b-versatile", 0.2, "contract".to_string())
    }

    #[test]
    fn test_generation_message_with_hints() {
        let request = GenerateComponentRequest {
            prompt: "Create a counter".to_string(),
            mood: Some(Mood {
                label: "calm".to_string(),
                score: 7.0,
            }),
            context: Some(vec![
                ContextItem {
                    content: "likes blue".to_string(),
                },
                ContextItem {
                    content: "short copy".to_string(),
                },
            ]),
        };
        assert_eq!(
            generation_message(&request),
            "User request: Create a counter\nMood: calm (7/10)\nContext:\n- likes blue\n- short copy"
        );
    }

    #[test]
    fn test_generation_message_prompt_only() {
        let request = GenerateComponentRequest {
            context: Some(Vec::new()),
            ..GenerateComponentRequest::new("Create a counter")
        };
        assert_eq!(generation_message(&request), "User request: Create a counter");
    }

    #[tokio::test]
    async fn test_generate_extracts_code() {
        let mut llm = MockLlm::new();
        llm.expect_complete()
            .withf(|model, messages, temperature| {
                model == "llama-3.3-70b-versatile"
                    && messages[0].content == "contract"
                    && messages[1].content == "User request: Create a counter"
                    && *temperature == 0.2
            })
            .times(1)
            .returning(|_, _, _| {
                Ok("Sure!\n```javascript\nconst C = () => null;\nmodule.exports.default = C;\n```".to_string())
            });

        let response = generator(llm)
            .generate(&GenerateComponentRequest::new("Create a counter"))
            .await
            .unwrap();
        assert_eq!(response.code, "const C = () => null;\nmodule.exports.default = C;");
        assert_eq!(response.description, "Generated component");
        assert_eq!(response.intent, "unspecified");
        assert_eq!(response.note, None);
    }

    #[tokio::test]
    async fn test_missing_export_is_noted_not_rejected() {
        let mut llm = MockLlm::new();
        llm.expect_complete()
            .returning(|_, _, _| Ok("const C = () => null;".to_string()));

        let response = generator(llm)
            .generate(&GenerateComponentRequest::new("x"))
            .await
            .unwrap();
        assert_eq!(response.code, "const C = () => null;");
        assert_eq!(response.note.as_deref(), Some(MISSING_EXPORT_NOTE));
    }

    #[tokio::test]
    async fn test_malformed_envelope_falls_back_to_raw_text() {
        let mut llm = MockLlm::new();
        llm.expect_complete().returning(|_, _, _| {
            Err(AIServiceError::MalformedResponse {
                body: "```js\nmodule.exports.default = X;\n```".to_string(),
            })
        });

        let response = generator(llm)
            .generate(&GenerateComponentRequest::new("x"))
            .await
            .unwrap();
        assert_eq!(response.code, "module.exports.default = X;");
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_calling_out() {
        let mut llm = MockLlm::new();
        llm.expect_complete().never();

        let err = generator(llm)
            .generate(&GenerateComponentRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_as_rate_limited() {
        let mut llm = MockLlm::new();
        llm.expect_complete()
            .returning(|_, _, _| Err(AIServiceError::RateLimited { attempts: 5 }));

        let err = generator(llm)
            .generate(&GenerateComponentRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RateLimited { service: "generator", attempts: 5 }
        ));
    }
}
