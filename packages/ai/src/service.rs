// ABOUTME: AI service for chat completions against an OpenAI-compatible endpoint
// ABOUTME: Handles bearer auth, 429 backoff, and envelope parsing

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use adapt_config::{AdaptConfig, DEFAULT_API_BASE_URL};

use crate::messages::ChatMessage;
use crate::retry::{parse_retry_after, RetryPolicy};

#[derive(Debug, Error)]
pub enum AIServiceError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Malformed completion response")]
    MalformedResponse { body: String },

    #[error("No API key configured")]
    NoApiKey,
}

impl AIServiceError {
    /// Raw response text when the collaborator answered but not in the expected envelope
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            AIServiceError::MalformedResponse { body } => Some(body),
            _ => None,
        }
    }
}

pub type AIServiceResult<T> = Result<T, AIServiceError>;

/// The text-generation collaborator seam used by the pipeline
#[async_trait]
pub trait TextGeneration: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> AIServiceResult<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client
pub struct AIService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    retry: RetryPolicy,
}

impl AIService {
    /// Create HTTP client with timeout configuration
    fn create_client(request_timeout: Duration, connect_timeout: Duration) -> AIServiceResult<Client> {
        Ok(Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?)
    }

    pub fn from_config(config: &AdaptConfig) -> AIServiceResult<Self> {
        if config.api_key.is_none() {
            info!("GROQ_API_KEY not set - collaborator calls will fail until it is configured");
        }
        if config.api_base_url != DEFAULT_API_BASE_URL {
            info!("Using custom completions endpoint: {}", config.api_base_url);
        }

        Ok(Self {
            client: Self::create_client(config.http_request_timeout, config.http_connect_timeout)?,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Creates a service against a specific endpoint with default timeouts
    pub fn with_endpoint(
        base_url: impl Into<String>,
        api_key: Option<String>,
        retry: RetryPolicy,
    ) -> AIServiceResult<Self> {
        Ok(Self {
            client: Self::create_client(Duration::from_secs(120), Duration::from_secs(10))?,
            api_key,
            base_url: base_url.into(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send_once(
        &self,
        api_key: &str,
        request: &CompletionRequest<'_>,
    ) -> AIServiceResult<reqwest::Response> {
        self.client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Completion request timed out");
                    AIServiceError::Unavailable("Request timed out".to_string())
                } else if e.is_connect() {
                    error!("Failed to connect to completions endpoint: {}", e);
                    AIServiceError::Unavailable(format!("Connection failed: {}", e))
                } else {
                    error!("Completion request failed: {}", e);
                    AIServiceError::RequestFailed(e)
                }
            })
    }
}

#[async_trait]
impl TextGeneration for AIService {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> AIServiceResult<String> {
        let api_key = self.api_key.as_deref().ok_or(AIServiceError::NoApiKey)?;

        let request = CompletionRequest {
            model,
            messages,
            temperature,
            stream: false,
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(model, attempt, "Sending completion request");

            let response = self.send_once(api_key, &request).await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.retry.max_requests {
                    warn!(attempts = attempt, "Rate limit retries exhausted");
                    return Err(AIServiceError::RateLimited { attempts: attempt });
                }

                let hint = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after);
                let delay = self.retry.delay_for(attempt, hint);
                warn!(
                    "Rate limited. Retrying in {}ms (attempt {}/{})",
                    delay.as_millis(),
                    attempt,
                    self.retry.max_requests
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if !status.is_success() {
                error!("Completions API error: {} - {}", status, body);
                return Err(AIServiceError::ApiError {
                    status: status.as_u16(),
                    body,
                });
            }

            return parse_completion(body);
        }
    }
}

fn parse_completion(body: String) -> AIServiceResult<String> {
    let content = serde_json::from_str::<CompletionResponse>(&body)
        .ok()
        .and_then(|parsed| parsed.choices.into_iter().next())
        .and_then(|choice| choice.message.content);

    match content {
        Some(content) => Ok(content),
        None => {
            warn!(
                "Completion envelope not recognised (first 200 chars): {}",
                body.chars().take(200).collect::<String>()
            );
            Err(AIServiceError::MalformedResponse { body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry(max_requests: u32) -> RetryPolicy {
        RetryPolicy {
            max_requests,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn envelope(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    async fn service(server: &MockServer, max_requests: u32) -> AIService {
        AIService::with_endpoint(
            format!("{}/v1/chat/completions", server.uri()),
            Some("gsk_test".to_string()),
            fast_retry(max_requests),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "stream": false,
                "messages": [{"role": "system", "content": "rules"}, {"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope("```js\nx\n```")))
            .expect(1)
            .mount(&server)
            .await;

        let ai = service(&server, 3).await;
        let text = ai
            .complete(
                "llama-3.3-70b-versatile",
                &[ChatMessage::system("rules"), ChatMessage::user("hi")],
                0.2,
            )
            .await
            .unwrap();
        assert_eq!(text, "```js\nx\n```");
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let ai = service(&server, 5).await;
        let text = ai.complete("m", &[ChatMessage::user("hi")], 0.2).await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let ai = service(&server, 3).await;
        let err = ai.complete("m", &[ChatMessage::user("hi")], 0.2).await.unwrap_err();
        assert!(matches!(err, AIServiceError::RateLimited { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let ai = service(&server, 5).await;
        let err = ai.complete("m", &[ChatMessage::user("hi")], 0.2).await.unwrap_err();
        match err {
            AIServiceError::ApiError { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_envelope_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .mount(&server)
            .await;

        let ai = service(&server, 1).await;
        let err = ai.complete("m", &[ChatMessage::user("hi")], 0.2).await.unwrap_err();
        assert_eq!(err.raw_body(), Some("not json at all"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope("ok")))
            .expect(0)
            .mount(&server)
            .await;

        let ai = AIService::with_endpoint(server.uri(), None, fast_retry(1)).unwrap();
        let err = ai.complete("m", &[ChatMessage::user("hi")], 0.2).await.unwrap_err();
        assert!(matches!(err, AIServiceError::NoApiKey));
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let err = parse_completion(r#"{"choices":[]}"#.to_string()).unwrap_err();
        assert!(matches!(err, AIServiceError::MalformedResponse { .. }));
    }
}
