// ABOUTME: Text-generation collaborator integration
// ABOUTME: OpenAI-compatible chat completions client with rate-limit backoff

pub mod messages;
pub mod retry;
pub mod service;

pub use messages::{ChatMessage, Role};
pub use retry::RetryPolicy;
pub use service::{AIService, AIServiceError, AIServiceResult, TextGeneration};
