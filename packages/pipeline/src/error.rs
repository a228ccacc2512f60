// ABOUTME: Error taxonomy for the orchestration loop
// ABOUTME: Maps collaborator and boundary failures onto the loop's retry semantics

use thiserror::Error;

use adapt_ai::AIServiceError;
use adapt_prompts::PromptError;
use adapt_sandbox::SandboxError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Non-success answer or transport failure from a collaborator
    #[error("{service} unavailable: {message}")]
    ServiceUnavailable {
        service: &'static str,
        message: String,
    },

    /// Collaborator answered, but not with anything usable
    #[error("{service} returned a malformed response")]
    MalformedResponse { service: &'static str },

    /// Exception while mounting inside the sandbox boundary
    #[error("Guest runtime fault: {0}")]
    GuestRuntimeFault(String),

    /// Collaborator kept answering 429 after its own retries
    #[error("{service} rate limited after {attempts} attempts")]
    RateLimited {
        service: &'static str,
        attempts: u32,
    },

    #[error("Repair budget exhausted after {attempts} attempts: {last_error}")]
    BudgetExhausted { attempts: u32, last_error: String },

    /// Boundary infrastructure failure (guest cannot be started)
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

impl PipelineError {
    /// Classify a collaborator failure for the named pipeline service
    pub fn from_ai(service: &'static str, error: AIServiceError) -> Self {
        match error {
            AIServiceError::RateLimited { attempts } => {
                PipelineError::RateLimited { service, attempts }
            }
            AIServiceError::MalformedResponse { .. } => PipelineError::MalformedResponse { service },
            other => PipelineError::ServiceUnavailable {
                service,
                message: other.to_string(),
            },
        }
    }

    /// Failures of a collaborator call, as opposed to loop or boundary outcomes
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::ServiceUnavailable { .. }
                | PipelineError::MalformedResponse { .. }
                | PipelineError::RateLimited { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
