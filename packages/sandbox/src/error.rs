// ABOUTME: Error types for the sandbox boundary
// ABOUTME: Infrastructure failures of the guest process, never component faults

use thiserror::Error;

/// Failures of the boundary itself.
///
/// Faults raised by the component under test are reported as a
/// `RuntimeReport`, not through this type.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Guest script could not be located
    #[error("Guest script not found: {0}")]
    GuestScriptNotFound(String),

    /// Guest process could not be spawned or did not finish its handshake
    #[error("Guest failed to start: {0}")]
    GuestStartFailed(String),

    /// No guest connection and no way to launch one
    #[error("Guest is not running")]
    GuestNotRunning,

    /// Guest did not answer the readiness ping in time
    #[error("Guest handshake timed out after {millis} ms")]
    HandshakeTimeout { millis: u64 },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results that return SandboxError
pub type Result<T> = std::result::Result<T, SandboxError>;
