// ABOUTME: Sandbox boundary for untrusted component modules
// ABOUTME: Render protocol, boundary trait, and the Node.js guest host

pub mod boundary;
pub mod error;
pub mod host;
pub mod protocol;

// Re-export commonly used types
pub use boundary::{RenderBoundary, RenderOutput};
pub use error::{Result, SandboxError};
pub use host::{GuestConnection, GuestLauncher, SandboxHost};
pub use protocol::{GuestMessage, HostMessage, RenderPayload};
