// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Adapt

// Text-Generation Collaborator
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ADAPT_API_BASE_URL: &str = "ADAPT_API_BASE_URL";
pub const ADAPT_GENERATION_MODEL: &str = "ADAPT_GENERATION_MODEL";
pub const ADAPT_VALIDATION_MODEL: &str = "ADAPT_VALIDATION_MODEL";
pub const ADAPT_TEMPERATURE: &str = "ADAPT_TEMPERATURE";

// Rate Limiting
pub const ADAPT_RATE_LIMIT_MAX_RETRIES: &str = "ADAPT_RATE_LIMIT_MAX_RETRIES";
pub const ADAPT_BACKOFF_BASE_MS: &str = "ADAPT_BACKOFF_BASE_MS";
pub const ADAPT_BACKOFF_MAX_MS: &str = "ADAPT_BACKOFF_MAX_MS";

// HTTP Client Timeouts
pub const ADAPT_HTTP_REQUEST_TIMEOUT_SECS: &str = "ADAPT_HTTP_REQUEST_TIMEOUT_SECS";
pub const ADAPT_HTTP_CONNECT_TIMEOUT_SECS: &str = "ADAPT_HTTP_CONNECT_TIMEOUT_SECS";

// Repair Loop
pub const ADAPT_MAX_ATTEMPTS: &str = "ADAPT_MAX_ATTEMPTS";

// Sandbox Guest
pub const ADAPT_RENDER_TIMEOUT_MS: &str = "ADAPT_RENDER_TIMEOUT_MS";
pub const ADAPT_NODE_BINARY: &str = "ADAPT_NODE_BINARY";
pub const ADAPT_GUEST_SCRIPT: &str = "ADAPT_GUEST_SCRIPT";

// Audit Log
pub const ADAPT_AUDIT_DB: &str = "ADAPT_AUDIT_DB";

// Prompts
pub const ADAPT_PROMPTS_DIR: &str = "ADAPT_PROMPTS_DIR";

// HTTP API
pub const ADAPT_API_PORT: &str = "ADAPT_API_PORT";
