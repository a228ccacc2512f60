// ABOUTME: Configuration package for Adapt
// ABOUTME: Environment variable names and the validated runtime configuration

pub mod config;
pub mod constants;

pub use config::{AdaptConfig, ConfigError, DEFAULT_API_BASE_URL, DEFAULT_API_PORT};
