// ABOUTME: Runtime configuration loaded from environment variables
// ABOUTME: Validates ranges for retry budgets, timeouts, and model settings

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use adapt_core::constants::{
    DEFAULT_GENERATION_MODEL, DEFAULT_MAX_ATTEMPTS, DEFAULT_TEMPERATURE,
    DEFAULT_VALIDATION_MODEL,
};

use crate::constants::*;

pub const DEFAULT_API_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_API_PORT: u16 = 4010;
pub const DEFAULT_NODE_BINARY: &str = "node";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("{var}={value} is out of range ({min}-{max})")]
    OutOfRange {
        var: &'static str,
        value: String,
        min: String,
        max: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdaptConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub generation_model: String,
    pub validation_model: String,
    pub temperature: f32,
    pub max_attempts: u32,
    pub rate_limit_max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub http_request_timeout: Duration,
    pub http_connect_timeout: Duration,
    pub render_timeout: Duration,
    pub node_binary: String,
    pub guest_script: Option<PathBuf>,
    pub audit_db: Option<PathBuf>,
    pub prompts_dir: Option<PathBuf>,
    pub api_port: u16,
}

impl Default for AdaptConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            validation_model: DEFAULT_VALIDATION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rate_limit_max_retries: 5,
            backoff_base: Duration::from_millis(2000),
            backoff_max: Duration::from_millis(30_000),
            http_request_timeout: Duration::from_secs(120),
            http_connect_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_millis(5000),
            node_binary: DEFAULT_NODE_BINARY.to_string(),
            guest_script: None,
            audit_db: None,
            prompts_dir: None,
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl AdaptConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backoff_base_ms = ranged(&lookup, ADAPT_BACKOFF_BASE_MS, 2000u64, 1, 60_000)?;
        let backoff_max_ms = ranged(&lookup, ADAPT_BACKOFF_MAX_MS, 30_000u64, 1, 600_000)?;
        if backoff_max_ms < backoff_base_ms {
            return Err(ConfigError::OutOfRange {
                var: ADAPT_BACKOFF_MAX_MS,
                value: backoff_max_ms.to_string(),
                min: backoff_base_ms.to_string(),
                max: "600000".to_string(),
            });
        }

        let config = Self {
            api_key: text(GROQ_API_KEY),
            api_base_url: text(ADAPT_API_BASE_URL).unwrap_or(defaults.api_base_url),
            generation_model: text(ADAPT_GENERATION_MODEL).unwrap_or(defaults.generation_model),
            validation_model: text(ADAPT_VALIDATION_MODEL).unwrap_or(defaults.validation_model),
            temperature: ranged(&lookup, ADAPT_TEMPERATURE, DEFAULT_TEMPERATURE, 0.0, 2.0)?,
            max_attempts: ranged(&lookup, ADAPT_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS, 1, 10)?,
            rate_limit_max_retries: ranged(&lookup, ADAPT_RATE_LIMIT_MAX_RETRIES, 5u32, 1, 10)?,
            backoff_base: Duration::from_millis(backoff_base_ms),
            backoff_max: Duration::from_millis(backoff_max_ms),
            http_request_timeout: Duration::from_secs(ranged(
                &lookup,
                ADAPT_HTTP_REQUEST_TIMEOUT_SECS,
                120u64,
                1,
                3600,
            )?),
            http_connect_timeout: Duration::from_secs(ranged(
                &lookup,
                ADAPT_HTTP_CONNECT_TIMEOUT_SECS,
                10u64,
                1,
                300,
            )?),
            render_timeout: Duration::from_millis(ranged(
                &lookup,
                ADAPT_RENDER_TIMEOUT_MS,
                5000u64,
                100,
                300_000,
            )?),
            node_binary: text(ADAPT_NODE_BINARY).unwrap_or(defaults.node_binary),
            guest_script: text(ADAPT_GUEST_SCRIPT).map(PathBuf::from),
            audit_db: text(ADAPT_AUDIT_DB).map(PathBuf::from),
            prompts_dir: text(ADAPT_PROMPTS_DIR).map(PathBuf::from),
            api_port: ranged(&lookup, ADAPT_API_PORT, DEFAULT_API_PORT, 1, u16::MAX)?,
        };

        debug!(
            "Loaded config: base_url={}, generation_model={}, max_attempts={}",
            config.api_base_url, config.generation_model, config.max_attempts
        );

        Ok(config)
    }
}

/// Parse an optional variable, falling back to `default` and rejecting values outside `min..=max`
fn ranged<F, T>(lookup: &F, var: &'static str, default: T, min: T, max: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Display + Copy,
{
    let raw = match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(default),
    };

    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value: raw.clone(),
        })?;

    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            var,
            value: raw,
            min: min.to_string(),
            max: max.to_string(),
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AdaptConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AdaptConfig::default());
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AdaptConfig::from_lookup(lookup_from(&[
            (GROQ_API_KEY, "gsk_test"),
            (ADAPT_MAX_ATTEMPTS, "3"),
            (ADAPT_RENDER_TIMEOUT_MS, "750"),
            (ADAPT_AUDIT_DB, "/tmp/audit.db"),
            (ADAPT_TEMPERATURE, "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.render_timeout, Duration::from_millis(750));
        assert_eq!(config.audit_db, Some(PathBuf::from("/tmp/audit.db")));
        assert_eq!(config.temperature, 0.5);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config =
            AdaptConfig::from_lookup(lookup_from(&[(GROQ_API_KEY, "  "), (ADAPT_MAX_ATTEMPTS, "")]))
                .unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = AdaptConfig::from_lookup(lookup_from(&[(ADAPT_MAX_ATTEMPTS, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { var, .. } if var == ADAPT_MAX_ATTEMPTS));
    }

    #[test]
    fn test_unparsable_rejected() {
        let err =
            AdaptConfig::from_lookup(lookup_from(&[(ADAPT_API_PORT, "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: ADAPT_API_PORT,
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_backoff_cap_below_base_rejected() {
        let err = AdaptConfig::from_lookup(lookup_from(&[
            (ADAPT_BACKOFF_BASE_MS, "5000"),
            (ADAPT_BACKOFF_MAX_MS, "1000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { var, .. } if var == ADAPT_BACKOFF_MAX_MS));
    }
}
