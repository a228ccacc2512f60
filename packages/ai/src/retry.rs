// ABOUTME: Rate-limit retry policy for collaborator calls
// ABOUTME: Retry-After parsing and capped exponential backoff

use std::time::Duration;

use adapt_config::AdaptConfig;

/// How often and how long to wait when the collaborator answers 429
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total requests allowed for one call, including the first
    pub max_requests: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_requests: 5,
            base_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AdaptConfig) -> Self {
        Self {
            max_requests: config.rate_limit_max_retries,
            base_delay: config.backoff_base,
            max_delay: config.backoff_max,
        }
    }

    /// Delay before the next request after the `attempt`-th rate-limited response (1-based).
    ///
    /// A server hint wins over the exponential schedule, but both are capped.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = retry_after.unwrap_or_else(|| {
            let exponent = attempt.saturating_sub(1).min(16);
            self.base_delay.saturating_mul(1u32 << exponent)
        });
        delay.min(self.max_delay)
    }
}

/// Parse a `Retry-After` header value given in (possibly fractional) seconds.
///
/// HTTP-date values are not supported and yield `None`, which falls back to backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<f64>().ok()?;
    // Rejects negatives, NaN, infinities, and values past Duration::MAX
    Duration::try_from_secs_f64(secs).ok()
}
