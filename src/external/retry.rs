//! Bounded retry with exponential backoff and jitter.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::config::RetryConfig;
use crate::error::ExternalError;

/// Computes the backoff before attempt `attempt` (1-indexed: the delay before
/// the *second* attempt, etc.), applying `base * factor^(attempt-1)` with
/// `jitter_fraction` of symmetric jitter.
pub fn backoff_for_attempt(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let multiplier = config.backoff_factor.saturating_pow(exponent);
    let base = config.base_backoff.as_millis() as u64 * multiplier as u64;

    let mut rng = rand::rng();
    let jitter_range = (base as f64 * config.jitter_fraction) as i64;
    let jitter: i64 = if jitter_range > 0 {
        rng.random_range(-jitter_range..=jitter_range)
    } else {
        0
    };
    let millis = (base as i64 + jitter).max(0) as u64;
    Duration::from_millis(millis)
}

/// Runs `operation` up to `config.max_attempts` times, retrying only on
/// [`ExternalError::is_retryable`] failures, with exponential backoff between attempts.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    provider: &str,
    mut operation: F,
) -> Result<T, ExternalError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ExternalError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < config.max_attempts => {
                let delay = backoff_for_attempt(config, attempt);
                debug!(
                    provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after recoverable external failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
