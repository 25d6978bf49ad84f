//! Retry logic with exponential backoff
//!
//! This module provides configurable retry logic for transient failures.
//! Delays grow exponentially from `base_delay` up to `max_delay`, with no
//! jitter, so the wait sequence is fully deterministic.
//!
//! # Example
//!
//! ```no_run
//! use tweet_relay::retry::with_retry;
//! use tweet_relay::config::RetryConfig;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let config = RetryConfig::default();
//! let result = with_retry(&config, "fetch greeting", || async {
//!     // Your operation here
//!     Ok::<_, std::io::Error>("hello")
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;

/// Compute the backoff delay for a failed attempt (1-based)
///
/// The first failure waits `base_delay`, and each subsequent failure doubles
/// the wait, capped at `max_delay`. With the default configuration the
/// sequence is 1000 ms, 2000 ms, 4000 ms, and so on up to 30000 ms.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let factor = 2u32.saturating_pow(exponent);
    config.base_delay.saturating_mul(factor).min(config.max_delay)
}

/// Execute an async operation, retrying failures with exponential backoff
///
/// # Arguments
///
/// * `config` - Retry configuration (max attempts, base delay, delay cap)
/// * `operation_name` - Label used in the retry log lines
/// * `operation` - Async closure that returns Result<T, E>
///
/// # Returns
///
/// Returns the successful result, or the last error unchanged once
/// `max_attempts` calls have failed.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                attempt += 1;
                if attempt >= config.max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        error = %e,
                        attempts = attempt,
                        "Operation failed after all retry attempts exhausted"
                    );
                    return Err(e);
                }

                let delay = backoff_delay(config, attempt);
                tracing::warn!(
                    operation = operation_name,
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
