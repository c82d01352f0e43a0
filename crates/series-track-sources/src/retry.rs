//! Exponential-backoff retry for outbound provider calls.

use std::future::Future;
use std::time::Duration;

/// Classifies an error as transient (worth another attempt) or permanent.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

/// Backoff schedule for one logical provider call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of tries, not re-tries. 1 disables retrying.
    pub attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 4,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy used in tests so retries do not slow the suite down.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            initial_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempts are exhausted. The last error is returned as-is so the caller can
/// still classify it.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 1;
    let mut delay = policy.initial_delay;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "provider call succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < policy.attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = policy.attempts,
                    delay_ms = delay.as_millis(),
                    "provider call failed, retrying"
                );

                tokio::time::sleep(delay).await;

                attempt += 1;
                let next = Duration::from_secs_f64(delay.as_secs_f64() * policy.backoff_multiplier);
                delay = next.min(policy.max_delay);
            }
            Err(e) => return Err(e),
        }
    }
}
