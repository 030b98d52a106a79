//! Bounded retry with exponential backoff for collaborator calls.
//!
//! Every attempt runs under its own timeout; an elapsed timeout counts as a
//! transient failure. Non-retryable errors stop immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::ports::{GatewayError, GatewayRole};

/// Retry settings shared by all three collaborator roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

/// The last error after every permitted attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: GatewayError,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (0-based): base * 2^retry, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(
        &self,
        role: GatewayRole,
        per_attempt: Duration,
        mut op: F,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let error = match timeout(per_attempt, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) => error,
                Err(_) => GatewayError::Timeout {
                    timeout_ms: per_attempt.as_millis() as u64,
                },
            };

            if !error.is_retryable() || attempts > self.max_retries {
                return Err(RetryExhausted {
                    attempts,
                    last_error: error,
                });
            }

            let mut delay = self.backoff(attempts - 1);
            if let GatewayError::RateLimited { retry_after_secs } = error {
                delay = delay.max(Duration::from_secs(u64::from(retry_after_secs)).min(self.max_delay));
            }
            tracing::debug!(
                role = %role,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying collaborator call"
            );
            sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(250), Duration::from_secs(4))
    }
}
