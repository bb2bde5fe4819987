//! Exponential-backoff retry around a fallible async operation.
//!
//! Attempt `i` (zero-based) that fails is followed by a wait of `base_delay * 2^i`
//! before the next attempt. Uncapped, no jitter, no circuit breaker.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    base_delay: Duration,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryExecutor {
    pub fn new(base_delay: Duration) -> Self {
        Self { base_delay }
    }

    /// Wait after the failed attempt with zero-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Runs `operation` up to `retries` times (at least once), retrying every error.
    /// Returns the first success or the last error.
    pub async fn execute<T, E, F, Fut>(&self, retries: u32, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.execute_when(retries, operation, |_| true).await
    }

    /// Like `execute`, but an error for which `should_retry` is false is returned at once.
    pub async fn execute_when<T, E, F, Fut, P>(
        &self,
        retries: u32,
        mut operation: F,
        should_retry: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let attempts = retries.max(1);
        let mut attempt = 0;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !should_retry(&err) {
                return Err(err);
            }

            if attempt + 1 >= attempts {
                error!("all {attempts} attempts failed: {err}");
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            warn!(
                "attempt {} of {} failed: {}; retrying after {}ms",
                attempt + 1,
                attempts,
                err,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
