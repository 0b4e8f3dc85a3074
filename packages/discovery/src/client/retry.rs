//! Retry policy for upstream calls.
//!
//! A policy is three knobs: how many attempts, how long to wait before the
//! next one, and which errors are worth another attempt. The default is
//! three attempts with `2000ms * 2^(attempt-1)` between them, retrying rate
//! limits and transient failures.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::clock::Clock;
use crate::error::{DiscoveryError, Result};

type BackoffFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;
type RetryableFn = Arc<dyn Fn(&DiscoveryError) -> bool + Send + Sync>;

/// Default base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Default attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Bounded retry with pluggable backoff and retry predicate.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffFn,
    retryable: RetryableFn,
}

impl RetryPolicy {
    /// Exponential backoff: `base * 2^(attempt-1)` after failed attempt `attempt`.
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(move |attempt: u32| {
                let exponent = attempt.saturating_sub(1).min(16);
                base.saturating_mul(1u32 << exponent)
            }),
            retryable: Arc::new(DiscoveryError::is_retryable),
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::exponential(1, Duration::ZERO)
    }

    /// Replace the backoff function. It receives the 1-based number of the
    /// attempt that just failed.
    pub fn with_backoff(mut self, backoff: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Replace the retryable-error predicate.
    pub fn with_retryable(
        mut self,
        retryable: impl Fn(&DiscoveryError) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.retryable = Arc::new(retryable);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    /// Whether failed attempt `attempt` should be followed by another.
    pub fn should_retry(&self, error: &DiscoveryError, attempt: u32) -> bool {
        attempt < self.max_attempts && (self.retryable)(error)
    }

    /// Run `op` under this policy.
    ///
    /// Cancellation aborts the in-flight attempt and any pending backoff and
    /// returns [`DiscoveryError::Cancelled`]; no attempt starts after it.
    pub async fn run<T, F, Fut>(
        &self,
        clock: &dyn Clock,
        cancel: &CancellationToken,
        operation: &str,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(DiscoveryError::Cancelled),
                result = op() => result,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if self.should_retry(&e, attempt) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        rate_limited = e.is_rate_limited(),
                        error = %e,
                        "Upstream call failed, backing off"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
                        _ = clock.sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
