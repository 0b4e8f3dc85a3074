//! Time source for backoff and courtesy delays.

use std::time::Duration;

use async_trait::async_trait;

/// Something that can wait.
///
/// Production code uses [`TokioClock`]; tests inject
/// [`ManualClock`](crate::testing::ManualClock) so retry and throttle paths
/// run instantly while still recording every requested delay.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real time, via `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
