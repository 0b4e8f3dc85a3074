//! Rate-limited query client.
//!
//! Wraps a [`WebSearcher`] and an [`AI`] with:
//! - a [`RetryPolicy`] (backoff on 429 and transient failures)
//! - an optional governor quota shared by every outbound call
//! - a cancellation token bounding the whole run
//!
//! Search never fails from the caller's point of view: a query that is still
//! failing after the last attempt yields no results, so one bad query cannot
//! abort a strategy.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::clock::{Clock, TokioClock};
use super::retry::RetryPolicy;
use crate::error::Result;
use crate::traits::{ai::AI, searcher::WebSearcher};
use crate::types::discovery::{SearchQuery, SearchResult};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Shared handle to the search and LM providers.
///
/// Cheap to clone; providers, policy and limiter are shared read-only.
#[derive(Clone)]
pub struct QueryClient {
    searcher: Arc<dyn WebSearcher>,
    ai: Arc<dyn AI>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    limiter: Option<Arc<DefaultRateLimiter>>,
    cancel: CancellationToken,
}

impl QueryClient {
    /// Create a client with the default retry policy and real time.
    pub fn new(searcher: Arc<dyn WebSearcher>, ai: Arc<dyn AI>) -> Self {
        Self {
            searcher,
            ai,
            policy: RetryPolicy::default(),
            clock: Arc::new(TokioClock),
            limiter: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the clock used for backoff and courtesy delays.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Cap outbound calls (search and LM combined) per second.
    pub fn with_requests_per_second(mut self, requests_per_second: NonZeroU32) -> Self {
        let quota = Quota::per_second(requests_per_second);
        self.limiter = Some(Arc::new(RateLimiter::direct(quota)));
        self
    }

    /// A copy of this client bound to a run's cancellation token.
    pub fn for_run(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    /// Whether the run this client is bound to has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Issue one search query. Failures degrade to an empty result set.
    pub async fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        let searcher = &self.searcher;
        let limiter = &self.limiter;

        let result = self
            .policy
            .run(self.clock.as_ref(), &self.cancel, "search", move || async move {
                wait_for_permit(limiter).await;
                searcher.search(query).await
            })
            .await;

        match result {
            Ok(results) => {
                debug!(query = query.text(), results = results.len(), "Search complete");
                results
            }
            Err(e) => {
                warn!(query = query.text(), error = %e, "Search failed, treating as no results");
                Vec::new()
            }
        }
    }

    /// Issue one LM completion. Errors are returned so callers can choose
    /// their own failure policy.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let ai = &self.ai;
        let limiter = &self.limiter;

        self.policy
            .run(self.clock.as_ref(), &self.cancel, "complete", move || async move {
                wait_for_permit(limiter).await;
                ai.complete(prompt).await
            })
            .await
    }

    /// Courtesy pause between calls, cut short by cancellation.
    pub async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = self.clock.sleep(duration) => {}
        }
    }
}

async fn wait_for_permit(limiter: &Option<Arc<DefaultRateLimiter>>) {
    if let Some(limiter) = limiter {
        limiter.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryError;
    use crate::testing::{ManualClock, MockAI, MockReply};
    use crate::traits::searcher::MockWebSearcher;

    fn client(searcher: MockWebSearcher, ai: MockAI, clock: Arc<ManualClock>) -> QueryClient {
        QueryClient::new(Arc::new(searcher), Arc::new(ai)).with_clock(clock)
    }

    #[tokio::test]
    async fn test_search_failure_yields_empty() {
        let clock = Arc::new(ManualClock::new());
        let searcher = MockWebSearcher::new().with_failure("acme competitors");
        let client = client(searcher, MockAI::new(), clock.clone());

        let results = client.search(&SearchQuery::new("acme competitors")).await;

        assert!(results.is_empty());
        // 5xx is transient: three attempts, two backoffs
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
    }

    #[tokio::test]
    async fn test_complete_recovers_from_rate_limit() {
        let clock = Arc::new(ManualClock::new());
        let ai = MockAI::new().with_replies(
            "hello",
            vec![MockReply::RateLimited, MockReply::text("world")],
        );
        let client = client(MockWebSearcher::new(), ai, clock.clone());

        let text = client.complete("hello").await.unwrap();

        assert_eq!(text, "world");
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(2000)]);
    }

    #[tokio::test]
    async fn test_complete_after_cancel_is_refused() {
        let clock = Arc::new(ManualClock::new());
        let ai = Arc::new(MockAI::new().with_response("hello", "world"));
        let cancel = CancellationToken::new();
        let client = QueryClient::new(Arc::new(MockWebSearcher::new()), ai.clone())
            .with_clock(clock)
            .for_run(cancel.clone());

        cancel.cancel();
        let result = client.complete("hello").await;

        assert!(matches!(result, Err(DiscoveryError::Cancelled)));
        assert!(ai.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pause_uses_clock() {
        let clock = Arc::new(ManualClock::new());
        let client = client(MockWebSearcher::new(), MockAI::new(), clock.clone());

        client.pause(Duration::from_millis(1000)).await;
        client.pause(Duration::ZERO).await;

        assert_eq!(clock.sleeps(), vec![Duration::from_millis(1000)]);
    }

    #[tokio::test]
    async fn test_requests_per_second_quota() {
        let searcher = MockWebSearcher::new();
        let client = QueryClient::new(Arc::new(searcher), Arc::new(MockAI::new()))
            .with_requests_per_second(NonZeroU32::new(50).unwrap());

        for _ in 0..3 {
            tokio_test::assert_ok!(client.complete("anything").await);
        }
    }
}
