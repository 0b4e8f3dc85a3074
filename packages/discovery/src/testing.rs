//! Testing utilities including mock implementations.
//!
//! These are useful for exercising the discovery pipeline without making
//! real search or LM calls, and without waiting on real courtesy delays.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::client::Clock;
use crate::error::{DiscoveryError, Result};
use crate::traits::ai::AI;

/// One scripted answer from [`MockAI`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Completion text.
    Text(String),
    /// HTTP 429.
    RateLimited,
    /// HTTP 500.
    ServerError,
    /// Connection-level failure.
    NetworkError,
    /// Completion text delivered after a real (tokio) delay.
    Delayed(Duration, String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// A mock AI implementation for testing.
///
/// Prompts are matched against rules by substring, in the order the rules
/// were added. A rule with several replies hands them out one per call and
/// then keeps repeating its last one. Unmatched prompts get the default
/// reply (empty text unless set).
#[derive(Default)]
pub struct MockAI {
    /// Replies keyed by prompt substring
    rules: Arc<RwLock<Vec<(String, VecDeque<MockReply>)>>>,

    /// Reply for prompts no rule matches
    default_reply: Arc<RwLock<Option<MockReply>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockAI {
    /// Create a new mock AI with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer prompts containing `needle` with `text`.
    pub fn with_response(self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_replies(needle, vec![MockReply::text(text)])
    }

    /// Fail prompts containing `needle` with a network error.
    pub fn with_failure(self, needle: impl Into<String>) -> Self {
        self.with_replies(needle, vec![MockReply::NetworkError])
    }

    /// Answer prompts containing `needle` with `text` after `delay`.
    pub fn with_delay(
        self,
        needle: impl Into<String>,
        delay: Duration,
        text: impl Into<String>,
    ) -> Self {
        self.with_replies(needle, vec![MockReply::Delayed(delay, text.into())])
    }

    /// Script a sequence of replies for prompts containing `needle`.
    pub fn with_replies(self, needle: impl Into<String>, replies: Vec<MockReply>) -> Self {
        self.rules
            .write()
            .unwrap()
            .push((needle.into(), replies.into()));
        self
    }

    /// Set the reply for unmatched prompts.
    pub fn with_default(self, text: impl Into<String>) -> Self {
        *self.default_reply.write().unwrap() = Some(MockReply::text(text));
        self
    }

    /// Prompts received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Number of prompts received that contain `needle`.
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|prompt| prompt.contains(needle))
            .count()
    }

    fn next_reply(&self, prompt: &str) -> MockReply {
        let mut rules = self.rules.write().unwrap();
        let scripted = rules
            .iter_mut()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .and_then(|(_, replies)| {
                if replies.len() > 1 {
                    replies.pop_front()
                } else {
                    replies.front().cloned()
                }
            });

        scripted.unwrap_or_else(|| {
            self.default_reply
                .read()
                .unwrap()
                .clone()
                .unwrap_or_else(|| MockReply::text(""))
        })
    }
}

#[async_trait]
impl AI for MockAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.write().unwrap().push(prompt.to_string());

        match self.next_reply(prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::RateLimited => Err(DiscoveryError::RateLimited { service: "mock-ai" }),
            MockReply::ServerError => Err(DiscoveryError::Http {
                service: "mock-ai",
                status: 500,
                message: "scripted failure".into(),
            }),
            MockReply::NetworkError => Err(DiscoveryError::network(
                "mock-ai",
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "scripted failure"),
            )),
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }
}

/// A clock that returns immediately and records every requested delay.
#[derive(Default)]
pub struct ManualClock {
    sleeps: RwLock<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested delays, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.read().unwrap().clone()
    }

    /// Sum of every requested delay.
    pub fn total(&self) -> Duration {
        self.sleeps.read().unwrap().iter().sum()
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.write().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_are_consumed_then_repeated() {
        let ai = MockAI::new().with_replies(
            "score",
            vec![MockReply::RateLimited, MockReply::text("70"), MockReply::text("80")],
        );

        assert!(ai.complete("score this").await.unwrap_err().is_rate_limited());
        assert_eq!(ai.complete("score this").await.unwrap(), "70");
        assert_eq!(ai.complete("score this").await.unwrap(), "80");
        assert_eq!(ai.complete("score this").await.unwrap(), "80");
        assert_eq!(ai.calls_containing("score"), 4);
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let ai = MockAI::new()
            .with_response("Candidate: Bolt", "90")
            .with_response("Candidate", "10")
            .with_default("fallback");

        assert_eq!(ai.complete("Candidate: Bolt").await.unwrap(), "90");
        assert_eq!(ai.complete("Candidate: Zen").await.unwrap(), "10");
        assert_eq!(ai.complete("other").await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn test_manual_clock_records_sleeps() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_millis(500)).await;
        clock.sleep(Duration::from_millis(1500)).await;
        assert_eq!(clock.total(), Duration::from_secs(2));
        assert_eq!(clock.sleeps().len(), 2);
    }
}
