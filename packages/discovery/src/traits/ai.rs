//! AI trait for LLM completions.
//!
//! The engine only ever needs raw text back from a model: every response is
//! routed through the resilient extractor, so implementations must not try to
//! parse or validate JSON themselves.

use async_trait::async_trait;

use crate::error::Result;

/// Text completion capability.
///
/// Implementations wrap a specific provider (OpenAI, OpenRouter, ...) and
/// map transport failures onto [`DiscoveryError`](crate::DiscoveryError),
/// in particular HTTP 429 onto `RateLimited` so the query client can back off.
#[async_trait]
pub trait AI: Send + Sync {
    /// Complete a prompt, returning the model's raw text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
