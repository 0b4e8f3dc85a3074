//! API keys for the search and LM providers.
//!
//! Keys live in a `secrecy` box and only leave it through [`ApiKey::expose`]
//! at the point an HTTP header is built. Formatting a key, or anything that
//! holds one, prints a placeholder.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::{DiscoveryError, Result};

const REDACTED: &str = "[REDACTED]";

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// A provider API key.
pub struct ApiKey(SecretBox<str>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        let key: Box<str> = key.into().into_boxed_str();
        Self(SecretBox::new(key))
    }

    /// Parse a key read from configuration variable `var`.
    ///
    /// Surrounding whitespace is dropped; a blank key is a config error.
    pub fn required(var: &str, raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        match raw.trim() {
            "" => Err(DiscoveryError::Config(format!("{} must not be empty", var))),
            key => Ok(Self::new(key)),
        }
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&REDACTED).finish()
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// Key, model and endpoint for the completion provider.
#[derive(Debug, Clone)]
pub struct LlmCredentials {
    pub api_key: ApiKey,
    pub model: String,
    /// Base URL without a trailing slash; `/chat/completions` is appended.
    pub base_url: String,
}

impl LlmCredentials {
    pub fn new(api_key: impl Into<ApiKey>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
        }
    }

    /// Point at another OpenAI-compatible gateway (OpenRouter, Azure proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}
