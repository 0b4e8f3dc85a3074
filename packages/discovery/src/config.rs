//! Process configuration loaded from environment variables.

use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::{DiscoveryError, Result};
use crate::security::{ApiKey, LlmCredentials};
use crate::types::config::DiscoveryConfig;

/// Which search API backs the strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    Serper,
    Tavily,
}

impl FromStr for SearchProvider {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "serper" => Ok(Self::Serper),
            "tavily" => Ok(Self::Tavily),
            other => Err(DiscoveryError::Config(format!(
                "SEARCH_PROVIDER must be 'serper' or 'tavily', got '{}'",
                other
            ))),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub search_provider: SearchProvider,
    pub search_api_key: ApiKey,
    pub llm: LlmCredentials,
    /// Client-side quota shared by search and LM calls.
    pub requests_per_second: Option<NonZeroU32>,
    pub discovery: DiscoveryConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing credentials fail here, once, before any run starts.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let search_api_key = lookup("SEARCH_API_KEY")
            .ok_or_else(|| DiscoveryError::Config("SEARCH_API_KEY must be set".into()))?;
        let search_api_key = ApiKey::required("SEARCH_API_KEY", search_api_key)?;

        let llm_api_key = lookup("LLM_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .ok_or_else(|| {
                DiscoveryError::Config("LLM_API_KEY or OPENAI_API_KEY must be set".into())
            })?;
        let llm_api_key = ApiKey::required("LLM_API_KEY", llm_api_key)?;

        let search_provider = match lookup("SEARCH_PROVIDER") {
            Some(value) => value.parse()?,
            None => SearchProvider::Serper,
        };

        let mut llm = LlmCredentials::new(
            llm_api_key,
            lookup("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
        );
        if let Some(base_url) = lookup("LLM_BASE_URL") {
            llm = llm.with_base_url(base_url);
        }

        let mut discovery = DiscoveryConfig::default();
        if let Some(value) = lookup("DISCOVERY_VALIDATE") {
            discovery.validate_candidates = parse_bool("DISCOVERY_VALIDATE", &value)?;
        }
        if let Some(value) = lookup("DISCOVERY_TIMEOUT_SECS") {
            let secs: u64 = parse_number("DISCOVERY_TIMEOUT_SECS", &value)?;
            discovery.run_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(value) = lookup("DISCOVERY_MAX_CONCURRENCY") {
            let max: usize = parse_number("DISCOVERY_MAX_CONCURRENCY", &value)?;
            discovery = discovery.with_max_concurrency(max);
        }

        let requests_per_second = match lookup("DISCOVERY_REQUESTS_PER_SECOND") {
            Some(value) => NonZeroU32::new(parse_number("DISCOVERY_REQUESTS_PER_SECOND", &value)?),
            None => None,
        };

        Ok(Self {
            search_provider,
            search_api_key,
            llm,
            requests_per_second,
            discovery,
        })
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DiscoveryError::Config(format!("{} must be a valid number", key)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DiscoveryError::Config(format!("{} must be true or false", key))),
    }
}
