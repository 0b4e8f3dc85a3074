//! Web searcher trait and providers.
//!
//! Strategies issue plain text queries and only ever look at
//! `{ title, link, snippet }`. Providers normalise their own payloads into
//! [`SearchResult`] and report failures as typed errors; deciding what a
//! failure means is the query client's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use crate::error::{DiscoveryError, Result};
use crate::http;
use crate::security::ApiKey;
use crate::types::discovery::{SearchQuery, SearchResult};

/// Source of search hits for the discovery strategies.
///
/// # Implementations
///
/// - `SerperWebSearcher` - Serper (Google results)
/// - `TavilyWebSearcher` - Tavily API
/// - `MockWebSearcher` - For testing
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web for the query.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>>;
}

/// Scripted searcher keyed by exact query text.
#[derive(Default)]
pub struct MockWebSearcher {
    results: RwLock<HashMap<String, Vec<SearchResult>>>,
    failures: RwLock<HashSet<String>>,
    calls: RwLock<Vec<String>>,
}

impl MockWebSearcher {
    /// Empty mock: every query returns no hits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `results`.
    pub fn with_results(self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results
            .write()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    /// Make a query fail with a server error.
    pub fn with_failure(self, query: &str) -> Self {
        self.failures.write().unwrap().insert(query.to_string());
        self
    }

    /// Queries received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.calls.write().unwrap().push(query.text().to_string());

        if self.failures.read().unwrap().contains(query.text()) {
            return Err(DiscoveryError::Http {
                service: "mock-search",
                status: 500,
                message: "scripted failure".into(),
            });
        }

        Ok(self
            .results
            .read()
            .unwrap()
            .get(query.text())
            .cloned()
            .unwrap_or_default())
    }
}

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";
const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Serper-backed web searcher.
///
/// Serper's `organic` hits already carry `title`, `link` and `snippet`.
pub struct SerperWebSearcher {
    api_key: ApiKey,
    client: reqwest::Client,
    /// Hits requested per query (Serper `num`).
    pub max_results: usize,
}

impl SerperWebSearcher {
    /// Searcher against the public Serper endpoint.
    pub fn new(api_key: impl Into<ApiKey>) -> Self {
        Self {
            api_key: api_key.into(),
            client: http::client(Duration::from_secs(30)),
            max_results: 10,
        }
    }
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperHit>,
}

#[derive(Deserialize)]
struct SerperHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl WebSearcher for SerperWebSearcher {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        const SERVICE: &str = "serper";

        let request = SerperRequest {
            q: query.text(),
            num: self.max_results,
        };

        let request = self
            .client
            .post(SERPER_ENDPOINT)
            .header("X-API-KEY", self.api_key.expose())
            .json(&request);
        let serper_response: SerperResponse = http::send_json(SERVICE, request).await?;

        Ok(serper_response
            .organic
            .into_iter()
            .map(|hit| SearchResult::new(hit.title, hit.link, hit.snippet))
            .collect())
    }
}

/// Tavily-backed web searcher.
///
/// Tavily's `url`/`content` fields map onto `link`/`snippet`.
pub struct TavilyWebSearcher {
    api_key: ApiKey,
    client: reqwest::Client,
    /// Hits requested per query.
    pub max_results: usize,
}

impl TavilyWebSearcher {
    /// Searcher with basic search depth and ten hits per query.
    pub fn new(api_key: impl Into<ApiKey>) -> Self {
        Self {
            api_key: api_key.into(),
            client: http::client(Duration::from_secs(30)),
            max_results: 10,
        }
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Deserialize)]
struct TavilyHit {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl WebSearcher for TavilyWebSearcher {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        const SERVICE: &str = "tavily";

        let request = TavilyRequest {
            query: query.text(),
            search_depth: "basic",
            max_results: self.max_results,
        };

        let request = self
            .client
            .post(TAVILY_ENDPOINT)
            .bearer_auth(self.api_key.expose())
            .json(&request);
        let tavily_response: TavilyResponse = http::send_json(SERVICE, request).await?;

        Ok(tavily_response
            .results
            .into_iter()
            .map(|r| {
                SearchResult::new(
                    r.title.unwrap_or_default(),
                    r.url,
                    r.content.unwrap_or_default(),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_web_searcher() {
        let searcher = MockWebSearcher::new().with_results(
            "acme competitors",
            vec![SearchResult::new(
                "Top Acme rivals",
                "https://example.com/rivals",
                "Bolt and Zen compete with Acme",
            )],
        );

        let results = searcher
            .search(&SearchQuery::new("acme competitors"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].link, "https://example.com/rivals");

        let empty = searcher
            .search(&SearchQuery::new("unknown"))
            .await
            .unwrap();
        assert!(empty.is_empty());
        assert_eq!(searcher.calls(), vec!["acme competitors", "unknown"]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let searcher = MockWebSearcher::new().with_failure("broken");
        let err = searcher
            .search(&SearchQuery::new("broken"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_serper_payload_shape() {
        let json = r#"{"organic":[{"title":"T","link":"https://x.io","snippet":"S","position":1}],"searchParameters":{}}"#;
        let parsed: SerperResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.organic.len(), 1);
        assert_eq!(parsed.organic[0].link, "https://x.io");

        let empty: SerperResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.organic.is_empty());
    }

    #[test]
    fn test_tavily_payload_shape() {
        let json = r#"{"results":[{"url":"https://y.io","title":"Y","content":"body","score":0.9}]}"#;
        let parsed: TavilyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results[0].url, "https://y.io");
        assert_eq!(parsed.results[0].content.as_deref(), Some("body"));
    }
}
