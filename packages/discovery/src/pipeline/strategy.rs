//! Discovery strategies.
//!
//! A strategy is six fixed query templates. Queries run one after another
//! with a courtesy pause between them; all hits are then handed to the LM in
//! a single extraction prompt.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::extract::extract_string_list;
use super::prompts::format_extract_prompt;
use crate::client::QueryClient;
use crate::types::discovery::{SearchQuery, StrategyId};

const DIRECT_TEMPLATES: [&str; 6] = [
    "{entity} direct competitors",
    "{entity} alternatives",
    "{entity} vs",
    "companies like {entity}",
    "{entity} competitors {industry}",
    "best {entity} alternatives {industry}",
];

const INDUSTRY_TEMPLATES: [&str; 6] = [
    "top {industry} companies",
    "leading {industry} companies like {entity}",
    "{industry} market leaders",
    "{entity} {industry} rivals",
    "{industry} companies similar to {entity}",
    "best {industry} providers compared",
];

const MARKET_ANALYSIS_TEMPLATES: [&str; 6] = [
    "{entity} market share",
    "{entity} competitive landscape",
    "{entity} market analysis competitors",
    "{industry} market share report",
    "{industry} market analysis {entity}",
    "{entity} industry report key players",
];

impl StrategyId {
    /// The strategy's query templates.
    pub fn templates(&self) -> &'static [&'static str; 6] {
        match self {
            Self::Direct => &DIRECT_TEMPLATES,
            Self::Industry => &INDUSTRY_TEMPLATES,
            Self::MarketAnalysis => &MARKET_ANALYSIS_TEMPLATES,
        }
    }

    /// Concrete queries for an entity, in template order.
    ///
    /// Without an industry the `{industry}` placeholder is dropped.
    pub fn queries(&self, entity: &str, industry: Option<&str>) -> Vec<SearchQuery> {
        let entity = entity.trim();
        let industry = industry.map(str::trim).unwrap_or("");

        self.templates()
            .iter()
            .map(|template| {
                let text = template
                    .replace("{entity}", entity)
                    .replace("{industry}", industry);
                SearchQuery::new(text.split_whitespace().collect::<Vec<_>>().join(" "))
            })
            .collect()
    }
}

/// Executes strategies through the query client.
pub struct StrategyRunner {
    client: QueryClient,
    query_delay: Duration,
}

impl StrategyRunner {
    pub fn new(client: QueryClient, query_delay: Duration) -> Self {
        Self {
            client,
            query_delay,
        }
    }

    /// Run one strategy and return raw, unvalidated candidate names.
    ///
    /// Never fails: failed searches contribute no hits, and a failed or
    /// unparseable extraction yields an empty list.
    pub async fn run(
        &self,
        strategy: StrategyId,
        entity: &str,
        industry: Option<&str>,
    ) -> Vec<String> {
        let mut results = Vec::new();

        for (i, query) in strategy.queries(entity, industry).iter().enumerate() {
            if i > 0 {
                self.client.pause(self.query_delay).await;
            }
            if self.client.is_cancelled() {
                break;
            }
            results.extend(self.client.search(query).await);
        }

        debug!(%strategy, hits = results.len(), "Strategy searches complete");

        if results.is_empty() {
            info!(%strategy, "No search results, skipping extraction");
            return Vec::new();
        }

        let prompt = format_extract_prompt(entity, industry, strategy, &results);
        match self.client.complete(&prompt).await {
            Ok(text) => {
                let names = extract_string_list(&text);
                info!(%strategy, names = names.len(), "Strategy extraction complete");
                names
            }
            Err(e) => {
                warn!(%strategy, error = %e, "Strategy extraction failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, MockAI};
    use crate::traits::searcher::MockWebSearcher;
    use crate::types::discovery::SearchResult;
    use std::sync::Arc;

    fn hit(snippet: &str) -> Vec<SearchResult> {
        vec![SearchResult::new("title", "https://example.com", snippet)]
    }

    #[test]
    fn test_queries_substitute_entity_and_industry() {
        let queries = StrategyId::Direct.queries(" Acme ", Some("logistics"));
        assert_eq!(queries.len(), 6);
        assert_eq!(queries[0].text(), "Acme direct competitors");
        assert_eq!(queries[4].text(), "Acme competitors logistics");
    }

    #[test]
    fn test_queries_without_industry_collapse_whitespace() {
        let queries = StrategyId::Industry.queries("Acme", None);
        assert_eq!(queries[0].text(), "top companies");
        assert_eq!(queries[3].text(), "Acme rivals");
        assert!(queries.iter().all(|q| !q.text().contains("  ")));
    }

    #[test]
    fn test_every_strategy_has_six_templates() {
        for strategy in StrategyId::ALL {
            assert_eq!(strategy.queries("Acme", Some("retail")).len(), 6);
        }
    }

    #[tokio::test]
    async fn test_run_issues_queries_in_order_with_delay() {
        let queries = StrategyId::Direct.queries("Acme", None);
        let searcher = Arc::new(
            MockWebSearcher::new()
                .with_results(queries[0].text(), hit("Bolt is a rival"))
                .with_results(queries[3].text(), hit("Zen is similar")),
        );
        let ai = Arc::new(
            MockAI::new().with_response("Search angle: direct competitors", r#"["Bolt", "Zen"]"#),
        );
        let clock = Arc::new(ManualClock::new());
        let client = QueryClient::new(searcher.clone(), ai.clone()).with_clock(clock.clone());

        let names = StrategyRunner::new(client, Duration::from_millis(1000))
            .run(StrategyId::Direct, "Acme", None)
            .await;

        assert_eq!(names, vec!["Bolt", "Zen"]);
        let issued: Vec<String> = queries.iter().map(|q| q.text().to_string()).collect();
        assert_eq!(searcher.calls(), issued);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(1000); 5]);

        // One extraction call carrying every hit
        let prompts = ai.calls();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Bolt is a rival"));
        assert!(prompts[0].contains("Zen is similar"));
    }

    #[tokio::test]
    async fn test_failed_query_does_not_abort_strategy() {
        let queries = StrategyId::Direct.queries("Acme", None);
        let searcher = MockWebSearcher::new()
            .with_failure(queries[0].text())
            .with_results(queries[1].text(), hit("Bolt"));
        let ai = MockAI::new().with_response("COMPETITOR EXTRACTION", r#"["Bolt"]"#);
        let client = QueryClient::new(Arc::new(searcher), Arc::new(ai))
            .with_clock(Arc::new(ManualClock::new()));

        let names = StrategyRunner::new(client, Duration::ZERO)
            .run(StrategyId::Direct, "Acme", None)
            .await;

        assert_eq!(names, vec!["Bolt"]);
    }

    #[tokio::test]
    async fn test_unparseable_extraction_yields_empty() {
        let queries = StrategyId::Direct.queries("Acme", None);
        let searcher = MockWebSearcher::new().with_results(queries[0].text(), hit("noise"));
        let ai = MockAI::new().with_response("COMPETITOR EXTRACTION", "I am not sure.");
        let client = QueryClient::new(Arc::new(searcher), Arc::new(ai))
            .with_clock(Arc::new(ManualClock::new()));

        let names = StrategyRunner::new(client, Duration::ZERO)
            .run(StrategyId::Direct, "Acme", None)
            .await;

        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_no_hits_skips_llm() {
        let ai = Arc::new(MockAI::new());
        let client = QueryClient::new(Arc::new(MockWebSearcher::new()), ai.clone())
            .with_clock(Arc::new(ManualClock::new()));

        let names = StrategyRunner::new(client, Duration::ZERO)
            .run(StrategyId::MarketAnalysis, "Acme", None)
            .await;

        assert!(names.is_empty());
        assert!(ai.calls().is_empty());
    }
}
