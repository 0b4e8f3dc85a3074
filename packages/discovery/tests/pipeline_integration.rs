//! Integration tests for the full discovery run.
//!
//! These tests drive `DiscoveryEngine::discover` end to end against mock
//! providers:
//! 1. Strategies produce raw names
//! 2. Names are aggregated and validated
//! 3. Visibility is collected for the target and accepted competitors

use std::sync::Arc;
use std::time::Duration;

use discovery::{
    testing::{ManualClock, MockAI},
    DiscoveryConfig, DiscoveryEngine, MockWebSearcher, QueryClient, SearchResult, StrategyId,
};

/// Helper to create a single search hit.
fn hit(snippet: &str) -> Vec<SearchResult> {
    vec![SearchResult::new("result", "https://example.com", snippet)]
}

/// Searcher answering the first query of each given strategy.
fn searcher_for(entity: &str, strategies: &[StrategyId]) -> MockWebSearcher {
    strategies.iter().fold(MockWebSearcher::new(), |searcher, strategy| {
        let query = strategy.queries(entity, None).remove(0);
        searcher.with_results(query.text(), hit("industry roundup"))
    })
}

/// Engine over mock providers with instant delays and no deadline.
fn engine(
    searcher: MockWebSearcher,
    ai: Arc<MockAI>,
    config: DiscoveryConfig,
) -> DiscoveryEngine {
    let client =
        QueryClient::new(Arc::new(searcher), ai).with_clock(Arc::new(ManualClock::new()));
    DiscoveryEngine::new(client, config)
}

fn fast_config(strategies: &[StrategyId]) -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_strategies(strategies.iter().copied())
        .with_delays(Duration::ZERO)
        .with_run_timeout(None)
}

#[tokio::test]
async fn test_end_to_end_discovery() {
    let strategies = [StrategyId::Direct, StrategyId::Industry];
    let ai = Arc::new(
        MockAI::new()
            .with_response("Search angle: direct competitors", r#"["Bolt", "bolt "]"#)
            .with_response("Search angle: industry players", "```json\n[\"Zen\"]\n```")
            .with_response("Candidate: Bolt", "80")
            .with_response("Candidate: Zen", "40")
            .with_response("CITATION COUNT\nCompany: Acme", r#"{"citationCount": 300}"#)
            .with_response("CITATION COUNT\nCompany: Bolt", r#"{"citationCount": 120}"#)
            .with_response("CUSTOMER RATING", r#"{"rating": 4.5}"#)
            .with_response(
                "SHARE OF VOICE",
                r#"{"shares": [{"company": "Acme", "percent": 70}, {"company": "Bolt", "percent": 30}]}"#,
            ),
    );

    let result = engine(searcher_for("Acme", &strategies), ai.clone(), fast_config(&strategies))
        .discover("Acme", None)
        .await;

    assert_eq!(result.target_entity, "Acme");
    assert!(!result.timed_out);

    let names: Vec<&str> = result
        .competitors
        .iter()
        .map(|r| r.entity_name.as_str())
        .collect();
    assert_eq!(names, vec!["Acme", "Bolt"]);

    assert_eq!(result.competitors[0].citation_count, Some(300));
    assert_eq!(result.competitors[0].share_of_voice_percent, 70.0);
    assert_eq!(result.competitors[1].citation_count, Some(120));
    assert_eq!(result.competitors[1].customer_rating, Some(4.5));
    assert_eq!(result.competitors[1].share_of_voice_percent, 30.0);

    // Rejected candidates never reach visibility scoring
    assert_eq!(ai.calls_containing("Company: Zen"), 0);
    assert!(ai.calls().iter().any(|p| p.contains("Companies: Acme, Bolt")));

    // The target bypasses validation
    assert_eq!(ai.calls_containing("Candidate: Acme"), 0);

    assert_eq!(result.stats.names_per_strategy[&StrategyId::Direct], 2);
    assert_eq!(result.stats.names_per_strategy[&StrategyId::Industry], 1);
    assert_eq!(result.stats.candidates_aggregated, 2);
    assert_eq!(result.stats.candidates_accepted, 1);
}

#[tokio::test]
async fn test_target_rediscovered_appears_once() {
    let strategies = [StrategyId::Direct];
    let ai = Arc::new(
        MockAI::new()
            .with_response("COMPETITOR EXTRACTION", r#"["ACME", " acme", "Bolt"]"#)
            .with_response("COMPETITOR SCORING", "95"),
    );

    let result = engine(searcher_for("Acme", &strategies), ai, fast_config(&strategies))
        .discover("Acme", None)
        .await;

    let acme_count = result
        .competitors
        .iter()
        .filter(|r| r.entity_name.eq_ignore_ascii_case("acme"))
        .count();
    assert_eq!(acme_count, 1);
    assert_eq!(result.competitors[0].entity_name, "Acme");
    assert_eq!(result.competitors.len(), 2);
}

#[tokio::test]
async fn test_upstream_failures_degrade_to_unknowns() {
    let strategies = [StrategyId::Direct, StrategyId::MarketAnalysis];
    // An empty needle matches every prompt
    let ai = Arc::new(MockAI::new().with_failure(""));

    let result = engine(searcher_for("Acme", &strategies), ai, fast_config(&strategies))
        .discover("Acme", Some("logistics"))
        .await;

    assert!(!result.timed_out);
    assert_eq!(result.competitors.len(), 1);

    let acme = &result.competitors[0];
    assert_eq!(acme.entity_name, "Acme");
    assert_eq!(acme.citation_count, None);
    assert_eq!(acme.customer_rating, None);
    assert_eq!(acme.share_of_voice_percent, 0.0);
}

#[tokio::test]
async fn test_refusal_text_is_not_a_competitor() {
    let strategies = [StrategyId::Direct];
    let ai = Arc::new(
        MockAI::new().with_response("COMPETITOR EXTRACTION", "Sorry, no competitors found."),
    );
    let config = fast_config(&strategies).with_validation(false);

    let result = engine(searcher_for("Acme", &strategies), ai.clone(), config)
        .discover("Acme", None)
        .await;

    let names: Vec<&str> = result
        .competitors
        .iter()
        .map(|r| r.entity_name.as_str())
        .collect();
    assert_eq!(names, vec!["Acme"]);
    assert_eq!(result.stats.candidates_aggregated, 0);
    assert_eq!(ai.calls_containing("Company: Sorry"), 0);
}

#[tokio::test]
async fn test_oracle_outage_fails_open() {
    let strategies = [StrategyId::Direct];
    let ai = Arc::new(
        MockAI::new()
            .with_response("COMPETITOR EXTRACTION", r#"["Bolt", "Zen"]"#)
            .with_failure("COMPETITOR SCORING"),
    );

    let result = engine(searcher_for("Acme", &strategies), ai, fast_config(&strategies))
        .discover("Acme", None)
        .await;

    let names: Vec<&str> = result
        .competitors
        .iter()
        .map(|r| r.entity_name.as_str())
        .collect();
    assert_eq!(names, vec!["Acme", "Bolt", "Zen"]);
}

#[tokio::test]
async fn test_deadline_returns_partial_results() {
    let strategies = [StrategyId::Direct];
    let ai = Arc::new(
        MockAI::new()
            .with_response("COMPETITOR EXTRACTION", r#"["Bolt"]"#)
            .with_response("COMPETITOR SCORING", "90")
            .with_response("CITATION COUNT", r#"{"citationCount": 12}"#)
            .with_response("CUSTOMER RATING", r#"{"rating": 4.1}"#)
            .with_delay("SHARE OF VOICE", Duration::from_secs(30), r#"{"shares": []}"#),
    );
    let config = fast_config(&strategies).with_run_timeout(Some(Duration::from_millis(300)));

    let started = std::time::Instant::now();
    let result = engine(searcher_for("Acme", &strategies), ai, config)
        .discover("Acme", None)
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(result.timed_out);

    // Everything gathered before the deadline is kept
    assert_eq!(result.competitors.len(), 2);
    assert_eq!(result.competitors[1].entity_name, "Bolt");
    assert_eq!(result.competitors[1].citation_count, Some(12));
    assert!(result.competitors.iter().all(|r| r.share_of_voice_percent == 0.0));
}

#[tokio::test]
async fn test_result_serializes_camel_case() {
    let strategies = [StrategyId::Direct];
    let ai = Arc::new(MockAI::new());

    let result = engine(searcher_for("Acme", &strategies), ai, fast_config(&strategies))
        .discover("Acme", None)
        .await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["targetEntity"], "Acme");
    assert_eq!(json["competitors"][0]["entityName"], "Acme");
    assert!(json["competitors"][0]["citationCount"].is_null());
    assert_eq!(json["timedOut"], false);
    assert_eq!(json["stats"]["namesPerStrategy"]["direct"], 0);
    assert!(json["runId"].is_string());
}
