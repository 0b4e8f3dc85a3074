//! End-to-end discovery run.
//!
//! ```text
//! Discovering -> Aggregating -> Validating -> ScoringVisibility -> Done
//! ```
//!
//! Strategies run sequentially, in priority order, with a pause between
//! them. The target entity bypasses validation and always leads the output.
//! An optional run deadline cancels in-flight calls and pending pauses;
//! whatever was collected by then is returned with `timed_out` set.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::aggregate::aggregate;
use super::strategy::StrategyRunner;
use super::validate::ValidationOracle;
use super::visibility::VisibilityCollector;
use crate::ai::OpenAI;
use crate::client::QueryClient;
use crate::config::{Config, SearchProvider};
use crate::error::Result;
use crate::traits::searcher::{SerperWebSearcher, TavilyWebSearcher, WebSearcher};
use crate::types::config::DiscoveryConfig;
use crate::types::discovery::{
    same_entity, DiscoveryResult, RunStats, StrategyId, VisibilityRecord,
};

/// Pipeline phases. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Discovering,
    Aggregating,
    Validating,
    ScoringVisibility,
    Done,
}

impl PipelineState {
    /// Move to `next`. Backward or repeated transitions are ignored.
    pub fn advance(&mut self, next: PipelineState) -> bool {
        if next <= *self {
            warn!(from = ?self, to = ?next, "Ignoring backward pipeline transition");
            return false;
        }
        info!(from = ?self, to = ?next, "Pipeline state transition");
        *self = next;
        true
    }
}

/// Competitor discovery engine.
///
/// Holds the process-wide query client (read-only after construction) and
/// the run tunables. Each [`discover`](Self::discover) call gets its own
/// cancellation scope.
pub struct DiscoveryEngine {
    client: QueryClient,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    pub fn new(client: QueryClient, config: DiscoveryConfig) -> Self {
        Self { client, config }
    }

    /// Build the engine from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let searcher: Arc<dyn WebSearcher> = match config.search_provider {
            SearchProvider::Serper => {
                Arc::new(SerperWebSearcher::new(config.search_api_key.clone()))
            }
            SearchProvider::Tavily => {
                Arc::new(TavilyWebSearcher::new(config.search_api_key.clone()))
            }
        };
        let ai = Arc::new(OpenAI::from_credentials(config.llm.clone()));

        let mut client = QueryClient::new(searcher, ai);
        if let Some(rps) = config.requests_per_second {
            client = client.with_requests_per_second(rps);
        }

        info!(
            search_provider = ?config.search_provider,
            model = %config.llm.model,
            validate = config.discovery.validate_candidates,
            "Discovery engine configured"
        );

        Self::new(client, config.discovery.clone())
    }

    /// Build the engine from environment variables.
    ///
    /// Fails only when required credentials are missing or malformed.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(&Config::from_env()?))
    }

    /// Discover competitors of `entity` and score their visibility.
    ///
    /// Always produces a result; upstream failures degrade to missing
    /// metrics rather than errors.
    pub async fn discover(&self, entity: &str, industry: Option<&str>) -> DiscoveryResult {
        let run_id = Uuid::now_v7();
        let entity = entity.trim();
        let industry = industry.map(str::trim).filter(|s| !s.is_empty());

        let span = info_span!("discover", %run_id, entity, industry = ?industry);
        self.run(run_id, entity, industry).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, entity: &str, industry: Option<&str>) -> DiscoveryResult {
        let cancel = CancellationToken::new();
        let deadline = self.config.run_timeout.map(|timeout| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Run deadline reached, returning partial results"
                );
                cancel.cancel();
            })
        });

        let client = self.client.for_run(cancel.clone());
        let mut state = PipelineState::Discovering;
        let mut stats = RunStats::default();

        // Discovering
        let per_strategy = self.run_strategies(&client, entity, industry).await;
        stats.names_per_strategy = per_strategy
            .iter()
            .map(|(strategy, names)| (*strategy, names.len()))
            .collect();

        state.advance(PipelineState::Aggregating);
        let candidates: Vec<String> = aggregate(entity, &per_strategy)
            .into_iter()
            .map(|candidate| candidate.name)
            .collect();
        stats.candidates_aggregated = candidates.len();

        state.advance(PipelineState::Validating);
        let oracle = if self.config.validate_candidates {
            ValidationOracle::new(client.clone(), &self.config)
        } else {
            ValidationOracle::disabled(&self.config)
        };
        let accepted = oracle.validate(entity, &candidates, industry).await;

        state.advance(PipelineState::ScoringVisibility);
        let mut entities = vec![entity.to_string()];
        entities.extend(
            accepted
                .into_iter()
                .filter(|name| !same_entity(name, entity)),
        );
        stats.candidates_accepted = entities.len() - 1;

        let records = VisibilityCollector::new(client, &self.config)
            .collect(&entities)
            .await;
        let competitors: Vec<VisibilityRecord> = entities
            .iter()
            .map(|name| {
                records
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| VisibilityRecord::unknown(name.as_str()))
            })
            .collect();

        state.advance(PipelineState::Done);
        let timed_out = cancel.is_cancelled();
        if let Some(handle) = deadline {
            handle.abort();
        }

        info!(
            candidates = stats.candidates_aggregated,
            accepted = stats.candidates_accepted,
            timed_out,
            "Discovery complete"
        );

        DiscoveryResult {
            run_id,
            target_entity: entity.to_string(),
            competitors,
            timed_out,
            completed_at: Utc::now(),
            stats,
        }
    }

    async fn run_strategies(
        &self,
        client: &QueryClient,
        entity: &str,
        industry: Option<&str>,
    ) -> BTreeMap<StrategyId, Vec<String>> {
        let runner = StrategyRunner::new(client.clone(), self.config.query_delay);
        let mut per_strategy: BTreeMap<StrategyId, Vec<String>> = BTreeMap::new();

        let mut strategies = self.config.strategies.clone();
        strategies.sort();
        strategies.dedup();

        for (i, strategy) in strategies.iter().enumerate() {
            if i > 0 {
                client.pause(self.config.strategy_delay).await;
            }
            if client.is_cancelled() {
                warn!(%strategy, "Run cancelled, skipping remaining strategies");
                break;
            }
            let names = runner.run(*strategy, entity, industry).await;
            per_strategy.entry(*strategy).or_default().extend(names);
        }

        per_strategy
    }
}
