//! Tunables for the discovery pipeline.

use std::time::Duration;

use super::discovery::{StrategyId, ACCEPT_THRESHOLD};

/// Configuration for one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Strategies to run. They always run, and are merged, in
    /// [`StrategyId`] priority order regardless of the order given here.
    ///
    /// Default: every [`StrategyId`].
    pub strategies: Vec<StrategyId>,

    /// Courtesy pause between the templated queries of one strategy.
    ///
    /// Default: 1000ms.
    pub query_delay: Duration,

    /// Pause between consecutive strategies.
    ///
    /// Default: 1000ms.
    pub strategy_delay: Duration,

    /// Pause between candidate scoring calls.
    ///
    /// Default: 500ms.
    pub validation_delay: Duration,

    /// Minimum oracle score for acceptance. Default: 60.
    pub accept_threshold: u8,

    /// Run the LM validation oracle. When false, the first
    /// `fallback_accept_limit` candidates are accepted unscored.
    pub validate_candidates: bool,

    /// Candidates accepted without scoring when validation is off. Default: 10.
    pub fallback_accept_limit: usize,

    /// Prompts per citation/rating metric before giving up. Default: 2.
    pub metric_attempts: u32,

    /// Entities whose visibility lookups may be in flight at once. Default: 4.
    pub max_concurrency: usize,

    /// Overall deadline for a run. `None` disables it. Default: 300s.
    pub run_timeout: Option<Duration>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyId::ALL.to_vec(),
            query_delay: Duration::from_millis(1000),
            strategy_delay: Duration::from_millis(1000),
            validation_delay: Duration::from_millis(500),
            accept_threshold: ACCEPT_THRESHOLD,
            validate_candidates: true,
            fallback_accept_limit: 10,
            metric_attempts: 2,
            max_concurrency: 4,
            run_timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl DiscoveryConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the strategies to run.
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = StrategyId>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    /// Set every courtesy delay at once (queries, strategies, validation).
    pub fn with_delays(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self.strategy_delay = delay;
        self.validation_delay = delay;
        self
    }

    /// Enable or disable LM validation.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_candidates = enabled;
        self
    }

    /// Set the visibility concurrency bound (at least 1).
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Set the overall run deadline.
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.strategies.len(), 3);
        assert_eq!(config.query_delay, Duration::from_millis(1000));
        assert_eq!(config.validation_delay, Duration::from_millis(500));
        assert_eq!(config.accept_threshold, 60);
        assert_eq!(config.fallback_accept_limit, 10);
    }

    #[test]
    fn test_builders() {
        let config = DiscoveryConfig::new()
            .with_delays(Duration::ZERO)
            .with_max_concurrency(0)
            .with_strategies([StrategyId::Industry]);
        assert_eq!(config.strategy_delay, Duration::ZERO);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.strategies, vec![StrategyId::Industry]);
    }
}
