//! LM-backed validation of candidate competitors.
//!
//! Candidates are scored one at a time. An oracle failure accepts the
//! candidate (fail-open); with no oracle configured, the top candidates by
//! rank are accepted without scoring.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::extract::first_integer;
use super::prompts::format_score_prompt;
use crate::client::QueryClient;
use crate::error::{DiscoveryError, Result};
use crate::types::config::DiscoveryConfig;
use crate::types::discovery::ValidatedCompetitor;

/// Scores candidates and keeps the plausible ones.
pub struct ValidationOracle {
    client: Option<QueryClient>,
    threshold: u8,
    delay: Duration,
    fallback_limit: usize,
}

impl ValidationOracle {
    /// An oracle that scores through the LM.
    pub fn new(client: QueryClient, config: &DiscoveryConfig) -> Self {
        Self {
            client: Some(client),
            threshold: config.accept_threshold,
            delay: config.validation_delay,
            fallback_limit: config.fallback_accept_limit,
        }
    }

    /// An oracle with no scoring capability.
    pub fn disabled(config: &DiscoveryConfig) -> Self {
        Self {
            client: None,
            threshold: config.accept_threshold,
            delay: config.validation_delay,
            fallback_limit: config.fallback_accept_limit,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Score a single candidate.
    ///
    /// Oracle errors produce a fail-open verdict. `None` means the run was
    /// cancelled before a verdict was reached.
    pub async fn score_candidate(
        &self,
        entity: &str,
        candidate: &str,
        industry: Option<&str>,
    ) -> Option<ValidatedCompetitor> {
        match self.try_score(entity, candidate, industry).await {
            Ok(verdict) => {
                debug!(
                    candidate,
                    score = verdict.score,
                    accepted = verdict.accepted,
                    "Candidate scored"
                );
                Some(verdict)
            }
            Err(DiscoveryError::Cancelled) => None,
            Err(e) => {
                warn!(candidate, error = %e, "Scoring failed, accepting candidate");
                Some(ValidatedCompetitor::fail_open(candidate))
            }
        }
    }

    /// Accepted candidates, in input order.
    ///
    /// Candidates still unscored when the run is cancelled are left out.
    pub async fn validate(
        &self,
        entity: &str,
        candidates: &[String],
        industry: Option<&str>,
    ) -> Vec<String> {
        let Some(client) = &self.client else {
            info!(
                limit = self.fallback_limit,
                "No scoring configured, accepting top candidates"
            );
            return candidates
                .iter()
                .take(self.fallback_limit)
                .cloned()
                .collect();
        };

        let mut accepted = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            if i > 0 {
                client.pause(self.delay).await;
            }
            if client.is_cancelled() {
                warn!(
                    remaining = candidates.len() - i,
                    "Run cancelled, leaving remaining candidates unscored"
                );
                break;
            }

            match self.score_candidate(entity, candidate, industry).await {
                Some(verdict) if verdict.accepted => accepted.push(candidate.clone()),
                Some(_) => {}
                None => break,
            }
        }

        info!(
            candidates = candidates.len(),
            accepted = accepted.len(),
            "Validation complete"
        );
        accepted
    }

    async fn try_score(
        &self,
        entity: &str,
        candidate: &str,
        industry: Option<&str>,
    ) -> Result<ValidatedCompetitor> {
        let Some(client) = &self.client else {
            return Ok(ValidatedCompetitor::fail_open(candidate));
        };

        let prompt = format_score_prompt(entity, candidate, industry);
        let text = client.complete(&prompt).await?;
        let score = first_integer(&text).unwrap_or(0);

        Ok(ValidatedCompetitor::with_threshold(
            candidate,
            score,
            self.threshold,
        ))
    }
}
