//! Visibility metrics.
//!
//! Per entity, citation count and customer rating are two independent LM
//! lookups run together; entities are processed with bounded concurrency in
//! a stable order. Share of voice is one batched prompt covering every
//! entity, issued alongside the per-entity lookups.

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::extract::extract_as;
use super::prompts::{format_citation_prompt, format_rating_prompt, format_share_of_voice_prompt};
use crate::client::QueryClient;
use crate::error::DiscoveryError;
use crate::types::config::DiscoveryConfig;
use crate::types::discovery::{same_entity, VisibilityRecord};

#[derive(Debug, Deserialize)]
struct CitationResponse {
    #[serde(rename = "citationCount")]
    citation_count: f64,
}

#[derive(Debug, Deserialize)]
struct RatingResponse {
    rating: f64,
}

#[derive(Debug, Deserialize)]
struct SharesResponse {
    shares: Vec<Share>,
}

#[derive(Debug, Deserialize)]
struct Share {
    company: String,
    percent: f64,
}

/// Gathers a [`VisibilityRecord`] for each entity.
pub struct VisibilityCollector {
    client: QueryClient,
    attempts: u32,
    max_concurrency: usize,
}

impl VisibilityCollector {
    pub fn new(client: QueryClient, config: &DiscoveryConfig) -> Self {
        Self {
            client,
            attempts: config.metric_attempts.max(1),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Collect records keyed by entity name, in input order.
    ///
    /// Never fails: a metric that could not be obtained is `None`, and an
    /// entity missing from the share-of-voice answer gets 0.
    pub async fn collect(&self, entities: &[String]) -> IndexMap<String, VisibilityRecord> {
        if entities.is_empty() {
            return IndexMap::new();
        }

        let per_entity = stream::iter(entities.iter())
            .map(|entity| self.entity_metrics(entity))
            .buffered(self.max_concurrency)
            .collect::<Vec<_>>();

        let (metrics, shares) = tokio::join!(per_entity, self.share_of_voice(entities));

        let records: IndexMap<String, VisibilityRecord> = entities
            .iter()
            .zip(metrics)
            .map(|(entity, (citation_count, customer_rating))| {
                let share = shares
                    .iter()
                    .find(|s| same_entity(&s.company, entity))
                    .map(|s| s.percent)
                    .unwrap_or(0.0);

                let record = VisibilityRecord {
                    entity_name: entity.clone(),
                    citation_count,
                    customer_rating,
                    share_of_voice_percent: share,
                };
                (entity.clone(), record)
            })
            .collect();

        info!(entities = records.len(), "Visibility collection complete");
        records
    }

    async fn entity_metrics(&self, entity: &str) -> (Option<u64>, Option<f64>) {
        let citation_prompt = format_citation_prompt(entity);
        let rating_prompt = format_rating_prompt(entity);

        let (citations, rating) = tokio::join!(
            self.fetch_metric::<CitationResponse>("citation_count", entity, &citation_prompt),
            self.fetch_metric::<RatingResponse>("customer_rating", entity, &rating_prompt),
        );

        let citation_count = citations
            .map(|r| r.citation_count)
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.round() as u64);
        let customer_rating = rating
            .map(|r| r.rating)
            .filter(|r| r.is_finite() && *r >= 0.0);

        debug!(entity, ?citation_count, ?customer_rating, "Entity metrics");
        (citation_count, customer_rating)
    }

    async fn share_of_voice(&self, entities: &[String]) -> Vec<Share> {
        let prompt = format_share_of_voice_prompt(entities);

        match self.client.complete(&prompt).await {
            Ok(text) => match extract_as::<SharesResponse>(&text) {
                Some(response) => response
                    .shares
                    .into_iter()
                    .filter(|s| s.percent.is_finite())
                    .collect(),
                None => {
                    warn!("Share of voice response malformed, defaulting to 0");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "Share of voice lookup failed, defaulting to 0");
                Vec::new()
            }
        }
    }

    async fn fetch_metric<T: DeserializeOwned>(
        &self,
        metric: &'static str,
        entity: &str,
        prompt: &str,
    ) -> Option<T> {
        for attempt in 1..=self.attempts {
            match self.client.complete(prompt).await {
                Ok(text) => {
                    if let Some(value) = extract_as::<T>(&text) {
                        return Some(value);
                    }
                    debug!(metric, entity, attempt, "Metric response malformed");
                }
                Err(DiscoveryError::Cancelled) => return None,
                Err(e) => {
                    debug!(metric, entity, attempt, error = %e, "Metric lookup failed");
                }
            }
        }

        warn!(metric, entity, attempts = self.attempts, "Metric unavailable");
        None
    }
}
