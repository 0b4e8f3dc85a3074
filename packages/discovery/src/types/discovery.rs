//! Pipeline data model: queries, raw hits, candidates, verdicts and the final
//! visibility payload.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score at or above which a candidate is accepted as a competitor.
pub const ACCEPT_THRESHOLD: u8 = 60;

/// A discovery strategy: one angle of templated search queries.
///
/// Variant order is the merge priority used when folding strategy outputs,
/// which fixes the tie-break order of equally frequent candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    /// "X competitors", "X alternatives", "X vs"
    Direct,
    /// Same-industry players
    Industry,
    /// Market reports and market-share analyses
    MarketAnalysis,
}

impl StrategyId {
    /// All strategies in merge priority order.
    pub const ALL: [StrategyId; 3] = [
        StrategyId::Direct,
        StrategyId::Industry,
        StrategyId::MarketAnalysis,
    ];

    /// Human-readable angle, embedded in extraction prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "direct competitors",
            Self::Industry => "industry players",
            Self::MarketAnalysis => "market analysis",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Direct => "direct",
            Self::Industry => "industry",
            Self::MarketAnalysis => "market_analysis",
        };
        f.write_str(s)
    }
}

/// A single templated search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A raw search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Identity key for an organization name: trimmed, lowercased, inner
/// whitespace collapsed to single spaces.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case- and whitespace-insensitive name equality.
pub fn same_entity(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

/// An unvalidated, deduplicated competitor name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// First-seen casing, trimmed.
    pub name: String,

    /// Number of observations across every strategy.
    pub frequency: u32,

    /// Strategies that produced this name.
    pub sources: BTreeSet<StrategyId>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, source: StrategyId) -> Self {
        Self {
            name: name.into().trim().to_string(),
            frequency: 1,
            sources: BTreeSet::from([source]),
        }
    }

    /// Record one more observation.
    pub fn observe(&mut self, source: StrategyId) {
        self.frequency += 1;
        self.sources.insert(source);
    }
}

/// Verdict of the validation oracle for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedCompetitor {
    pub name: String,
    pub score: u8,
    pub accepted: bool,
}

impl ValidatedCompetitor {
    /// Verdict from a score, clamped to 0..=100.
    pub fn from_score(name: impl Into<String>, score: u32) -> Self {
        Self::with_threshold(name, score, ACCEPT_THRESHOLD)
    }

    pub fn with_threshold(name: impl Into<String>, score: u32, threshold: u8) -> Self {
        let score = score.min(100) as u8;
        Self {
            name: name.into(),
            score,
            accepted: score >= threshold,
        }
    }

    /// Verdict used when the oracle could not be reached.
    pub fn fail_open(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            accepted: true,
        }
    }
}

/// Visibility metrics for one entity. `None` means unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRecord {
    pub entity_name: String,
    pub citation_count: Option<u64>,
    pub customer_rating: Option<f64>,
    pub share_of_voice_percent: f64,
}

impl VisibilityRecord {
    /// A record with every metric unknown and zero share of voice.
    pub fn unknown(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            citation_count: None,
            customer_rating: None,
            share_of_voice_percent: 0.0,
        }
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Raw (pre-dedup) names produced per strategy.
    pub names_per_strategy: BTreeMap<StrategyId, usize>,
    pub candidates_aggregated: usize,
    pub candidates_accepted: usize,
}

/// Final payload of a discovery run.
///
/// `competitors[0]` is always the target entity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub run_id: Uuid,
    pub target_entity: String,
    pub competitors: Vec<VisibilityRecord>,
    /// True when the run deadline fired and the payload is partial.
    pub timed_out: bool,
    pub completed_at: DateTime<Utc>,
    pub stats: RunStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Bolt  "), "bolt");
        assert_eq!(normalize_name("Acme\tCorp\n"), "acme corp");
        assert_eq!(normalize_name("ACME   corp"), "acme corp");
        assert!(same_entity("bolt ", "BOLT"));
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(ValidatedCompetitor::from_score("A", 60).accepted);
        assert!(!ValidatedCompetitor::from_score("A", 59).accepted);
        assert_eq!(ValidatedCompetitor::from_score("A", 250).score, 100);
    }

    #[test]
    fn test_candidate_observe() {
        let mut c = Candidate::new(" Bolt ", StrategyId::Direct);
        c.observe(StrategyId::Industry);
        c.observe(StrategyId::Direct);
        assert_eq!(c.name, "Bolt");
        assert_eq!(c.frequency, 3);
        assert_eq!(c.sources.len(), 2);
    }

    #[test]
    fn test_visibility_record_serializes_camel_case() {
        let record = VisibilityRecord::unknown("Acme");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["entityName"], "Acme");
        assert!(json["citationCount"].is_null());
        assert_eq!(json["shareOfVoicePercent"], 0.0);
    }

    #[test]
    fn test_strategy_priority_order() {
        let mut ids = vec![
            StrategyId::MarketAnalysis,
            StrategyId::Direct,
            StrategyId::Industry,
        ];
        ids.sort();
        assert_eq!(ids, StrategyId::ALL.to_vec());
    }
}
