//! Candidate aggregation across strategies.
//!
//! A pure fold: names are keyed by their normalized form in an
//! insertion-ordered map, so the first-seen casing wins and ties keep
//! first-observed order after the stable frequency sort.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::types::discovery::{normalize_name, Candidate, StrategyId};

/// Merge per-strategy names into frequency-ranked candidates.
///
/// Strategies are folded in [`StrategyId`] priority order. Blank names and
/// the target entity itself (case- and whitespace-insensitive) are dropped.
pub fn aggregate(target: &str, per_strategy: &BTreeMap<StrategyId, Vec<String>>) -> Vec<Candidate> {
    let target_key = normalize_name(target);

    let folded = per_strategy
        .iter()
        .flat_map(|(strategy, names)| names.iter().map(move |name| (*strategy, name)))
        .fold(IndexMap::<String, Candidate>::new(), |mut acc, (strategy, name)| {
            let key = normalize_name(name);
            if key.is_empty() || key == target_key {
                return acc;
            }
            acc.entry(key)
                .and_modify(|candidate| candidate.observe(strategy))
                .or_insert_with(|| Candidate::new(name.as_str(), strategy));
            acc
        });

    let mut candidates: Vec<Candidate> = folded.into_values().collect();
    // sort_by is stable: equal frequencies keep first-observed order
    candidates.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    candidates
}
