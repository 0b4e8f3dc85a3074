//! Competitor Discovery & Visibility Aggregation Engine
//!
//! Given a target organization (and optionally its industry), discovers
//! likely competitors through several independent web-search strategies,
//! validates them with an LM scoring oracle, and collects a visibility
//! record (citation count, customer rating, share of voice) for the target
//! and every accepted competitor.
//!
//! # Design Philosophy
//!
//! **"Degrade, don't fail"**
//!
//! - Missing credentials are the only error a caller ever sees
//! - Every upstream failure becomes an empty or `null` value
//! - LM output is never trusted to be JSON; it always goes through [`pipeline::extract`]
//! - Deterministic ranking for a fixed set of upstream answers
//!
//! # Usage
//!
//! ```rust,ignore
//! use discovery::DiscoveryEngine;
//!
//! let engine = DiscoveryEngine::from_env()?;
//! let result = engine.discover("Acme", Some("logistics")).await;
//!
//! assert_eq!(result.competitors[0].entity_name, "Acme");
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Search and LM provider seams (WebSearcher, AI)
//! - [`client`] - Rate-limited query client with retry and backoff
//! - [`pipeline`] - Extraction, strategies, aggregation, validation, visibility
//! - [`types`] - Data model and run tunables
//! - [`config`] - Environment configuration
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod client;
pub mod config;
pub mod error;
mod http;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use client::{Clock, QueryClient, RetryPolicy, TokioClock};
pub use config::{Config, SearchProvider};
pub use error::{DiscoveryError, Result};
pub use pipeline::{DiscoveryEngine, PipelineState};
pub use traits::{
    ai::AI,
    searcher::{MockWebSearcher, SerperWebSearcher, TavilyWebSearcher, WebSearcher},
};
pub use types::{
    config::DiscoveryConfig,
    discovery::{
        Candidate, DiscoveryResult, RunStats, SearchQuery, SearchResult, StrategyId,
        ValidatedCompetitor, VisibilityRecord,
    },
};
