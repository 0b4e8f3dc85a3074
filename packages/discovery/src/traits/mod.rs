//! Seams to the external services the engine consumes.
//!
//! Applications (and tests) plug search and LM providers in through these
//! traits; the pipeline never talks HTTP directly.

pub mod ai;
pub mod searcher;
