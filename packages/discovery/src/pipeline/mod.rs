//! Discovery pipeline stages.
//!
//! Leaf-first: [`extract`] interprets LM text, [`strategy`] turns templated
//! searches into raw names, [`aggregate`] ranks them, [`validate`] filters
//! them, [`visibility`] scores the survivors, and [`orchestrator`] sequences
//! the lot.

pub mod aggregate;
pub mod extract;
pub mod orchestrator;
pub mod prompts;
pub mod strategy;
pub mod validate;
pub mod visibility;

pub use aggregate::aggregate;
pub use extract::{extract, extract_as, extract_string_list, first_integer, Extracted};
pub use orchestrator::{DiscoveryEngine, PipelineState};
pub use strategy::StrategyRunner;
pub use validate::ValidationOracle;
pub use visibility::VisibilityCollector;
