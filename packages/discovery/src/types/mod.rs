//! Data types for the discovery engine.

pub mod config;
pub mod discovery;
