//! Credential handling.

pub mod credentials;

pub use credentials::{ApiKey, LlmCredentials, DEFAULT_LLM_BASE_URL};
