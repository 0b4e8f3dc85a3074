//! Typed errors for the discovery engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match on
//! the failure class. Only [`DiscoveryError::Config`] reaches callers, at
//! construction time; every other variant is recovered inside the pipeline.

use thiserror::Error;

/// Errors that can occur while talking to upstream services.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Required configuration (credentials, provider names) missing or invalid
    #[error("config error: {0}")]
    Config(String),

    /// Upstream answered HTTP 429
    #[error("rate limited by {service}")]
    RateLimited { service: &'static str },

    /// Upstream answered a non-2xx status other than 429
    #[error("{service} returned HTTP {status}: {message}")]
    Http {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Connection failed or timed out before a response arrived
    #[error("network error calling {service}: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Response body could not be decoded
    #[error("malformed response from {service}: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    /// The run deadline passed before the call could complete
    #[error("operation cancelled")]
    Cancelled,
}

impl DiscoveryError {
    /// Build a network error from any error type.
    pub fn network(
        service: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Network {
            service,
            source: source.into(),
        }
    }

    /// Build an error from a non-success HTTP status.
    ///
    /// 429 maps to [`DiscoveryError::RateLimited`]; everything else to
    /// [`DiscoveryError::Http`].
    pub fn from_status(
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    ) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited { service }
        } else {
            Self::Http {
                service,
                status: status.as_u16(),
                message: body,
            }
        }
    }

    /// True for HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Rate limits, network failures and 5xx responses are transient.
    /// Client errors, malformed bodies, config errors and cancellation are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Config(_) | Self::Malformed { .. } | Self::Cancelled => false,
        }
    }
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_maps_to_rate_limited() {
        let err = DiscoveryError::from_status(
            "search",
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            String::new(),
        );
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_retry_classification() {
        let server = DiscoveryError::from_status(
            "llm",
            reqwest::StatusCode::BAD_GATEWAY,
            "upstream down".into(),
        );
        assert!(server.is_retryable());

        let client = DiscoveryError::from_status(
            "llm",
            reqwest::StatusCode::UNAUTHORIZED,
            "bad key".into(),
        );
        assert!(!client.is_retryable());
        assert!(!DiscoveryError::Cancelled.is_retryable());
        assert!(!DiscoveryError::Config("missing".into()).is_retryable());
    }

    #[test]
    fn test_display_includes_service() {
        let err = DiscoveryError::Malformed {
            service: "serper",
            message: "expected array".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed response from serper: expected array"
        );
    }
}
