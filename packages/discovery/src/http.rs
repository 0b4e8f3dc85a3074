//! Shared plumbing for the provider HTTP clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{DiscoveryError, Result};

/// Build a `reqwest` client with a per-request timeout.
///
/// If the TLS backend cannot be initialised the default client is used,
/// which has no request timeout.
pub(crate) fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(
                error = %e,
                timeout_secs = timeout.as_secs(),
                "HTTP client builder failed, falling back to a client without a timeout"
            );
            reqwest::Client::new()
        })
}

/// Send a provider request and decode its JSON body.
///
/// Transport failures become `Network`, non-2xx statuses go through
/// [`DiscoveryError::from_status`], and an undecodable body is `Malformed`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| DiscoveryError::network(service, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DiscoveryError::from_status(service, status, body));
    }

    response.json().await.map_err(|e| DiscoveryError::Malformed {
        service,
        message: e.to_string(),
    })
}
