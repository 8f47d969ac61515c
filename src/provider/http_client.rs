//! Shared HTTP client construction and response checking for lookup backends.
//!
//! Every backend builds its client here so timeouts, user-agent and
//! compression stay consistent, and maps transport failures and non-success
//! statuses to [`LookupError`] the same way.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::user_agent;

use super::LookupError;

/// Default connect timeout for lookup requests.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default overall request timeout for lookup requests.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Timeouts applied to lookup HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTimeouts {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_secs: u64,
}

impl Default for LookupTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Builds a lookup HTTP client using shared project policy.
///
/// # Errors
///
/// Returns [`LookupError::ClientBuild`] when client construction fails.
pub fn build_lookup_http_client(
    provider: &'static str,
    timeouts: LookupTimeouts,
) -> Result<Client, LookupError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent::default_lookup_user_agent())
        .gzip(true)
        .build()
        .map_err(|source| LookupError::ClientBuild { provider, source })
}

/// Sends a request and decodes a JSON body of type `T`.
///
/// Transport failures become [`LookupError::Network`]/[`LookupError::Timeout`],
/// non-2xx statuses become [`LookupError::HttpStatus`] (keeping any
/// `Retry-After` header) and undecodable bodies become
/// [`LookupError::MalformedPayload`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    name: &str,
    request: RequestBuilder,
) -> Result<T, LookupError> {
    let response = request
        .send()
        .await
        .map_err(|e| LookupError::transport(provider, name, e))?;
    let response = check_status(provider, name, response)?;

    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            LookupError::transport(provider, name, e)
        } else {
            LookupError::malformed(provider, name, e.to_string())
        }
    })
}

fn check_status(provider: &'static str, name: &str, response: Response) -> Result<Response, LookupError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    debug!(provider, status = status.as_u16(), ?retry_after, "lookup returned error status");

    Err(LookupError::http_status(
        provider,
        name,
        status.as_u16(),
        retry_after,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = LookupTimeouts::default();
        assert_eq!(timeouts.connect_secs, 10);
        assert_eq!(timeouts.read_secs, 30);
    }

    #[test]
    fn test_build_client_succeeds_with_defaults() {
        assert!(build_lookup_http_client("namsor", LookupTimeouts::default()).is_ok());
    }

    // ==================== Failure mapping ====================

    use crate::test_support::start_mock_server_or_skip;
    use wiremock::matchers::method;
    use wiremock::{Mock, ResponseTemplate};

    async fn fetch(uri: &str, timeouts: LookupTimeouts) -> Result<serde_json::Value, LookupError> {
        let client = build_lookup_http_client("test", timeouts).unwrap();
        send_json("test", "Jane", client.get(uri)).await
    }

    #[tokio::test]
    async fn test_send_json_server_error_is_http_status() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let error = fetch(&server.uri(), LookupTimeouts::default())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            LookupError::HttpStatus {
                status: 500,
                retry_after: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_send_json_keeps_retry_after_header() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let error = fetch(&server.uri(), LookupTimeouts::default())
            .await
            .unwrap_err();
        assert_eq!(error.rate_limit_retry_after(), Some("7"));
    }

    #[tokio::test]
    async fn test_send_json_malformed_body() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let error = fetch(&server.uri(), LookupTimeouts::default())
            .await
            .unwrap_err();
        assert!(matches!(error, LookupError::MalformedPayload { .. }));
    }

    #[tokio::test]
    async fn test_send_json_slow_response_times_out() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let timeouts = LookupTimeouts {
            connect_secs: 1,
            read_secs: 1,
        };
        let error = fetch(&server.uri(), timeouts).await.unwrap_err();
        assert!(matches!(error, LookupError::Timeout { .. }), "got {error:?}");
    }
}
