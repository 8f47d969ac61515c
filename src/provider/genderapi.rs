//! Gender-API.com lookup backend.
//!
//! Calls `GET {base}/get?name={firstName}&key={key}`. Accuracy comes back on a
//! 0–100 scale. Quota and key problems are reported in-band with `errno` and
//! `errmsg` on an HTTP 200.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::gender::{Gender, RawGender};

use super::http_client::{LookupTimeouts, build_lookup_http_client, send_json};
use super::{GenderLookup, LookupError};

/// Default Gender-API.com base URL.
pub const DEFAULT_BASE_URL: &str = "https://gender-api.com";

const PROVIDER: &str = "genderapi";

#[derive(Debug, Deserialize)]
pub(crate) struct GenderApiResponse {
    /// `male`, `female` or `unknown`.
    pub gender: Option<String>,
    pub accuracy: Option<f64>,
    pub errno: Option<i64>,
    pub errmsg: Option<String>,
}

impl GenderApiResponse {
    fn into_raw(self, first_name: &str) -> Result<RawGender, LookupError> {
        if let Some(errno) = self.errno.filter(|code| *code != 0) {
            let message = self.errmsg.unwrap_or_default();
            return Err(LookupError::malformed(
                PROVIDER,
                first_name,
                format!("error {errno}: {message}"),
            ));
        }
        Ok(match self.gender.as_deref() {
            Some(label) => RawGender::new(
                Gender::from_label(label),
                self.accuracy.unwrap_or(0.0) / 100.0,
            ),
            None => RawGender::unknown(),
        })
    }
}

/// Gender-API.com client.
pub struct GenderApiLookup {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GenderApiLookup {
    /// Creates a client against the public Gender-API.com service.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the API key is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>, timeouts: LookupTimeouts) -> Result<Self, LookupError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeouts)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the API key is empty or the HTTP client
    /// cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeouts: LookupTimeouts,
    ) -> Result<Self, LookupError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LookupError::MissingApiKey { provider: PROVIDER });
        }
        Ok(Self {
            client: build_lookup_http_client(PROVIDER, timeouts)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl std::fmt::Debug for GenderApiLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenderApiLookup")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GenderLookup for GenderApiLookup {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    #[tracing::instrument(skip(self), fields(provider = PROVIDER))]
    async fn lookup(&self, first_name: &str) -> Result<RawGender, LookupError> {
        let url = format!("{}/get?name={}", self.base_url, urlencoding::encode(first_name));
        debug!(api_url = %url, "calling Gender-API");

        let request = self
            .client
            .get(format!("{url}&key={}", urlencoding::encode(&self.api_key)));
        let body: GenderApiResponse = send_json(PROVIDER, first_name, request).await?;
        body.into_raw(first_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::start_mock_server_or_skip;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn response(value: serde_json::Value) -> GenderApiResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_genderapi_accuracy_is_percent() {
        let raw = response(serde_json::json!({
            "name": "anna", "gender": "female", "samples": 1200, "accuracy": 98
        }))
        .into_raw("anna")
        .unwrap();
        assert_eq!(raw.gender, Gender::Female);
        assert!((raw.probability - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_genderapi_unknown_name() {
        let raw = response(serde_json::json!({
            "name": "xq", "gender": "unknown", "samples": 0, "accuracy": 0
        }))
        .into_raw("xq")
        .unwrap();
        assert_eq!(raw, RawGender::unknown());
    }

    #[test]
    fn test_genderapi_in_band_error_is_a_failure() {
        let error = response(serde_json::json!({
            "errno": 30, "errmsg": "limit reached"
        }))
        .into_raw("anna")
        .unwrap_err();
        assert!(error.to_string().contains("limit reached"));
    }

    #[test]
    fn test_genderapi_requires_api_key() {
        assert!(matches!(
            GenderApiLookup::new(" ", LookupTimeouts::default()),
            Err(LookupError::MissingApiKey { provider: "genderapi" })
        ));
    }

    #[tokio::test]
    async fn test_genderapi_lookup_sends_name_and_key() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("name", "João"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "joão", "gender": "male", "samples": 500, "accuracy": 99
            })))
            .expect(1)
            .mount(&server)
            .await;

        let lookup =
            GenderApiLookup::with_base_url("secret", server.uri(), LookupTimeouts::default())
                .unwrap();
        let raw = lookup.lookup("João").await.unwrap();
        assert_eq!(raw.gender, Gender::Male);
        assert!((raw.probability - 0.99).abs() < 1e-9);
    }
}
