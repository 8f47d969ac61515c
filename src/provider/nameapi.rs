//! NameAPI person-genderizer backend.
//!
//! Posts a `NaturalInputPerson` with a single FIRSTNAME field. NameAPI
//! reports confidence on a 0–100 scale, normalized here to `[0, 1]`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::gender::{Gender, RawGender};

use super::http_client::{LookupTimeouts, build_lookup_http_client, send_json};
use super::{GenderLookup, LookupError};

/// Default NameAPI base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.nameapi.org";

const PROVIDER: &str = "nameapi";
const GENDERIZER_PATH: &str = "/rest/v5.3/genderizer/persongenderizer";

/// Response of the person genderizer. `gender` is e.g. `MALE`, `FEMALE`,
/// `NEUTRAL` or `UNKNOWN`.
#[derive(Debug, Deserialize)]
pub(crate) struct NameApiResponse {
    pub gender: Option<String>,
    pub confidence: Option<f64>,
}

impl NameApiResponse {
    fn into_raw(self) -> RawGender {
        match (self.gender.as_deref(), self.confidence) {
            (Some(label), Some(confidence)) => {
                RawGender::new(Gender::from_label(label), normalize_confidence(confidence))
            }
            _ => RawGender::unknown(),
        }
    }
}

/// Converts NameAPI's 0–100 confidence to a probability.
///
/// Clamping happens in [`RawGender::new`].
fn normalize_confidence(confidence: f64) -> f64 {
    confidence / 100.0
}

fn request_body(first_name: &str) -> serde_json::Value {
    serde_json::json!({
        "inputPerson": {
            "type": "NaturalInputPerson",
            "personName": {
                "nameFields": [
                    { "string": first_name, "fieldType": "FIRSTNAME" }
                ]
            }
        }
    })
}

/// NameAPI client.
pub struct NameApiLookup {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NameApiLookup {
    /// Creates a client against the public NameAPI service.
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

impl std::fmt::Debug for NameApiLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameApiLookup")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GenderLookup for NameApiLookup {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    #[tracing::instrument(skip(self), fields(provider = PROVIDER))]
    async fn lookup(&self, first_name: &str) -> Result<RawGender, LookupError> {
        let url = format!("{}{GENDERIZER_PATH}", self.base_url);
        debug!(api_url = %url, "calling NameAPI");

        let request = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&request_body(first_name));
        let body: NameApiResponse = send_json(PROVIDER, first_name, request).await?;
        Ok(body.into_raw())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::start_mock_server_or_skip;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn test_normalize_confidence_percent_scale() {
        assert!((normalize_confidence(90.0) - 0.9).abs() < f64::EPSILON);
        assert!((normalize_confidence(1.0) - 0.01).abs() < f64::EPSILON);
        assert!(normalize_confidence(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_nameapi_response_low_confidence_stays_low() {
        let body: NameApiResponse = serde_json::from_value(serde_json::json!({
            "gender": "MALE", "confidence": 1
        }))
        .unwrap();
        let raw = body.into_raw();
        assert_eq!(raw.gender, Gender::Male);
        assert!((raw.probability - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_nameapi_response_out_of_range_confidence_is_clamped() {
        let body: NameApiResponse = serde_json::from_value(serde_json::json!({
            "gender": "FEMALE", "confidence": 140
        }))
        .unwrap();
        assert!((body.into_raw().probability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_nameapi_response_uppercase_label() {
        let body: NameApiResponse = serde_json::from_value(serde_json::json!({
            "gender": "FEMALE", "confidence": 95.0
        }))
        .unwrap();
        let raw = body.into_raw();
        assert_eq!(raw.gender, Gender::Female);
        assert!((raw.probability - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_nameapi_response_without_confidence_is_unknown() {
        let body: NameApiResponse =
            serde_json::from_value(serde_json::json!({ "gender": "MALE" })).unwrap();
        assert_eq!(body.into_raw(), RawGender::unknown());
    }

    #[test]
    fn test_nameapi_requires_api_key() {
        assert!(matches!(
            NameApiLookup::new("", LookupTimeouts::default()),
            Err(LookupError::MissingApiKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_nameapi_lookup_posts_first_name_field() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(path(GENDERIZER_PATH))
            .and(header("Api-Key", "abc"))
            .and(body_partial_json(serde_json::json!({
                "inputPerson": {
                    "personName": {
                        "nameFields": [{ "string": "Kim", "fieldType": "FIRSTNAME" }]
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "gender": "NEUTRAL", "confidence": 30
            })))
            .expect(1)
            .mount(&server)
            .await;

        let lookup =
            NameApiLookup::with_base_url("abc", server.uri(), LookupTimeouts::default()).unwrap();
        let raw = lookup.lookup("Kim").await.unwrap();
        assert_eq!(raw.gender, Gender::Unknown);
        assert!((raw.probability - 0.3).abs() < 1e-9);
    }
}
