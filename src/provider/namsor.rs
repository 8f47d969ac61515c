//! NamSor gender lookup backend.
//!
//! Calls `GET {base}/api2/json/gender/{firstName}` with the `X-API-KEY`
//! header and reads `likelyGender` / `probabilityCalibrated`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::gender::{Gender, RawGender};

use super::http_client::{LookupTimeouts, build_lookup_http_client, send_json};
use super::{GenderLookup, LookupError};

/// Default NamSor API base URL.
pub const DEFAULT_BASE_URL: &str = "https://v2.namsor.com/NamSorAPIv2";

const PROVIDER: &str = "namsor";

/// Response of the NamSor first-name gender endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NamsorResponse {
    pub likely_gender: Option<String>,
    pub probability_calibrated: Option<f64>,
}

impl NamsorResponse {
    fn into_raw(self) -> RawGender {
        RawGender::new(
            self.likely_gender
                .as_deref()
                .map_or(Gender::Unknown, Gender::from_label),
            self.probability_calibrated.unwrap_or(0.0),
        )
    }
}

/// NamSor v2 client.
pub struct NamsorLookup {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NamsorLookup {
    /// Creates a client against the public NamSor API.
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

impl std::fmt::Debug for NamsorLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamsorLookup")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GenderLookup for NamsorLookup {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    #[tracing::instrument(skip(self), fields(provider = PROVIDER))]
    async fn lookup(&self, first_name: &str) -> Result<RawGender, LookupError> {
        let url = format!(
            "{}/api2/json/gender/{}",
            self.base_url,
            urlencoding::encode(first_name)
        );
        debug!(api_url = %url, "calling NamSor");

        let request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-API-KEY", &self.api_key);
        let body: NamsorResponse = send_json(PROVIDER, first_name, request).await?;
        Ok(body.into_raw())
    }
}
