//! Genderize.io lookup backend.
//!
//! Calls `GET {base}/?name={firstName}[&apikey={key}]`. The API key is
//! optional; without one the free daily quota applies.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::gender::{Gender, RawGender};

use super::http_client::{LookupTimeouts, build_lookup_http_client, send_json};
use super::{GenderLookup, LookupError};

/// Default Genderize.io base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.genderize.io";

const PROVIDER: &str = "genderize";

/// Response of the Genderize.io endpoint. `gender` is `null` for unseen names.
#[derive(Debug, Deserialize)]
pub(crate) struct GenderizeResponse {
    pub gender: Option<String>,
    pub probability: Option<f64>,
    #[allow(dead_code)] // Deserialized for Debug output; useful when auditing low-evidence names
    pub count: Option<u64>,
}

impl GenderizeResponse {
    fn into_raw(self) -> RawGender {
        match self.gender.as_deref() {
            Some(label) => RawGender::new(Gender::from_label(label), self.probability.unwrap_or(0.0)),
            None => RawGender::unknown(),
        }
    }
}

/// Genderize.io client.
pub struct GenderizeLookup {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GenderizeLookup {
    /// Creates a client against the public Genderize.io API.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the HTTP client cannot be built.
    pub fn new(api_key: Option<String>, timeouts: LookupTimeouts) -> Result<Self, LookupError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeouts)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeouts: LookupTimeouts,
    ) -> Result<Self, LookupError> {
        Ok(Self {
            client: build_lookup_http_client(PROVIDER, timeouts)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

impl std::fmt::Debug for GenderizeLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenderizeLookup")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GenderLookup for GenderizeLookup {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    #[tracing::instrument(skip(self), fields(provider = PROVIDER))]
    async fn lookup(&self, first_name: &str) -> Result<RawGender, LookupError> {
        let mut url = format!("{}/?name={}", self.base_url, urlencoding::encode(first_name));
        debug!(api_url = %url, "calling Genderize");
        if let Some(key) = &self.api_key {
            url.push_str("&apikey=");
            url.push_str(&urlencoding::encode(key));
        }

        let body: GenderizeResponse =
            send_json(PROVIDER, first_name, self.client.get(&url)).await?;
        Ok(body.into_raw())
    }
}
