//! Error types for gender lookup backends.
//!
//! These errors never escape [`GenderProvider::classify`](super::GenderProvider::classify):
//! every failure degrades to an `{unknown, 0}` answer there. They exist so the
//! backends can report precisely what went wrong, and so rate-limit responses
//! can feed back into the limiter.

use thiserror::Error;

/// Errors that can occur during a single gender lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("{provider}: network error looking up '{name}': {source}")]
    Network {
        /// Backend name.
        provider: &'static str,
        /// First name being looked up.
        name: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("{provider}: timeout looking up '{name}'")]
    Timeout {
        /// Backend name.
        provider: &'static str,
        /// First name being looked up.
        name: String,
    },

    /// Non-success HTTP response.
    #[error("{provider}: HTTP {status} looking up '{name}'")]
    HttpStatus {
        /// Backend name.
        provider: &'static str,
        /// First name being looked up.
        name: String,
        /// HTTP status code.
        status: u16,
        /// Raw Retry-After header value, if present.
        retry_after: Option<String>,
    },

    /// Response body did not have the expected shape.
    #[error("{provider}: unexpected response for '{name}': {reason}")]
    MalformedPayload {
        /// Backend name.
        provider: &'static str,
        /// First name being looked up.
        name: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// The backend needs an API key and none was configured.
    #[error(
        "{provider}: API key required\n  Suggestion: pass --api-key, set AUTHOR_GENDER_API_KEY, or add api_key to the config file"
    )]
    MissingApiKey {
        /// Backend name.
        provider: &'static str,
    },

    /// The HTTP client could not be constructed.
    #[error("{provider}: HTTP client construction failed: {source}")]
    ClientBuild {
        /// Backend name.
        provider: &'static str,
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl LookupError {
    /// Classifies a reqwest send/receive error as a timeout or network error.
    pub fn transport(provider: &'static str, name: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                provider,
                name: name.into(),
            }
        } else {
            Self::Network {
                provider,
                name: name.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(
        provider: &'static str,
        name: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            provider,
            name: name.into(),
            status,
            retry_after,
        }
    }

    /// Creates a malformed payload error.
    pub fn malformed(provider: &'static str, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            provider,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the Retry-After value when the backend answered 429.
    #[must_use]
    pub fn rate_limit_retry_after(&self) -> Option<&str> {
        match self {
            Self::HttpStatus {
                status: 429,
                retry_after: Some(value),
                ..
            } => Some(value),
            _ => None,
        }
    }
}
