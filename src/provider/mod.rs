//! Gender lookup: remote backends behind a cache and a rate limiter.
//!
//! [`GenderProvider`] is the only entry point the pipeline uses. For each
//! first name it:
//! 1. answers from the [`GenderCache`] when the lower-cased name is known
//! 2. otherwise waits on the [`RateLimiter`] and asks the configured
//!    [`GenderLookup`] backend
//! 3. caches successful answers; failures degrade to `{unknown, 0}` and are
//!    not cached, so the next run retries them
//!
//! A name whose lookup failed is not asked again during the same run, so a
//! bad API key costs one request per distinct name rather than per mention.
//!
//! Backends:
//! - [`NamsorLookup`] (default)
//! - [`GenderizeLookup`]
//! - [`NameApiLookup`]
//! - [`GenderApiLookup`]

mod error;
mod genderapi;
mod genderize;
mod http_client;
mod nameapi;
mod namsor;
pub mod rate_limiter;

pub use error::LookupError;
pub use genderapi::GenderApiLookup;
pub use genderize::GenderizeLookup;
pub use http_client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, LookupTimeouts,
    build_lookup_http_client,
};
pub use nameapi::NameApiLookup;
pub use namsor::NamsorLookup;
pub use rate_limiter::{DEFAULT_REQUEST_DELAY, RateLimiter};

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::GenderCache;
use crate::gender::RawGender;

/// A remote service that guesses gender from a first name.
#[async_trait]
pub trait GenderLookup: Send + Sync {
    /// Short backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Base URL requests go to; keys the rate limiter.
    fn endpoint(&self) -> &str;

    /// Looks up a single first name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] on transport failures, non-success statuses
    /// or unexpected payloads.
    async fn lookup(&self, first_name: &str) -> Result<RawGender, LookupError>;
}

/// Which lookup backend to use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Namsor,
    Genderize,
    #[serde(rename = "nameapi")]
    #[value(name = "nameapi")]
    NameApi,
    #[serde(rename = "genderapi")]
    #[value(name = "genderapi")]
    GenderApi,
}

impl ProviderKind {
    /// Returns the stable lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Namsor => "namsor",
            Self::Genderize => "genderize",
            Self::NameApi => "nameapi",
            Self::GenderApi => "genderapi",
        }
    }

    /// Returns whether the backend refuses to work without an API key.
    #[must_use]
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Genderize)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the lookup backend for `kind`.
///
/// `base_url` overrides the service's public endpoint.
///
/// # Errors
///
/// Returns [`LookupError::MissingApiKey`] when the backend needs a key and
/// none is given, or [`LookupError::ClientBuild`] if the HTTP client fails.
pub fn build_lookup(
    kind: ProviderKind,
    api_key: Option<&str>,
    base_url: Option<&str>,
    timeouts: LookupTimeouts,
) -> Result<Box<dyn GenderLookup>, LookupError> {
    let key = api_key.unwrap_or_default();
    let backend: Box<dyn GenderLookup> = match kind {
        ProviderKind::Namsor => Box::new(NamsorLookup::with_base_url(
            key,
            base_url.unwrap_or(namsor::DEFAULT_BASE_URL),
            timeouts,
        )?),
        ProviderKind::Genderize => Box::new(GenderizeLookup::with_base_url(
            api_key.map(str::to_string),
            base_url.unwrap_or(genderize::DEFAULT_BASE_URL),
            timeouts,
        )?),
        ProviderKind::NameApi => Box::new(NameApiLookup::with_base_url(
            key,
            base_url.unwrap_or(nameapi::DEFAULT_BASE_URL),
            timeouts,
        )?),
        ProviderKind::GenderApi => Box::new(GenderApiLookup::with_base_url(
            key,
            base_url.unwrap_or(genderapi::DEFAULT_BASE_URL),
            timeouts,
        )?),
    };
    debug!(provider = backend.name(), endpoint = backend.endpoint(), "lookup backend ready");
    Ok(backend)
}

/// Counters describing how names were resolved during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Names answered from the cache.
    pub cache_hits: u64,
    /// Remote lookups attempted.
    pub lookups: u64,
    /// Remote lookups that failed and degraded to unknown.
    pub failures: u64,
}

/// Cache-first gender resolution for first names.
pub struct GenderProvider {
    backend: Box<dyn GenderLookup>,
    cache: GenderCache,
    limiter: RateLimiter,
    stats: LookupStats,
    /// Lower-cased names that failed this run. Never persisted.
    failed: HashSet<String>,
}

impl fmt::Debug for GenderProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenderProvider")
            .field("backend", &self.backend.name())
            .field("cache_entries", &self.cache.len())
            .field("stats", &self.stats)
            .field("failed_names", &self.failed.len())
            .finish_non_exhaustive()
    }
}

impl GenderProvider {
    /// Creates a provider over `backend`, answering from `cache` first.
    #[must_use]
    pub fn new(backend: Box<dyn GenderLookup>, cache: GenderCache, limiter: RateLimiter) -> Self {
        Self {
            backend,
            cache,
            limiter,
            stats: LookupStats::default(),
            failed: HashSet::new(),
        }
    }

    /// Returns the raw answer for `first_name`.
    ///
    /// Never fails: lookup errors are logged and reported as
    /// [`RawGender::unknown`]. An empty name, or one that already failed
    /// during this run, returns unknown without a lookup.
    pub async fn classify(&mut self, first_name: &str) -> RawGender {
        let key = first_name.trim().to_lowercase();
        if key.is_empty() {
            return RawGender::unknown();
        }

        if let Some(raw) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            debug!(name = %key, gender = %raw.gender, "cache hit");
            return raw;
        }

        if self.failed.contains(&key) {
            debug!(name = %key, "lookup already failed this run");
            return RawGender::unknown();
        }

        let endpoint = self.backend.endpoint().to_string();
        self.limiter.acquire(&endpoint).await;
        self.stats.lookups += 1;

        match self.backend.lookup(first_name.trim()).await {
            Ok(raw) => {
                debug!(
                    name = %key,
                    gender = %raw.gender,
                    probability = raw.probability,
                    "lookup succeeded"
                );
                self.cache.put(&key, raw);
                raw
            }
            Err(error) => {
                self.stats.failures += 1;
                warn!(name = %key, error = %error, "gender lookup failed; treating as unknown");
                if let Some(delay) = error
                    .rate_limit_retry_after()
                    .and_then(rate_limiter::parse_retry_after)
                {
                    self.limiter.record_rate_limit(&endpoint, delay).await;
                }
                self.failed.insert(key);
                RawGender::unknown()
            }
        }
    }

    /// Returns the cache, including entries added during this run.
    #[must_use]
    pub fn cache(&self) -> &GenderCache {
        &self.cache
    }

    /// Returns resolution counters for this run.
    #[must_use]
    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    /// Returns the backend name.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Consumes the provider, returning its cache for flushing.
    #[must_use]
    pub fn into_cache(self) -> GenderCache {
        self.cache
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::StubLookup;
    use super::*;
    use crate::gender::Gender;

    fn provider_with(stub: StubLookup, cache: GenderCache) -> GenderProvider {
        GenderProvider::new(Box::new(stub), cache, RateLimiter::disabled())
    }

    // ==================== Backend selection ====================

    #[test]
    fn test_provider_kind_default_is_namsor() {
        assert_eq!(ProviderKind::default(), ProviderKind::Namsor);
    }

    #[test]
    fn test_provider_kind_serde_names() {
        let kind: ProviderKind = serde_json::from_str("\"nameapi\"").unwrap();
        assert_eq!(kind, ProviderKind::NameApi);
        assert_eq!(serde_json::to_string(&ProviderKind::Genderize).unwrap(), "\"genderize\"");
    }

    #[test]
    fn test_build_lookup_missing_key_for_namsor() {
        let result = build_lookup(ProviderKind::Namsor, None, None, LookupTimeouts::default());
        assert!(matches!(result, Err(LookupError::MissingApiKey { provider: "namsor" })));
    }

    #[test]
    fn test_build_lookup_genderize_works_without_key() {
        let backend =
            build_lookup(ProviderKind::Genderize, None, None, LookupTimeouts::default()).unwrap();
        assert_eq!(backend.name(), "genderize");
        assert_eq!(backend.endpoint(), "https://api.genderize.io");
    }

    #[test]
    fn test_build_lookup_genderapi_needs_key() {
        let result = build_lookup(ProviderKind::GenderApi, None, None, LookupTimeouts::default());
        assert!(matches!(result, Err(LookupError::MissingApiKey { provider: "genderapi" })));

        let backend =
            build_lookup(ProviderKind::GenderApi, Some("k"), None, LookupTimeouts::default())
                .unwrap();
        assert_eq!(backend.endpoint(), "https://gender-api.com");
        assert_eq!(serde_json::to_string(&ProviderKind::GenderApi).unwrap(), "\"genderapi\"");
    }

    #[test]
    fn test_build_lookup_base_url_override() {
        let backend = build_lookup(
            ProviderKind::NameApi,
            Some("k"),
            Some("http://127.0.0.1:9/"),
            LookupTimeouts::default(),
        )
        .unwrap();
        assert_eq!(backend.endpoint(), "http://127.0.0.1:9");
    }

    // ==================== Cache-first resolution ====================

    #[tokio::test]
    async fn test_classify_cache_hit_makes_no_lookup() {
        let stub = StubLookup::new(&[]);
        let calls = stub.calls();
        let mut cache = GenderCache::in_memory();
        cache.put("anne", RawGender::new(Gender::Female, 0.9));

        let mut provider = provider_with(stub, cache);
        let raw = provider.classify("Anne").await;

        assert_eq!(raw, RawGender::new(Gender::Female, 0.9));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.stats().cache_hits, 1);
    }

    #[tokio::test]
    async fn test_classify_miss_caches_raw_answer_under_lowercase_key() {
        let stub = StubLookup::new(&[("Jordan", RawGender::new(Gender::Male, 0.6))]);
        let calls = stub.calls();
        let mut provider = provider_with(stub, GenderCache::in_memory());

        let first = provider.classify("Jordan").await;
        let second = provider.classify("JORDAN").await;

        assert_eq!(first, RawGender::new(Gender::Male, 0.6));
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.cache().get("jordan"), Some(first));
        assert_eq!(
            provider.stats(),
            LookupStats {
                cache_hits: 1,
                lookups: 1,
                failures: 0
            }
        );
    }

    #[tokio::test]
    async fn test_classify_failure_is_unknown_and_not_cached() {
        let stub = StubLookup::new(&[]);
        let calls = stub.calls();
        let mut provider = provider_with(stub, GenderCache::in_memory());

        assert_eq!(provider.classify("Zed").await, RawGender::unknown());
        assert_eq!(provider.classify("ZED").await, RawGender::unknown());
        assert_eq!(provider.classify("zed").await, RawGender::unknown());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(provider.cache().is_empty());
        assert_eq!(provider.stats().failures, 1);
        assert_eq!(provider.stats().lookups, 1);
    }

    #[tokio::test]
    async fn test_failed_name_is_retried_by_a_fresh_provider() {
        let stub = StubLookup::new(&[]);
        let calls = stub.calls();
        let mut first_run = provider_with(stub.clone(), GenderCache::in_memory());
        first_run.classify("Zed").await;
        let cache = first_run.into_cache();

        let mut second_run = provider_with(stub, cache);
        second_run.classify("Zed").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_name_does_not_wait_on_the_limiter_again() {
        let stub = StubLookup::new(&[]);
        let calls = stub.calls();
        let mut provider = GenderProvider::new(
            Box::new(stub),
            GenderCache::in_memory(),
            RateLimiter::new(std::time::Duration::from_secs(30)),
        );

        provider.classify("Zed").await;
        let repeat = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            provider.classify("Zed"),
        )
        .await;

        assert_eq!(repeat.unwrap(), RawGender::unknown());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classify_empty_name_skips_lookup() {
        let stub = StubLookup::new(&[]);
        let calls = stub.calls();
        let mut provider = provider_with(stub, GenderCache::in_memory());

        assert_eq!(provider.classify("  ").await, RawGender::unknown());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.stats(), LookupStats::default());
    }

    #[tokio::test]
    async fn test_into_cache_returns_new_entries() {
        let stub = StubLookup::new(&[("Maria", RawGender::new(Gender::Female, 0.97))]);
        let mut provider = provider_with(stub, GenderCache::in_memory());
        provider.classify("Maria").await;

        let cache = provider.into_cache();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("maria").unwrap().gender, Gender::Female);
    }
}
