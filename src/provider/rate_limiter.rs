//! Minimum spacing between outbound lookup requests.
//!
//! Gender lookup services throttle clients aggressively, so consecutive
//! requests to the same host are spaced by at least a fixed delay. The limiter
//! is only consulted on cache misses: cached names never wait.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use author_gender::provider::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_secs(1));
//!
//! // First request proceeds immediately
//! limiter.acquire("https://api.genderize.io/?name=anne").await;
//!
//! // Second request to the same host waits for the delay
//! limiter.acquire("https://api.genderize.io/?name=john").await;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Default delay between consecutive lookups (one second).
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1000);

/// Warning threshold for cumulative delay per host.
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// Maximum Retry-After value honoured (1 hour).
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Per-host request spacing.
///
/// Processing is sequential today, but the limiter is `Send + Sync` so a
/// parallel lookup stage can share it behind an `Arc` without changes.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    disabled: bool,
    /// Cloned out of the map before awaiting so no shard lock is held across `.await`.
    hosts: DashMap<String, Arc<HostState>>,
}

#[derive(Debug)]
struct HostState {
    /// Earliest instant the next request may start. `None` until the first request.
    next_allowed: Mutex<Option<Instant>>,
    cumulative_delay_ms: AtomicU64,
}

impl HostState {
    fn new() -> Self {
        Self {
            next_allowed: Mutex::new(None),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

impl RateLimiter {
    /// Creates a limiter spacing requests to the same host by `delay`.
    ///
    /// A zero delay yields a disabled limiter.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        if delay.is_zero() {
            return Self::disabled();
        }
        debug!(delay_ms = delay.as_millis(), "creating rate limiter");
        Self {
            delay,
            disabled: false,
            hosts: DashMap::new(),
        }
    }

    /// Creates a limiter that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            delay: Duration::ZERO,
            disabled: true,
            hosts: DashMap::new(),
        }
    }

    /// Returns whether rate limiting is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the configured spacing between requests.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn state_for(&self, host: &str) -> Arc<HostState> {
        self.hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(HostState::new()))
            .clone()
    }

    /// Waits until a request to `url`'s host is allowed, then reserves the slot.
    ///
    /// The first request to a host proceeds immediately.
    #[instrument(skip(self), fields(host))]
    pub async fn acquire(&self, url: &str) {
        if self.disabled {
            return;
        }

        let host = extract_host(url);
        tracing::Span::current().record("host", &host);
        let state = self.state_for(&host);
        let mut next_allowed = state.next_allowed.lock().await;

        if let Some(at) = *next_allowed {
            let now = Instant::now();
            if at > now {
                let wait = at - now;
                let cumulative = state.add_cumulative_delay(wait);
                debug!(
                    wait_ms = wait.as_millis(),
                    cumulative_ms = cumulative.as_millis(),
                    "spacing lookup request"
                );
                if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                    warn!(
                        host = %host,
                        cumulative_delay_secs = cumulative.as_secs(),
                        "lookups are spending a long time rate limited"
                    );
                }
                tokio::time::sleep_until(at).await;
            }
        } else {
            debug!(host = %host, "first lookup to host - no delay");
        }

        *next_allowed = Some(Instant::now() + self.delay);
    }

    /// Pushes the next allowed request to `url`'s host at least `delay` into
    /// the future, as demanded by a server's `Retry-After`.
    ///
    /// Also tracked on a disabled limiter, which still never waits.
    #[instrument(skip(self), fields(host))]
    pub async fn record_rate_limit(&self, url: &str, delay: Duration) {
        let host = extract_host(url);
        tracing::Span::current().record("host", &host);
        let state = self.state_for(&host);
        let mut next_allowed = state.next_allowed.lock().await;

        let until = Instant::now() + delay.min(MAX_RETRY_AFTER);
        if next_allowed.is_none_or(|at| at < until) {
            *next_allowed = Some(until);
        }
        let cumulative = state.add_cumulative_delay(delay);
        warn!(
            host = %host,
            delay_secs = delay.as_secs(),
            cumulative_secs = cumulative.as_secs(),
            "lookup service rate limited us; backing off"
        );
    }
}

/// Extracts the lower-cased host from a URL, or `"unknown"` when unparsable.
///
/// # Examples
///
/// ```
/// use author_gender::provider::rate_limiter::extract_host;
///
/// assert_eq!(extract_host("https://API.Genderize.io/?name=x"), "api.genderize.io");
/// assert_eq!(extract_host("not a url"), "unknown");
/// ```
#[must_use]
pub fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Parses a Retry-After header value into a Duration.
///
/// Accepts integer seconds or an HTTP-date (RFC 7231). Past dates yield zero;
/// values beyond one hour are capped. Returns `None` when unparsable.
///
/// ```
/// use std::time::Duration;
/// use author_gender::provider::rate_limiter::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("soon"), None);
/// ```
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<u64>() {
        return Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER));
    }

    let at = httpdate::parse_http_date(header_value).ok()?;
    let wait = at
        .duration_since(std::time::SystemTime::now())
        .unwrap_or(Duration::ZERO);
    Some(wait.min(MAX_RETRY_AFTER))
}
