//! Shared User-Agent string for lookup backends.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/author-gender";

/// User-Agent sent with every lookup request (no per-backend name in header).
#[must_use]
pub(crate) fn default_lookup_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("author-gender/{version} (research-tool; +{PROJECT_UA_URL})")
}
