//! Author-name normalization.
//!
//! Bibliographic exports list authors as either `"Family, Given"` or
//! `"Given Family"`, joined by `;`. This module reduces one such entry to the
//! canonical first name that is sent to a gender lookup backend.

pub mod frequency;

pub use frequency::{NameFrequency, count_first_names};

/// Separator between authors in an author field.
pub const AUTHOR_SEPARATOR: char = ';';

/// Extracts the canonical first name from a raw author-name string.
///
/// Rules:
/// 1. Everything from the first `(` onward is discarded and the rest trimmed
/// 2. `"Family, Given…"`: first whitespace token after the first comma
/// 3. `"Given… Family"`: first whitespace token
/// 4. Only the segment before the first `-` is kept (`Anne-Marie` → `Anne`)
///
/// Never fails. An empty string means no usable first name was found and the
/// caller must skip the author.
///
/// # Examples
///
/// ```
/// use author_gender::names::extract_first_name;
///
/// assert_eq!(extract_first_name("Smith, Anne-Marie"), "Anne");
/// assert_eq!(extract_first_name("Anne Marie Smith"), "Anne");
/// assert_eq!(extract_first_name("O'Brien, Seán (2019)"), "Seán");
/// assert_eq!(extract_first_name("   "), "");
/// ```
#[must_use]
pub fn extract_first_name(raw: &str) -> String {
    let name = raw.split('(').next().unwrap_or_default().trim();

    let token = match name.split_once(',') {
        Some((_family, given)) => given.split_whitespace().next(),
        None => name.split_whitespace().next(),
    };

    token
        .and_then(|t| t.split('-').next())
        .unwrap_or_default()
        .to_string()
}

/// Splits an author field on `;`, trimming entries and dropping empty ones.
///
/// Order is preserved: index 0 is the first listed author.
#[must_use]
pub fn split_authors(field: &str) -> Vec<&str> {
    field
        .split(AUTHOR_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}
