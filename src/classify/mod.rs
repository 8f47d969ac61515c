//! Per-author gender decisions with confidence gating.
//!
//! [`AuthorClassifier`] ties name normalization, the cache-first
//! [`GenderProvider`] and the confidence threshold together. The provider
//! always returns (and caches) the raw answer; gating happens only here, so a
//! different threshold never requires new lookups.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use crate::gender::{Gender, RawGender};

use crate::names::{extract_first_name, split_authors};
use crate::provider::GenderProvider;

/// Default minimum probability for a provider answer to count.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Error returned when a confidence threshold lies outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("confidence threshold must be between 0 and 1, got {0}")]
pub struct InvalidThreshold(pub f64);

/// Validates a confidence threshold.
///
/// # Errors
///
/// Returns [`InvalidThreshold`] for values outside `[0, 1]` or NaN.
pub fn validate_threshold(threshold: f64) -> Result<f64, InvalidThreshold> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(InvalidThreshold(threshold))
    }
}

/// One author after classification.
///
/// `gender` is already gated: it is [`Gender::Unknown`] whenever `reliable`
/// is false. `probability` is always the provider's raw value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedAuthor {
    pub full_name: String,
    pub first_name: String,
    pub gender: Gender,
    pub probability: f64,
    pub reliable: bool,
}

impl ClassifiedAuthor {
    /// Applies `threshold` to a raw answer.
    #[must_use]
    pub fn from_raw(full_name: &str, first_name: String, raw: RawGender, threshold: f64) -> Self {
        let reliable = raw.probability >= threshold;
        Self {
            full_name: full_name.trim().to_string(),
            first_name,
            gender: if reliable { raw.gender } else { Gender::Unknown },
            probability: raw.probability,
            reliable,
        }
    }

    /// Gender to count: the label when reliable, unknown otherwise.
    #[must_use]
    pub fn effective_gender(&self) -> Gender {
        if self.reliable {
            self.gender
        } else {
            Gender::Unknown
        }
    }
}

/// Classifies raw author names through a [`GenderProvider`].
#[derive(Debug)]
pub struct AuthorClassifier<'p> {
    provider: &'p mut GenderProvider,
    threshold: f64,
}

impl<'p> AuthorClassifier<'p> {
    /// Creates a classifier gating at `threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidThreshold`] when `threshold` is outside `[0, 1]`.
    pub fn new(provider: &'p mut GenderProvider, threshold: f64) -> Result<Self, InvalidThreshold> {
        Ok(Self {
            provider,
            threshold: validate_threshold(threshold)?,
        })
    }

    /// Returns the confidence threshold in use.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classifies one raw author name.
    ///
    /// Returns `None` when no first name can be extracted; such authors are
    /// excluded from all counts.
    pub async fn classify(&mut self, raw_author: &str) -> Option<ClassifiedAuthor> {
        let first_name = extract_first_name(raw_author);
        if first_name.is_empty() {
            debug!(author = raw_author, "no first name; skipping author");
            return None;
        }

        let raw = self.provider.classify(&first_name).await;
        Some(ClassifiedAuthor::from_raw(
            raw_author,
            first_name,
            raw,
            self.threshold,
        ))
    }

    /// Classifies every author of a `;`-joined author field, in listed order.
    pub async fn classify_all(&mut self, author_field: &str) -> Vec<ClassifiedAuthor> {
        let mut authors = Vec::new();
        for raw_author in split_authors(author_field) {
            if let Some(author) = self.classify(raw_author).await {
                authors.push(author);
            }
        }
        authors
    }
}
