//! Gender labels and raw provider answers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gender label used throughout the pipeline.
///
/// Providers answer with free-form labels (`"female"`, `"MALE"`, `"neutral"`,
/// `null`, ...). Anything other than male or female maps to [`Gender::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Maps a provider label to a gender, case-insensitively.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            _ => Self::Unknown,
        }
    }

    /// Returns the stable lower-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for Gender {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider's answer before confidence gating.
///
/// This is what the cache stores, so changing the confidence threshold later
/// never requires new lookups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRawGender")]
pub struct RawGender {
    pub gender: Gender,
    pub probability: f64,
}

/// Wire shape of [`RawGender`]; decoding goes through [`RawGender::new`] so
/// cache files cannot smuggle in out-of-range probabilities.
#[derive(Deserialize)]
struct StoredRawGender {
    gender: Gender,
    #[serde(default)]
    probability: f64,
}

impl From<StoredRawGender> for RawGender {
    fn from(stored: StoredRawGender) -> Self {
        Self::new(stored.gender, stored.probability)
    }
}

impl RawGender {
    /// Creates a raw result, clamping the probability into `[0, 1]`.
    ///
    /// Non-finite probabilities become `0`.
    #[must_use]
    pub fn new(gender: Gender, probability: f64) -> Self {
        let probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            gender,
            probability,
        }
    }

    /// The degraded answer used when a lookup fails: `{unknown, 0}`.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            gender: Gender::Unknown,
            probability: 0.0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_from_label_is_case_insensitive() {
        assert_eq!(Gender::from_label("FEMALE"), Gender::Female);
        assert_eq!(Gender::from_label(" Male "), Gender::Male);
        assert_eq!(Gender::from_label("neutral"), Gender::Unknown);
        assert_eq!(Gender::from_label(""), Gender::Unknown);
    }

    #[test]
    fn test_gender_serde_lowercase_and_lenient() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        let parsed: Gender = serde_json::from_str("\"undefined\"").unwrap();
        assert_eq!(parsed, Gender::Unknown);
        let parsed: Gender = serde_json::from_str("\"Male\"").unwrap();
        assert_eq!(parsed, Gender::Male);
    }

    #[test]
    fn test_raw_gender_clamps_probability() {
        assert_eq!(RawGender::new(Gender::Male, 1.7).probability, 1.0);
        assert_eq!(RawGender::new(Gender::Male, -0.2).probability, 0.0);
        assert_eq!(RawGender::new(Gender::Male, f64::NAN).probability, 0.0);
        assert_eq!(RawGender::new(Gender::Female, 0.42).probability, 0.42);
    }

    #[test]
    fn test_raw_gender_deserializes_original_cache_entry() {
        let raw: RawGender =
            serde_json::from_str(r#"{"gender": "female", "probability": 0.9}"#).unwrap();
        assert_eq!(raw, RawGender::new(Gender::Female, 0.9));
    }

    #[test]
    fn test_raw_gender_deserialize_clamps_probability() {
        let raw: RawGender =
            serde_json::from_str(r#"{"gender": "male", "probability": 90}"#).unwrap();
        assert_eq!(raw, RawGender::new(Gender::Male, 1.0));
        let raw: RawGender = serde_json::from_str(r#"{"gender": "female"}"#).unwrap();
        assert_eq!(raw.probability, 0.0);
    }
}
