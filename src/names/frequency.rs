//! First-name repetition statistics for an input export.
//!
//! Names are counted case-insensitively, the same way the gender cache keys
//! them, so `unique_names` is the number of lookups a cold run performs and
//! `repeated_occurrences` the number the cache answers.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::records::RowOutcome;

use super::{extract_first_name, split_authors};

/// Summary of first-name repetition across all authors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NameFrequency {
    /// Authors with a usable first name.
    pub total_names: u64,
    /// Distinct first names.
    pub unique_names: u64,
    /// Occurrences beyond the first, summed over repeated names.
    pub repeated_occurrences: u64,
    /// `repeated_occurrences` as a percentage of `total_names`.
    pub repetition_pct: f64,
    /// Most frequent repeated names, descending by count then by name.
    pub most_repeated: Vec<(String, u64)>,
}

impl fmt::Display for NameFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total names found: {}", self.total_names)?;
        writeln!(f, "Unique first names: {}", self.unique_names)?;
        writeln!(f, "Repeated first-name occurrences: {}", self.repeated_occurrences)?;
        write!(f, "Repetition percentage: {:.2}%", self.repetition_pct)
    }
}

/// Number of entries kept in [`NameFrequency::most_repeated`].
const MOST_REPEATED_LIMIT: usize = 10;

/// Counts first names over every record's authors.
///
/// Skipped rows and authors without a first name are ignored.
#[allow(clippy::cast_precision_loss)]
pub fn count_first_names<I>(rows: I) -> NameFrequency
where
    I: IntoIterator<Item = RowOutcome>,
{
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut total_names = 0_u64;

    for row in rows {
        let RowOutcome::Record(record) = row else {
            continue;
        };
        for raw_author in split_authors(&record.authors) {
            let first_name = extract_first_name(raw_author);
            if first_name.is_empty() {
                continue;
            }
            *counts.entry(first_name.to_lowercase()).or_default() += 1;
            total_names += 1;
        }
    }

    let mut most_repeated: Vec<(String, u64)> = counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(name, count)| (name.clone(), *count))
        .collect();
    let repeated_occurrences = most_repeated.iter().map(|(_, count)| count - 1).sum::<u64>();
    most_repeated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    most_repeated.truncate(MOST_REPEATED_LIMIT);

    let repetition_pct = if total_names == 0 {
        0.0
    } else {
        repeated_occurrences as f64 / total_names as f64 * 100.0
    };

    NameFrequency {
        total_names,
        unique_names: counts.len() as u64,
        repeated_occurrences,
        repetition_pct,
        most_repeated,
    }
}
