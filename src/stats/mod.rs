//! Per-article aggregation and the accumulating gender tally.

pub mod report;

pub use report::{ReportBuilder, ReportRow, TOTAL_KEY, percentage};

use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::classify::{ClassifiedAuthor, Gender};

/// Counts and positional flags for a single article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArticleStats {
    pub male_count: u64,
    pub female_count: u64,
    pub unknown_count: u64,
    pub first_author_female: bool,
    pub last_author_female: bool,
    pub has_female: bool,
    pub total_authors: u64,
}

/// Reduces an article's classified authors, in listed order, to counts.
///
/// Index 0 is the first author and the final index the last author; for a
/// single author both flags derive from that author. Only reliable labels
/// count.
///
/// # Examples
///
/// ```
/// use author_gender::classify::{ClassifiedAuthor, Gender};
/// use author_gender::stats::aggregate;
///
/// let jane = ClassifiedAuthor {
///     full_name: "Doe, Jane".into(),
///     first_name: "Jane".into(),
///     gender: Gender::Female,
///     probability: 0.95,
///     reliable: true,
/// };
/// let stats = aggregate(&[jane]);
/// assert!(stats.first_author_female && stats.last_author_female);
/// assert_eq!(stats.total_authors, 1);
/// ```
#[must_use]
pub fn aggregate(authors: &[ClassifiedAuthor]) -> ArticleStats {
    let mut stats = ArticleStats::default();
    let last = authors.len().saturating_sub(1);

    for (index, author) in authors.iter().enumerate() {
        match author.effective_gender() {
            Gender::Male => stats.male_count += 1,
            Gender::Female => {
                stats.female_count += 1;
                stats.has_female = true;
                if index == 0 {
                    stats.first_author_female = true;
                }
                if index == last {
                    stats.last_author_female = true;
                }
            }
            Gender::Unknown => stats.unknown_count += 1,
        }
    }
    stats.total_authors = authors.len() as u64;
    stats
}

/// Accumulated counts for a year bucket or the grand total.
///
/// A monoid: [`Default`] is the identity and `+` adds field-wise, so the
/// total over any partition of articles equals the sum of the parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderTally {
    pub male_count: u64,
    pub female_count: u64,
    pub unknown_count: u64,
    pub articles_with_female: u64,
    pub articles_first_female: u64,
    pub articles_last_female: u64,
    pub total_articles: u64,
    pub total_authors: u64,
}

impl GenderTally {
    /// Folds one article into the tally.
    pub fn add_article(&mut self, article: &ArticleStats) {
        *self += Self::from(article);
    }

    /// Field-wise sum of two tallies.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            male_count: self.male_count + other.male_count,
            female_count: self.female_count + other.female_count,
            unknown_count: self.unknown_count + other.unknown_count,
            articles_with_female: self.articles_with_female + other.articles_with_female,
            articles_first_female: self.articles_first_female + other.articles_first_female,
            articles_last_female: self.articles_last_female + other.articles_last_female,
            total_articles: self.total_articles + other.total_articles,
            total_authors: self.total_authors + other.total_authors,
        }
    }
}

impl From<&ArticleStats> for GenderTally {
    fn from(article: &ArticleStats) -> Self {
        Self {
            male_count: article.male_count,
            female_count: article.female_count,
            unknown_count: article.unknown_count,
            articles_with_female: u64::from(article.has_female),
            articles_first_female: u64::from(article.first_author_female),
            articles_last_female: u64::from(article.last_author_female),
            total_articles: 1,
            total_authors: article.total_authors,
        }
    }
}

impl Add for GenderTally {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.merge(other)
    }
}

impl AddAssign for GenderTally {
    fn add_assign(&mut self, other: Self) {
        *self = self.merge(other);
    }
}

impl std::iter::Sum for GenderTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(gender: Gender, probability: f64, reliable: bool) -> ClassifiedAuthor {
        ClassifiedAuthor {
            full_name: "Test, Author".to_string(),
            first_name: "Author".to_string(),
            gender,
            probability,
            reliable,
        }
    }

    #[test]
    fn test_aggregate_empty_is_all_zero() {
        assert_eq!(aggregate(&[]), ArticleStats::default());
    }

    #[test]
    fn test_aggregate_single_author_flags_agree() {
        let female = aggregate(&[author(Gender::Female, 0.9, true)]);
        assert!(female.first_author_female);
        assert!(female.last_author_female);
        assert!(female.has_female);

        let male = aggregate(&[author(Gender::Male, 0.9, true)]);
        assert!(!male.first_author_female);
        assert!(!male.last_author_female);
        assert!(!male.has_female);
    }

    #[test]
    fn test_aggregate_positions_and_counts() {
        let stats = aggregate(&[
            author(Gender::Female, 0.95, true),
            author(Gender::Unknown, 0.3, false),
            author(Gender::Male, 0.9, true),
        ]);
        assert_eq!(
            stats,
            ArticleStats {
                male_count: 1,
                female_count: 1,
                unknown_count: 1,
                first_author_female: true,
                last_author_female: false,
                has_female: true,
                total_authors: 3,
            }
        );
    }

    #[test]
    fn test_aggregate_rechecks_unreliable_labels() {
        let stats = aggregate(&[author(Gender::Female, 0.4, false)]);
        assert_eq!(stats.female_count, 0);
        assert_eq!(stats.unknown_count, 1);
        assert!(!stats.has_female);
    }

    #[test]
    fn test_tally_from_article() {
        let tally = GenderTally::from(&ArticleStats {
            male_count: 2,
            female_count: 1,
            unknown_count: 0,
            first_author_female: false,
            last_author_female: true,
            has_female: true,
            total_authors: 3,
        });
        assert_eq!(tally.articles_with_female, 1);
        assert_eq!(tally.articles_first_female, 0);
        assert_eq!(tally.articles_last_female, 1);
        assert_eq!(tally.total_articles, 1);
        assert_eq!(tally.total_authors, 3);
    }

    #[test]
    fn test_tally_monoid_identity_and_partition() {
        let articles = [
            aggregate(&[author(Gender::Female, 0.9, true)]),
            aggregate(&[author(Gender::Male, 0.9, true), author(Gender::Female, 0.8, true)]),
            aggregate(&[]),
            aggregate(&[author(Gender::Unknown, 0.0, false)]),
        ];
        let tallies: Vec<GenderTally> = articles.iter().map(GenderTally::from).collect();

        let whole: GenderTally = tallies.iter().copied().sum();
        let left: GenderTally = tallies[..1].iter().copied().sum();
        let right: GenderTally = tallies[1..].iter().copied().sum();

        assert_eq!(left + right, whole);
        assert_eq!(whole + GenderTally::default(), whole);
        assert_eq!(whole.total_articles, 4);
        assert_eq!(whole.total_authors, 4);
        assert_eq!(whole.female_count, 2);
    }
}
