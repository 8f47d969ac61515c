//! Per-year and grand-total accumulation, rendered as report rows.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ArticleStats, GenderTally};

/// Year key of the grand-total row.
pub const TOTAL_KEY: &str = "TOTAL";

/// `part` as a percentage of `whole`, rounded to two decimals.
///
/// A zero `whole` yields exactly `0.0`.
///
/// # Examples
///
/// ```
/// use author_gender::stats::percentage;
///
/// assert_eq!(percentage(1, 3), 33.33);
/// assert_eq!(percentage(5, 0), 0.0);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 100.0 / whole as f64 * 100.0).round() / 100.0
}

/// One line of the report table, using the report's column headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Male Authors")]
    pub male_count: u64,
    #[serde(rename = "Percentage Male Authors")]
    pub pct_male: f64,
    #[serde(rename = "Female Authors")]
    pub female_count: u64,
    #[serde(rename = "Percentage Female Authors")]
    pub pct_female: f64,
    #[serde(rename = "Unknown Gender Authors")]
    pub unknown_count: u64,
    #[serde(rename = "Percentage Unknown Gender Authors")]
    pub pct_unknown: f64,
    #[serde(rename = "Articles with at least one woman")]
    pub articles_with_female: u64,
    #[serde(rename = "Percentage Articles with at least one woman")]
    pub pct_articles_with_female: f64,
    #[serde(rename = "Articles with female first author")]
    pub articles_first_female: u64,
    #[serde(rename = "Percentage Articles with female first author")]
    pub pct_articles_first_female: f64,
    #[serde(rename = "Articles with female last author")]
    pub articles_last_female: u64,
    #[serde(rename = "Percentage Articles with female last author")]
    pub pct_articles_last_female: f64,
    #[serde(rename = "Total Articles")]
    pub total_articles: u64,
    #[serde(rename = "Total Authors")]
    pub total_authors: u64,
}

impl ReportRow {
    /// Renders a tally, deriving every percentage from its counts.
    #[must_use]
    pub fn from_tally(year: impl Into<String>, tally: &GenderTally) -> Self {
        Self {
            year: year.into(),
            male_count: tally.male_count,
            pct_male: percentage(tally.male_count, tally.total_authors),
            female_count: tally.female_count,
            pct_female: percentage(tally.female_count, tally.total_authors),
            unknown_count: tally.unknown_count,
            pct_unknown: percentage(tally.unknown_count, tally.total_authors),
            articles_with_female: tally.articles_with_female,
            pct_articles_with_female: percentage(tally.articles_with_female, tally.total_articles),
            articles_first_female: tally.articles_first_female,
            pct_articles_first_female: percentage(
                tally.articles_first_female,
                tally.total_articles,
            ),
            articles_last_female: tally.articles_last_female,
            pct_articles_last_female: percentage(tally.articles_last_female, tally.total_articles),
            total_articles: tally.total_articles,
            total_authors: tally.total_authors,
        }
    }
}

/// Accumulates article stats per publication year and overall.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    years: BTreeMap<String, GenderTally>,
    total: GenderTally,
}

impl ReportBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one article into its year bucket and the grand total.
    ///
    /// The year is used as the raw trimmed string; a missing year lands in
    /// the empty-string bucket.
    pub fn add_article(&mut self, year: &str, article: &ArticleStats) {
        self.years
            .entry(year.trim().to_string())
            .or_default()
            .add_article(article);
        self.total.add_article(article);
    }

    /// Running grand total.
    #[must_use]
    pub fn total(&self) -> &GenderTally {
        &self.total
    }

    /// Tally for a single year key, if any article had it.
    #[must_use]
    pub fn year(&self, key: &str) -> Option<&GenderTally> {
        self.years.get(key)
    }

    /// Number of articles folded so far.
    #[must_use]
    pub fn article_count(&self) -> u64 {
        self.total.total_articles
    }

    /// One row per year in ascending string order, then the `TOTAL` row.
    #[must_use]
    pub fn build_report(&self) -> Vec<ReportRow> {
        self.years
            .iter()
            .map(|(year, tally)| ReportRow::from_tally(year.as_str(), tally))
            .chain(std::iter::once(ReportRow::from_tally(TOTAL_KEY, &self.total)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(male: u64, female: u64, unknown: u64, first: bool, last: bool) -> ArticleStats {
        ArticleStats {
            male_count: male,
            female_count: female,
            unknown_count: unknown,
            first_author_female: first,
            last_author_female: last,
            has_female: female > 0,
            total_authors: male + female + unknown,
        }
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_percentage_rounding_and_zero_denominator() {
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert!(!percentage(3, 0).is_nan());
    }

    #[test]
    fn test_empty_builder_has_only_total_row() {
        let rows = ReportBuilder::new().build_report();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, TOTAL_KEY);
        assert_eq!(rows[0].total_articles, 0);
        assert!(rows[0].pct_male.abs() < f64::EPSILON);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_two_articles_in_2020() {
        // Jane (female, first) + John (male, last); then Kim alone, unknown.
        let mut builder = ReportBuilder::new();
        builder.add_article("2020", &article(1, 1, 0, true, false));
        builder.add_article("2020", &article(0, 0, 1, false, false));

        let rows = builder.build_report();
        assert_eq!(rows.len(), 2);
        let year = &rows[0];
        assert_eq!(year.year, "2020");
        assert_eq!(
            (year.male_count, year.female_count, year.unknown_count),
            (1, 1, 1)
        );
        assert_eq!(year.articles_with_female, 1);
        assert_eq!(year.articles_first_female, 1);
        assert_eq!(year.articles_last_female, 0);
        assert_eq!(year.total_articles, 2);
        assert_eq!(year.total_authors, 3);
        assert_eq!(year.pct_female, 33.33);
        assert_eq!(year.pct_articles_with_female, 50.0);

        let total = &rows[1];
        assert_eq!(total.year, TOTAL_KEY);
        assert_eq!(ReportRow { year: "2020".into(), ..total.clone() }, *year);
    }

    #[test]
    fn test_years_sorted_as_strings_with_blank_bucket() {
        let mut builder = ReportBuilder::new();
        builder.add_article("2021", &article(1, 0, 0, false, false));
        builder.add_article(" 1999 ", &article(0, 1, 0, true, true));
        builder.add_article("", &article(0, 0, 1, false, false));

        let years: Vec<String> = builder.build_report().into_iter().map(|r| r.year).collect();
        assert_eq!(years, ["", "1999", "2021", TOTAL_KEY]);
        assert_eq!(builder.year("1999").map(|t| t.female_count), Some(1));
        assert!(builder.year("2000").is_none());
    }

    #[test]
    fn test_total_equals_sum_of_years() {
        let mut builder = ReportBuilder::new();
        builder.add_article("2019", &article(2, 1, 0, false, true));
        builder.add_article("2020", &article(0, 2, 1, true, false));
        builder.add_article("2020", &article(1, 0, 0, false, false));

        let summed: GenderTally = ["2019", "2020"]
            .iter()
            .filter_map(|key| builder.year(key).copied())
            .sum();
        assert_eq!(&summed, builder.total());
        assert_eq!(builder.article_count(), 3);
    }
}
