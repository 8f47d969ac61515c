//! CSV result tables: per-article, per-author and the per-year report.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::classify::{ClassifiedAuthor, Gender};
use crate::stats::ArticleStats;
use crate::stats::report::ReportRow;

use super::RecordError;

/// Locations of the three output tables of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Per-article table.
    pub articles: PathBuf,
    /// Per-author table.
    pub authors: PathBuf,
    /// Per-year report with the TOTAL row.
    pub report: PathBuf,
}

impl OutputPaths {
    /// Builds stamped file names inside `dir`, e.g. `Report_20250101_1200.csv`.
    #[must_use]
    pub fn stamped(dir: &Path, stamp: &str) -> Self {
        Self {
            articles: dir.join(format!("LibAssessed_{stamp}.csv")),
            authors: dir.join(format!("Authors_{stamp}.csv")),
            report: dir.join(format!("Report_{stamp}.csv")),
        }
    }

    /// Stamped file names using the current local time (`YYYYmmdd_HHMM`).
    #[must_use]
    pub fn stamped_now(dir: &Path) -> Self {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M").to_string();
        Self::stamped(dir, &stamp)
    }
}

/// One row of the per-article table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRow<'a> {
    #[serde(rename = "Title")]
    pub title: &'a str,
    #[serde(rename = "Year")]
    pub year: &'a str,
    #[serde(rename = "Male Authors")]
    pub male_count: u64,
    #[serde(rename = "Female Authors")]
    pub female_count: u64,
    #[serde(rename = "Unknown Gender Authors")]
    pub unknown_count: u64,
    #[serde(rename = "First Author Female")]
    pub first_author_female: bool,
    #[serde(rename = "Last Author Female")]
    pub last_author_female: bool,
    #[serde(rename = "Total Authors")]
    pub total_authors: u64,
}

impl<'a> ArticleRow<'a> {
    /// Builds a row from an article's title, year and aggregated stats.
    #[must_use]
    pub fn new(title: &'a str, year: &'a str, stats: &ArticleStats) -> Self {
        Self {
            title,
            year,
            male_count: stats.male_count,
            female_count: stats.female_count,
            unknown_count: stats.unknown_count,
            first_author_female: stats.first_author_female,
            last_author_female: stats.last_author_female,
            total_authors: stats.total_authors,
        }
    }
}

/// One row of the per-author table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRow<'a> {
    #[serde(rename = "Article Title")]
    pub article_title: &'a str,
    #[serde(rename = "Author Name")]
    pub full_name: &'a str,
    #[serde(rename = "First Name")]
    pub first_name: &'a str,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Probability")]
    pub probability: f64,
    #[serde(rename = "Reliable")]
    pub reliable: bool,
}

impl<'a> AuthorRow<'a> {
    /// Builds a row for one classified author of an article.
    #[must_use]
    pub fn new(article_title: &'a str, author: &'a ClassifiedAuthor) -> Self {
        Self {
            article_title,
            full_name: &author.full_name,
            first_name: &author.first_name,
            gender: author.gender,
            probability: author.probability,
            reliable: author.reliable,
        }
    }
}

const ARTICLE_HEADERS: [&str; 8] = [
    "Title",
    "Year",
    "Male Authors",
    "Female Authors",
    "Unknown Gender Authors",
    "First Author Female",
    "Last Author Female",
    "Total Authors",
];

const AUTHOR_HEADERS: [&str; 6] = [
    "Article Title",
    "Author Name",
    "First Name",
    "Gender",
    "Probability",
    "Reliable",
];

/// Opens `path` and writes its header row, so a run without any rows still
/// leaves a well-formed table.
fn open_table(path: &Path, headers: &[&str]) -> Result<csv::Writer<File>, RecordError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| RecordError::write(path, e))?;
    writer
        .write_record(headers)
        .map_err(|e| RecordError::write(path, e))?;
    Ok(writer)
}

/// Open writers for the streamed per-article and per-author tables.
///
/// Rows are appended as records are processed; the report table is written
/// once at the end by [`OutputTables::finish`].
pub struct OutputTables {
    paths: OutputPaths,
    articles: csv::Writer<File>,
    authors: csv::Writer<File>,
}

impl std::fmt::Debug for OutputTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputTables")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl OutputTables {
    /// Creates the output directory (if needed) and the two streamed tables.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when the directory or either file cannot be created.
    #[instrument(skip_all, fields(articles = %paths.articles.display()))]
    pub fn create(paths: OutputPaths) -> Result<Self, RecordError> {
        for path in [&paths.articles, &paths.authors, &paths.report] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| RecordError::io(parent, e))?;
            }
        }

        let articles = open_table(&paths.articles, &ARTICLE_HEADERS)?;
        let authors = open_table(&paths.authors, &AUTHOR_HEADERS)?;
        debug!("output tables created");

        Ok(Self {
            paths,
            articles,
            authors,
        })
    }

    /// Returns the paths of all three tables.
    #[must_use]
    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Appends one article row.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Write`] when the row cannot be written.
    pub fn write_article(&mut self, row: &ArticleRow<'_>) -> Result<(), RecordError> {
        self.articles
            .serialize(row)
            .map_err(|e| RecordError::write(&self.paths.articles, e))
    }

    /// Appends one author row.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Write`] when the row cannot be written.
    pub fn write_author(&mut self, row: &AuthorRow<'_>) -> Result<(), RecordError> {
        self.authors
            .serialize(row)
            .map_err(|e| RecordError::write(&self.paths.authors, e))
    }

    /// Flushes the streamed tables and writes the report table.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] when any table cannot be flushed or written.
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub fn finish(mut self, rows: &[ReportRow]) -> Result<OutputPaths, RecordError> {
        self.articles
            .flush()
            .map_err(|e| RecordError::io(&self.paths.articles, e))?;
        self.authors
            .flush()
            .map_err(|e| RecordError::io(&self.paths.authors, e))?;
        write_report(&self.paths.report, rows)?;
        Ok(self.paths)
    }
}

/// Writes the per-year report (including the TOTAL row) to `path`.
///
/// # Errors
///
/// Returns [`RecordError`] when the file cannot be created or written.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<(), RecordError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| RecordError::write(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| RecordError::write(path, e))?;
    }
    writer.flush().map_err(|e| RecordError::io(path, e))?;
    debug!(path = %path.display(), "report written");
    Ok(())
}
