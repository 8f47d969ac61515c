//! Bibliographic record source and result tables.
//!
//! Input is a CSV export (the Zotero layout by default) with a header row.
//! Only three columns matter: title, publication year and the `;`-joined
//! author list. Column names are configurable through [`ColumnMapping`].

mod error;
mod output;

pub use error::RecordError;
pub use output::{ArticleRow, AuthorRow, OutputPaths, OutputTables};

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

/// Default title column of a Zotero CSV export.
pub const DEFAULT_TITLE_COLUMN: &str = "Title";
/// Default publication year column of a Zotero CSV export.
pub const DEFAULT_YEAR_COLUMN: &str = "Publication Year";
/// Default author column of a Zotero CSV export.
pub const DEFAULT_AUTHOR_COLUMN: &str = "Author";

/// Header names of the three columns the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Article title column.
    pub title: String,
    /// Publication year column.
    pub year: String,
    /// Author list column.
    pub authors: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE_COLUMN.to_string(),
            year: DEFAULT_YEAR_COLUMN.to_string(),
            authors: DEFAULT_AUTHOR_COLUMN.to_string(),
        }
    }
}

/// One bibliographic record with a non-blank author field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibRecord {
    /// Article title (empty when the column is missing).
    pub title: String,
    /// Raw publication year (empty when missing or blank).
    pub year: String,
    /// Raw `;`-joined author field, trimmed.
    pub authors: String,
}

/// Why an input row was not turned into a [`BibRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The author field is absent or blank.
    MissingAuthors,
    /// The row could not be decoded (bad quoting, invalid UTF-8, ...).
    Malformed(String),
}

/// Result of reading one input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// A usable record.
    Record(BibRecord),
    /// A row that is skipped and must not be counted anywhere.
    Skipped {
        /// 1-based line number in the source, when known.
        line: Option<u64>,
        /// Title of the row, when it could be read.
        title: String,
        /// Skip reason.
        reason: SkipReason,
    },
}

/// Streaming reader over a CSV export.
///
/// Yields one [`RowOutcome`] per data row, in file order.
pub struct RecordReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    title_idx: Option<usize>,
    year_idx: Option<usize>,
    author_idx: Option<usize>,
}

impl RecordReader<File> {
    /// Opens a CSV export from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the file cannot be opened or its header row
    /// cannot be decoded.
    pub fn from_path(path: &Path, mapping: &ColumnMapping) -> Result<Self, RecordError> {
        let file = File::open(path).map_err(|e| RecordError::open_input(path, e))?;
        Self::build(file, mapping, &path.display().to_string())
    }
}

impl<R: Read> RecordReader<R> {
    /// Wraps any reader producing CSV text.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the header row cannot be decoded.
    pub fn from_reader(reader: R, mapping: &ColumnMapping) -> Result<Self, RecordError> {
        Self::build(reader, mapping, "<reader>")
    }

    fn build(reader: R, mapping: &ColumnMapping, source_name: &str) -> Result<Self, RecordError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| RecordError::header(source_name, e))?
            .clone();

        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        let title_idx = find(&mapping.title);
        let year_idx = find(&mapping.year);
        let author_idx = find(&mapping.authors);

        if author_idx.is_none() {
            warn!(
                column = %mapping.authors,
                source = source_name,
                "author column not found in header; every row will be skipped"
            );
        }
        debug!(?title_idx, ?year_idx, ?author_idx, "resolved input columns");

        Ok(Self {
            records: csv_reader.into_records(),
            title_idx,
            year_idx,
            author_idx,
        })
    }

    fn field(record: &csv::StringRecord, idx: Option<usize>) -> &str {
        idx.and_then(|i| record.get(i)).unwrap_or_default()
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = RowOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let outcome = match self.records.next()? {
            Ok(record) => {
                let line = record.position().map(csv::Position::line);
                let title = Self::field(&record, self.title_idx).to_string();
                let authors = Self::field(&record, self.author_idx).trim();

                if authors.is_empty() {
                    RowOutcome::Skipped {
                        line,
                        title,
                        reason: SkipReason::MissingAuthors,
                    }
                } else {
                    RowOutcome::Record(BibRecord {
                        year: Self::field(&record, self.year_idx).trim().to_string(),
                        authors: authors.to_string(),
                        title,
                    })
                }
            }
            Err(error) => RowOutcome::Skipped {
                line: error.position().map(csv::Position::line),
                title: String::new(),
                reason: SkipReason::Malformed(error.to_string()),
            },
        };
        Some(outcome)
    }
}
