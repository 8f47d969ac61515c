//! Error types for reading bibliographic exports and writing result tables.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading input records or writing output tables.
///
/// Per-row decoding problems are not errors: they surface as
/// [`RowOutcome::Skipped`](super::RowOutcome::Skipped). Only failures that make
/// the whole source or destination unusable are represented here.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The input file could not be opened.
    #[error("cannot open input {path}: {source}\n  Suggestion: check the path passed with --input")]
    OpenInput {
        /// Input path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The header row could not be decoded.
    #[error("cannot read header row of {source_name}: {source}")]
    Header {
        /// Display name of the source (path or `<reader>`).
        source_name: String,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// An output table could not be created or written.
    #[error("cannot write {path}: {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The output directory could not be created, or a table could not be flushed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl RecordError {
    /// Creates an input-open error.
    pub fn open_input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OpenInput {
            path: path.into(),
            source,
        }
    }

    /// Creates a header decoding error.
    pub fn header(source_name: impl Into<String>, source: csv::Error) -> Self {
        Self::Header {
            source_name: source_name.into(),
            source,
        }
    }

    /// Creates an output write error.
    pub fn write(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
