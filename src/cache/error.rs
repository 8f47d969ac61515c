//! Error types for gender cache persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while flushing the gender cache to disk.
///
/// Loading never fails: a missing or corrupt cache file yields an empty cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem error while preparing or writing the snapshot.
    #[error("IO error writing gender cache {path}: {source}")]
    Io {
        /// Cache path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The cache contents could not be serialized.
    #[error("cannot serialize gender cache {path}: {source}")]
    Json {
        /// Cache path.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The temporary snapshot could not be moved over the cache file.
    #[error("cannot replace gender cache {path}: {source}")]
    Persist {
        /// Cache path.
        path: PathBuf,
        /// Underlying IO error from the rename.
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a serialization error.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Creates a rename error.
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}
