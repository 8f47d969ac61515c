//! Durable first-name → gender cache.
//!
//! The cache maps lower-cased first names to the provider's raw answer
//! ([`RawGender`]). It is loaded once when a run starts and rewritten in full
//! when the run ends, so an interrupted run resumes with every name it had
//! already resolved.
//!
//! # File format
//!
//! A pretty-printed JSON object, keys sorted:
//!
//! ```json
//! {
//!   "anne": { "gender": "female", "probability": 0.9 }
//! }
//! ```

mod error;

pub use error::CacheError;

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::gender::RawGender;

/// Default cache file name inside the output directory.
pub const DEFAULT_CACHE_FILE: &str = "gender_cache.json";

/// In-memory gender cache bound to a file path.
#[derive(Debug, Clone, Default)]
pub struct GenderCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, RawGender>,
}

impl GenderCache {
    /// Creates an empty cache that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the cache stored at `path`.
    ///
    /// Best effort: a missing, unreadable or corrupt file yields an empty
    /// cache bound to the same path, so the next flush replaces it.
    #[must_use]
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, RawGender>>(&raw) {
                Ok(entries) => entries
                    .into_iter()
                    .map(|(name, raw)| (name.to_lowercase(), raw))
                    .collect(),
                Err(error) => {
                    warn!(error = %error, "gender cache is corrupt; starting empty");
                    BTreeMap::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("no gender cache yet; starting empty");
                BTreeMap::new()
            }
            Err(error) => {
                warn!(error = %error, "gender cache unreadable; starting empty");
                BTreeMap::new()
            }
        };

        info!(entries = entries.len(), "gender cache loaded");
        Self {
            path: Some(path.to_path_buf()),
            entries,
        }
    }

    /// Returns the file this cache flushes to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Looks up a first name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<RawGender> {
        self.entries.get(&name.to_lowercase()).copied()
    }

    /// Stores the raw answer for a first name, case-insensitively.
    pub fn put(&mut self, name: &str, raw: RawGender) {
        self.entries.insert(name.to_lowercase(), raw);
    }

    /// Number of cached names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the whole cache to its file.
    ///
    /// The snapshot is written to a temporary file next to the target and
    /// renamed over it, so a crash mid-write leaves the previous snapshot
    /// intact. In-memory caches flush to nowhere and always succeed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory, the temporary file or the
    /// rename fails.
    #[instrument(skip(self), fields(entries = self.entries.len()))]
    pub fn flush(&self) -> Result<(), CacheError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

        let payload =
            serde_json::to_vec_pretty(&self.entries).map_err(|e| CacheError::json(path, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
        tmp.write_all(&payload)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(path)
            .map_err(|e| CacheError::persist(path, e.error))?;

        info!(path = %path.display(), "gender cache flushed");
        Ok(())
    }
}
