//! Author Gender Core Library
//!
//! Infers the likely gender of article authors from bibliographic CSV
//! exports and aggregates the distribution per article, per publication year
//! and overall.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`names`] - First-name extraction from raw author strings
//! - [`cache`] - Durable first-name → gender cache
//! - [`provider`] - Rate-limited, cache-first gender lookup backends
//! - [`classify`] - Per-author decisions with confidence gating
//! - [`stats`] - Per-article aggregation and the per-year report
//! - [`records`] - CSV input and output tables
//! - [`pipeline`] - One assessment run end to end
//! - [`config`] - Layered settings

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod classify;
pub mod config;
pub mod gender;
pub mod names;
pub mod pipeline;
pub mod provider;
pub mod records;
pub mod stats;

#[cfg(test)]
mod test_support;
mod user_agent;

// Re-export commonly used types
pub use cache::{CacheError, GenderCache};
pub use classify::{AuthorClassifier, ClassifiedAuthor, DEFAULT_CONFIDENCE_THRESHOLD};
pub use config::{ConfigError, FileConfig, Settings, SettingsOverrides};
pub use gender::{Gender, RawGender};
pub use names::{NameFrequency, count_first_names, extract_first_name, split_authors};
pub use pipeline::{PipelineError, RunContext, RunOptions, RunSummary, run};
pub use provider::{
    GenderLookup, GenderProvider, LookupError, LookupStats, ProviderKind, RateLimiter,
    build_lookup,
};
pub use records::{ColumnMapping, OutputPaths, RecordError, RecordReader};
pub use stats::{ArticleStats, GenderTally, ReportBuilder, ReportRow, aggregate};
