//! One assessment run: records in, tables and report out.
//!
//! [`RunContext`] owns everything that lives for the duration of a run: the
//! [`GenderProvider`] (and through it the cache) and the [`ReportBuilder`].
//! [`run`] drives it over a [`RecordReader`] strictly sequentially and flushes
//! the cache at the end whether or not processing succeeded, including when
//! processing panics or the run future is dropped.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cache::{CacheError, GenderCache};
use crate::classify::{AuthorClassifier, ClassifiedAuthor, InvalidThreshold};
use crate::provider::{GenderProvider, LookupStats};
use crate::records::{
    ArticleRow, AuthorRow, BibRecord, OutputPaths, OutputTables, RecordError, RecordReader,
    RowOutcome, SkipReason,
};
use crate::stats::{ArticleStats, ReportBuilder, ReportRow, aggregate};

/// Errors that abort a run.
///
/// Provider and cache-load failures never abort; a cache flush failure is
/// reported through [`RunSummary::cache_flush_error`] instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Records(#[from] RecordError),

    #[error(transparent)]
    Threshold(#[from] InvalidThreshold),
}

/// Per-run knobs that are not part of the provider.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Minimum probability for a label to count.
    pub confidence_threshold: f64,
    /// Where the three output tables go.
    pub output_paths: OutputPaths,
    /// Draw a spinner on stderr.
    pub show_progress: bool,
}

/// Outcome of a completed or interrupted run.
#[derive(Debug)]
pub struct RunSummary {
    /// Articles classified and counted.
    pub articles: u64,
    /// Rows skipped for a missing author field or a decoding error.
    pub skipped_rows: u64,
    /// Authors classified across all articles.
    pub authors: u64,
    /// Report rows, per year then TOTAL.
    pub report: Vec<ReportRow>,
    /// Files written.
    pub paths: OutputPaths,
    /// How first names were resolved.
    pub lookup: LookupStats,
    /// Whether the run stopped early on request.
    pub interrupted: bool,
    /// Set when the cache could not be written back.
    pub cache_flush_error: Option<CacheError>,
}

/// State owned by one run.
#[derive(Debug)]
pub struct RunContext {
    provider: GenderProvider,
    report: ReportBuilder,
    threshold: f64,
}

impl RunContext {
    /// Creates a run context gating classifications at `threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidThreshold`] when `threshold` is outside `[0, 1]`.
    pub fn new(provider: GenderProvider, threshold: f64) -> Result<Self, InvalidThreshold> {
        Ok(Self {
            provider,
            report: ReportBuilder::new(),
            threshold: crate::classify::validate_threshold(threshold)?,
        })
    }

    /// Classifies a record's authors and folds the article into the report.
    pub async fn process_record(
        &mut self,
        record: &BibRecord,
    ) -> Result<(ArticleStats, Vec<ClassifiedAuthor>), InvalidThreshold> {
        let mut classifier = AuthorClassifier::new(&mut self.provider, self.threshold)?;
        let authors = classifier.classify_all(&record.authors).await;
        let stats = aggregate(&authors);
        self.report.add_article(&record.year, &stats);
        Ok((stats, authors))
    }

    /// Accumulated per-year and total counts.
    #[must_use]
    pub fn report(&self) -> &ReportBuilder {
        &self.report
    }

    /// The provider, for its cache and counters.
    #[must_use]
    pub fn provider(&self) -> &GenderProvider {
        &self.provider
    }
}

/// Owns the run context and writes its cache back when dropped, unless
/// [`CacheFlushGuard::flush`] already did.
struct CacheFlushGuard {
    context: RunContext,
    flushed: bool,
}

impl CacheFlushGuard {
    fn new(context: RunContext) -> Self {
        Self {
            context,
            flushed: false,
        }
    }

    fn cache(&self) -> &GenderCache {
        self.context.provider().cache()
    }

    fn flush(&mut self) -> Option<CacheError> {
        self.flushed = true;
        let error = self.cache().flush().err();
        if let Some(error) = &error {
            tracing::error!(error = %error, "failed to save gender cache");
        }
        error
    }
}

impl Drop for CacheFlushGuard {
    fn drop(&mut self) {
        if self.flushed {
            return;
        }
        warn!("run ended abruptly; saving gender cache");
        if let Err(error) = self.cache().flush() {
            tracing::error!(error = %error, "failed to save gender cache");
        }
    }
}

#[derive(Debug, Default)]
struct Processed {
    articles: u64,
    skipped_rows: u64,
    authors: u64,
    interrupted: bool,
}

impl Processed {
    fn mark_interrupted(&mut self) {
        warn!(
            articles = self.articles,
            "interrupted; writing report for records processed so far"
        );
        self.interrupted = true;
    }
}

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolves once `cancel` is set.
async fn cancelled(cancel: &AtomicBool) {
    while !cancel.load(Ordering::SeqCst) {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}

/// Runs the full assessment over `reader`.
///
/// Watches `cancel` while records are processed; once set, the record in
/// flight is abandoned (even mid-wait on the rate limiter), the remaining
/// records are left untouched and the report covers what was processed. The
/// cache is flushed on every exit path, including errors and panics.
///
/// # Errors
///
/// Returns [`PipelineError`] when the output tables cannot be written or the
/// threshold is invalid.
#[instrument(skip_all, fields(provider = provider.backend_name()))]
pub async fn run<R: Read>(
    reader: RecordReader<R>,
    provider: GenderProvider,
    options: &RunOptions,
    cancel: &AtomicBool,
) -> Result<RunSummary, PipelineError> {
    let mut guard = CacheFlushGuard::new(RunContext::new(provider, options.confidence_threshold)?);

    let outcome = process_all(&mut guard.context, reader, options, cancel).await;
    let cache_flush_error = guard.flush();
    let lookup = guard.context.provider().stats();

    let (processed, paths) = outcome?;
    info!(
        articles = processed.articles,
        skipped = processed.skipped_rows,
        authors = processed.authors,
        cache_hits = lookup.cache_hits,
        lookups = lookup.lookups,
        lookup_failures = lookup.failures,
        interrupted = processed.interrupted,
        "assessment finished"
    );

    Ok(RunSummary {
        articles: processed.articles,
        skipped_rows: processed.skipped_rows,
        authors: processed.authors,
        report: guard.context.report().build_report(),
        paths,
        lookup,
        interrupted: processed.interrupted,
        cache_flush_error,
    })
}

async fn process_all<R: Read>(
    context: &mut RunContext,
    reader: RecordReader<R>,
    options: &RunOptions,
    cancel: &AtomicBool,
) -> Result<(Processed, OutputPaths), PipelineError> {
    let mut tables = OutputTables::create(options.output_paths.clone())?;
    let progress = progress_bar(options.show_progress);
    let mut processed = Processed::default();

    for row in reader {
        if cancel.load(Ordering::SeqCst) {
            processed.mark_interrupted();
            break;
        }

        let record = match row {
            RowOutcome::Record(record) => record,
            RowOutcome::Skipped {
                line,
                title,
                reason,
            } => {
                processed.skipped_rows += 1;
                match reason {
                    SkipReason::MissingAuthors => {
                        info!(?line, title = %title, "no authors; skipping row");
                    }
                    SkipReason::Malformed(error) => {
                        warn!(?line, error = %error, "malformed row; skipping");
                    }
                }
                continue;
            }
        };

        progress.set_message(format!("[{}] {}", processed.articles + 1, record.title));
        let classified = tokio::select! {
            result = context.process_record(&record) => Some(result?),
            () = cancelled(cancel) => None,
        };
        let Some((stats, authors)) = classified else {
            processed.mark_interrupted();
            break;
        };

        tables.write_article(&ArticleRow::new(&record.title, &record.year, &stats))?;
        for author in &authors {
            tables.write_author(&AuthorRow::new(&record.title, author))?;
        }

        processed.articles += 1;
        processed.authors += stats.total_authors;
    }

    progress.finish_and_clear();
    let paths = tables.finish(&context.report().build_report())?;
    Ok((processed, paths))
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} Assessing {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
