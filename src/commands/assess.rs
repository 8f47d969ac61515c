use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{info, warn};

use author_gender::config::{API_KEY_ENV, FileConfig, Settings};
use author_gender::pipeline::{self, RunOptions, RunSummary};
use author_gender::{GenderCache, GenderProvider, OutputPaths, RateLimiter, RecordReader, build_lookup};

use crate::ProcessExit;
use crate::app::exit_handler;
use crate::cli::AssessArgs;

/// Runs a full assessment and prints where the results went.
pub(crate) async fn run_assess_command(
    args: &AssessArgs,
    file_config: Option<&FileConfig>,
    show_progress: bool,
) -> Result<ProcessExit> {
    let settings = Settings::resolve(file_config, std::env::var(API_KEY_ENV).ok(), args.overrides())
        .context("Invalid settings")?;

    let backend = build_lookup(
        settings.provider,
        settings.api_key.as_deref(),
        settings.base_url.as_deref(),
        settings.timeouts,
    )
    .with_context(|| format!("Cannot use provider '{}'", settings.provider))?;

    let reader = RecordReader::from_path(&settings.input, &settings.columns)
        .with_context(|| format!("Failed to read input '{}'", settings.input.display()))?;

    let cache = GenderCache::load(&settings.cache_path);
    info!(
        provider = %settings.provider,
        input = %settings.input.display(),
        cached_names = cache.len(),
        threshold = settings.confidence_threshold,
        delay_ms = settings.request_delay.as_millis(),
        "starting assessment"
    );
    let provider = GenderProvider::new(backend, cache, RateLimiter::new(settings.request_delay));

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let options = RunOptions {
        confidence_threshold: settings.confidence_threshold,
        output_paths: OutputPaths::stamped_now(&settings.output_dir),
        show_progress,
    };
    let summary = pipeline::run(reader, provider, &options, &interrupted)
        .await
        .with_context(|| {
            format!(
                "Failed to write results to '{}'",
                settings.output_dir.display()
            )
        })?;

    print_summary(&summary);
    if let Some(error) = &summary.cache_flush_error {
        warn!(
            path = %settings.cache_path.display(),
            error = %error,
            "gender cache was not saved; the next run will repeat these lookups"
        );
    }
    Ok(exit_handler::exit_outcome_for(&summary))
}

fn print_summary(summary: &RunSummary) {
    if summary.interrupted {
        println!("Interrupted: results cover the articles processed before Ctrl-C.");
    }
    println!(
        "Assessed {} articles ({} authors, {} rows skipped).",
        summary.articles, summary.authors, summary.skipped_rows
    );
    println!(
        "Lookups: {} cached, {} requested, {} failed.",
        summary.lookup.cache_hits, summary.lookup.lookups, summary.lookup.failures
    );
    println!("Articles: {}", summary.paths.articles.display());
    println!("Authors:  {}", summary.paths.authors.display());
    println!("Report:   {}", summary.paths.report.display());
}
