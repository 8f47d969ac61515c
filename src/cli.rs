//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use author_gender::ProviderKind;
use author_gender::config::SettingsOverrides;

/// Infer author gender from bibliographic exports and report the distribution.
///
/// Reads a CSV export (Title, Publication Year, Author), looks up each
/// author's first name through a gender-inference service with a durable
/// cache, and writes per-article, per-author and per-year tables.
#[derive(Parser, Debug)]
#[command(name = "author-gender")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored log output (also honors NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH", env = "AUTHOR_GENDER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify every author and write the article, author and report tables
    Assess(AssessArgs),
    /// Count first-name repetitions to estimate how many lookups a run needs
    Names(NamesArgs),
}

/// Arguments for `author-gender assess`.
#[derive(Args, Debug, Clone, Default)]
pub struct AssessArgs {
    /// Input CSV export (default: womenLib.csv)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory for the output tables (default: assessed)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Gender lookup service
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// API key for the lookup service (or set AUTHOR_GENDER_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Override the lookup service endpoint
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Minimum probability for a label to count (0.0-1.0, default 0.75)
    #[arg(long, value_name = "T", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Minimum delay between lookups in milliseconds (0 to disable, max 60000)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: Option<u64>,

    /// Gender cache file (default: <output-dir>/gender_cache.json)
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,
}

impl AssessArgs {
    /// Values given on the command line, for layering over the config file.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            input: self.input.clone(),
            output_dir: self.output_dir.clone(),
            provider: self.provider,
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            confidence_threshold: self.threshold,
            request_delay_ms: self.delay_ms,
            cache_path: self.cache.clone(),
        }
    }
}

/// Arguments for `author-gender names`.
#[derive(Args, Debug, Clone)]
pub struct NamesArgs {
    /// Input CSV export
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside 0.0..=1.0"))
    }
}
