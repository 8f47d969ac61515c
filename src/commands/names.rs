use anyhow::{Context, Result};

use author_gender::config::FileConfig;
use author_gender::names::count_first_names;
use author_gender::RecordReader;

use crate::ProcessExit;
use crate::cli::NamesArgs;

/// Prints first-name repetition statistics for an input export.
pub(crate) fn run_names_command(
    args: &NamesArgs,
    file_config: Option<&FileConfig>,
) -> Result<ProcessExit> {
    let columns = file_config
        .map(FileConfig::column_mapping)
        .unwrap_or_default();
    let reader = RecordReader::from_path(&args.input, &columns)
        .with_context(|| format!("Failed to read input '{}'", args.input.display()))?;

    let frequency = count_first_names(reader);
    println!("{frequency}");
    if !frequency.most_repeated.is_empty() {
        println!();
        println!("Most repeated first names:");
        for (name, count) in &frequency.most_repeated {
            println!("  {name}: {count} occurrences");
        }
    }
    Ok(ProcessExit::Success)
}
