use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use author_gender::config;

use crate::ProcessExit;
use crate::app::terminal;
use crate::cli::{Cli, Command};
use crate::commands;

pub(crate) async fn run_author_gender() -> Result<ProcessExit> {
    let cli = Cli::parse();

    let loaded = config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let file_verbosity = loaded.config.as_ref().and_then(|cfg| cfg.verbosity);

    let default_level = terminal::resolve_default_log_level(cli.quiet, cli.verbose, file_verbosity);
    terminal::init_tracing(default_level, terminal::is_no_color_requested(&cli));

    debug!(?cli, "CLI arguments parsed");
    match &loaded.path {
        Some(path) if loaded.loaded_from_file() => {
            debug!(path = %path.display(), "configuration loaded");
        }
        _ => debug!("no configuration file; using defaults"),
    }

    match &cli.command {
        Command::Assess(args) => {
            let show_progress = terminal::should_use_spinner(
                std::io::stderr().is_terminal(),
                cli.quiet,
                terminal::is_dumb_terminal(),
            );
            commands::run_assess_command(args, loaded.config.as_ref(), show_progress).await
        }
        Command::Names(args) => commands::run_names_command(args, loaded.config.as_ref()),
    }
}
