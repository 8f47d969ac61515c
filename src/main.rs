//! CLI entry point for the author-gender tool.

use std::process::ExitCode;

mod app;
mod cli;
mod commands;

/// Outcome of a process run, mapped to the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything completed.
    Success,
    /// A fatal error stopped the run.
    Failure,
    /// Results were written but the gender cache could not be saved.
    Partial,
    /// Stopped early by Ctrl-C after writing partial results.
    Interrupted,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
            Self::Interrupted => 130,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_author_gender().await {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(ProcessExit::Failure.code())
        }
    }
}
