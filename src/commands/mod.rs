//! Subcommand handlers.

mod assess;
mod names;

pub(crate) use assess::run_assess_command;
pub(crate) use names::run_names_command;
