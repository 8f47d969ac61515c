//! Binary-side orchestration: terminal setup, command dispatch, exit codes.

pub(crate) mod exit_handler;
pub(crate) mod runtime;
pub(crate) mod terminal;
