//! Exit code logic for the author-gender process.
//!
//! Single responsibility: map a finished run to the process exit outcome.

use author_gender::RunSummary;

use crate::ProcessExit;

/// Determines the process exit outcome of an assessment run.
///
/// An interrupted run wins over a cache flush failure; both still leave
/// valid report files behind.
pub(crate) fn determine_exit_outcome(interrupted: bool, cache_flush_failed: bool) -> ProcessExit {
    if interrupted {
        ProcessExit::Interrupted
    } else if cache_flush_failed {
        ProcessExit::Partial
    } else {
        ProcessExit::Success
    }
}

pub(crate) fn exit_outcome_for(summary: &RunSummary) -> ProcessExit {
    determine_exit_outcome(summary.interrupted, summary.cache_flush_error.is_some())
}
