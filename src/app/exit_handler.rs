//! Exit code logic for the media-backup process.
//!
//! Single responsibility: map the run summary to the process exit outcome.

use media_backup::Summary;

use crate::ProcessExit;

/// Determines the process exit outcome from succeeded and failed reference counts.
pub(crate) fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Anything failed or still missing after the last pass counts as a failure.
pub(crate) fn exit_outcome_for(summary: &Summary) -> ProcessExit {
    determine_exit_outcome(
        summary.succeeded(),
        summary.failed().max(summary.still_missing),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        assert_eq!(determine_exit_outcome(3, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_success_when_nothing_found() {
        assert_eq!(exit_outcome_for(&Summary::default()), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        assert_eq!(determine_exit_outcome(2, 1), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        let summary = Summary {
            external_failed: 2,
            ..Summary::default()
        };
        assert_eq!(exit_outcome_for(&summary), ProcessExit::Failure);
    }

    #[test]
    fn test_still_missing_alone_is_partial() {
        let summary = Summary {
            local_copied: 1,
            still_missing: 1,
            ..Summary::default()
        };
        assert_eq!(exit_outcome_for(&summary), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Partial.code(), 1);
        assert_eq!(ProcessExit::Failure.code(), 2);
        assert_eq!(ProcessExit::Fatal.code(), 3);
    }
}
