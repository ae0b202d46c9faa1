//! Bounded retry policy for references missing after a transfer pass.
//!
//! The policy counts whole passes, not per-reference attempts: pass 1 covers
//! every reference, and each further pass covers only what verification
//! reported missing. There is no backoff between passes.
//!
//! ```
//! use media_backup::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.should_retry(1, 3), RetryDecision::Retry { attempt: 2 });
//! assert!(matches!(policy.should_retry(2, 3), RetryDecision::DoNotRetry { .. }));
//! ```

use tracing::{debug, instrument};

/// Default number of passes, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Upper bound accepted from configuration.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Decision on whether to run another pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Run another pass over the missing set.
    Retry {
        /// Number of the pass about to run (the first retry is pass 2).
        attempt: u32,
    },

    /// Stop.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// How many passes a run may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy, clamping `max_attempts` to `1..=10`.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT),
        }
    }

    /// Returns the maximum number of passes.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides whether another pass runs after pass `attempt` (1-indexed)
    /// left `missing` references absent.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, attempt: u32, missing: usize) -> RetryDecision {
        if missing == 0 {
            return RetryDecision::DoNotRetry {
                reason: "nothing missing".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        debug!(attempt, next_attempt = attempt + 1, missing, "will retry");
        RetryDecision::Retry {
            attempt: attempt + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default_is_two_passes() {
        assert_eq!(RetryPolicy::default().max_attempts(), 2);
    }

    #[test]
    fn test_retry_policy_clamps_range() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::with_max_attempts(99).max_attempts(), 10);
        assert_eq!(RetryPolicy::with_max_attempts(4).max_attempts(), 4);
    }

    #[test]
    fn test_retry_once_then_stop() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.should_retry(1, 1), RetryDecision::Retry { attempt: 2 });
        assert_eq!(
            policy.should_retry(2, 1),
            RetryDecision::DoNotRetry {
                reason: "max attempts (2) exhausted".to_string()
            }
        );
    }

    #[test]
    fn test_no_retry_when_nothing_missing() {
        let policy = RetryPolicy::with_max_attempts(5);
        assert!(matches!(
            policy.should_retry(1, 0),
            RetryDecision::DoNotRetry { .. }
        ));
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let policy = RetryPolicy::with_max_attempts(1);
        assert!(matches!(
            policy.should_retry(1, 10),
            RetryDecision::DoNotRetry { .. }
        ));
    }

    #[test]
    fn test_larger_budget_allows_more_passes() {
        let policy = RetryPolicy::with_max_attempts(3);
        assert_eq!(policy.should_retry(2, 1), RetryDecision::Retry { attempt: 3 });
        assert!(matches!(
            policy.should_retry(3, 1),
            RetryDecision::DoNotRetry { .. }
        ));
    }
}
