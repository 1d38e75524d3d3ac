//! # Operation Status Module
//!
//! ## Purpose
//! The five-valued status vocabulary surfaced to callers, and the single
//! aggregation rule shared by every batch component (reindexing, cache
//! clearing, artifact regeneration).
//!
//! ## Input/Output Specification
//! - **Input**: per-item outcomes or `(attempted, succeeded)` counts
//! - **Output**: one aggregate `OperationStatus` per batch
//! - **Rule**: `Succeeded` iff every attempted item succeeded, `Failed` iff
//!   none did, `PartiallySucceeded` otherwise; zero attempted items is
//!   `FailedToStart`, which is distinct from `Failed`
//!
//! The aggregate is only ever computed once a batch has finished; no partial
//! aggregation is exposed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a batch operation as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// The operation had nothing to do, typically because the relevant
    /// directory is not configured. Not an error.
    Idle,
    /// The operation never processed a single item.
    FailedToStart,
    /// Every attempted item failed.
    Failed,
    /// Some attempted items succeeded, some failed.
    PartiallySucceeded,
    /// Every attempted item succeeded.
    Succeeded,
}

impl OperationStatus {
    /// Aggregate a finished batch from plain counts.
    pub fn from_counts(attempted: usize, succeeded: usize) -> Self {
        debug_assert!(succeeded <= attempted);

        if attempted == 0 {
            OperationStatus::FailedToStart
        } else if succeeded == attempted {
            OperationStatus::Succeeded
        } else if succeeded > 0 {
            OperationStatus::PartiallySucceeded
        } else {
            OperationStatus::Failed
        }
    }

    /// Whether this per-item outcome counts towards the aggregate's
    /// succeeded tally. A partially succeeded item still contributed work.
    pub fn contributes(&self) -> bool {
        matches!(
            self,
            OperationStatus::Succeeded | OperationStatus::PartiallySucceeded
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationStatus::Idle => "idle",
            OperationStatus::FailedToStart => "failed to start",
            OperationStatus::Failed => "failed",
            OperationStatus::PartiallySucceeded => "partially succeeded",
            OperationStatus::Succeeded => "succeeded",
        };
        f.write_str(label)
    }
}

/// Running tally of per-item statuses for a batch in progress.
///
/// Items whose outcome was `Succeeded` are distinguished from items that only
/// partially succeeded: the aggregate counts both as contributions, but a
/// batch is only fully `Succeeded` when every item fully succeeded.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusTally {
    attempted: usize,
    fully_succeeded: usize,
    partially_succeeded: usize,
}

impl StatusTally {
    /// Record the outcome of one item.
    pub fn record(&mut self, status: OperationStatus) {
        self.attempted += 1;
        match status {
            OperationStatus::Succeeded => self.fully_succeeded += 1,
            OperationStatus::PartiallySucceeded => self.partially_succeeded += 1,
            _ => {}
        }
    }

    /// Number of items recorded so far.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Number of items whose outcome contributed to the batch.
    pub fn succeeded(&self) -> usize {
        self.fully_succeeded + self.partially_succeeded
    }

    /// Aggregate status for the finished batch.
    pub fn aggregate(&self) -> OperationStatus {
        if self.attempted == 0 {
            OperationStatus::FailedToStart
        } else if self.fully_succeeded == self.attempted {
            OperationStatus::Succeeded
        } else if self.succeeded() > 0 {
            OperationStatus::PartiallySucceeded
        } else {
            OperationStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts_truth_table() {
        // The three-way rule must hold across the whole range.
        for attempted in 1..=8usize {
            for succeeded in 0..=attempted {
                let status = OperationStatus::from_counts(attempted, succeeded);
                if succeeded == attempted {
                    assert_eq!(status, OperationStatus::Succeeded);
                } else if succeeded == 0 {
                    assert_eq!(status, OperationStatus::Failed);
                } else {
                    assert_eq!(status, OperationStatus::PartiallySucceeded);
                }
            }
        }
    }

    #[test]
    fn test_zero_attempted_is_failed_to_start() {
        assert_eq!(
            OperationStatus::from_counts(0, 0),
            OperationStatus::FailedToStart
        );
        assert_ne!(
            OperationStatus::from_counts(0, 0),
            OperationStatus::Failed
        );
    }

    #[test]
    fn test_tally_counts_partial_as_contribution() {
        let mut tally = StatusTally::default();
        tally.record(OperationStatus::Succeeded);
        tally.record(OperationStatus::PartiallySucceeded);
        assert_eq!(tally.attempted(), 2);
        assert_eq!(tally.succeeded(), 2);
        // One item only partially succeeded, so the batch is partial.
        assert_eq!(tally.aggregate(), OperationStatus::PartiallySucceeded);
    }

    #[test]
    fn test_tally_all_failed() {
        let mut tally = StatusTally::default();
        tally.record(OperationStatus::Failed);
        tally.record(OperationStatus::Failed);
        assert_eq!(tally.aggregate(), OperationStatus::Failed);
    }

    #[test]
    fn test_tally_empty() {
        let tally = StatusTally::default();
        assert_eq!(tally.aggregate(), OperationStatus::FailedToStart);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OperationStatus::PartiallySucceeded).unwrap();
        assert_eq!(json, "\"partially_succeeded\"");
    }
}
