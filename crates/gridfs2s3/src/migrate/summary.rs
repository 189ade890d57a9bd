//! Aggregate counters of a run

use std::ops::AddAssign;
use std::time::Duration;

use gridfs2s3_common::format_bytes;
use serde::Serialize;
use tracing::{info, warn};

/// Outcome counts of one item, or summed over a worker or a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub succeeded: usize,
    /// Items abandoned after exhausting retries or failing to open
    pub failed: usize,
    pub bytes_transferred: u64,
    /// Attempts made, across all items
    pub attempts: u64,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.bytes_transferred += other.bytes_transferred;
        self.attempts += other.attempts;
    }
}

/// Final report of a migration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub found: usize,
    pub eligible: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Eligible items with no recorded outcome, because their worker was
    /// aborted at the drain timeout or died
    pub unfinished: usize,
    pub bytes_transferred: u64,
    pub attempts: u64,
    pub elapsed: Duration,
}

impl MigrationSummary {
    /// `succeeded + rejected + failed + unfinished == found - duplicates`
    pub fn is_balanced(&self) -> bool {
        self.succeeded + self.rejected + self.failed + self.unfinished
            == self.found.saturating_sub(self.duplicates)
    }

    /// Every eligible item was transferred
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.unfinished == 0 && self.succeeded == self.eligible
    }

    pub fn log(&self) {
        info!(
            found = self.found,
            eligible = self.eligible,
            duplicates = self.duplicates,
            rejected = self.rejected,
            succeeded = self.succeeded,
            failed = self.failed,
            unfinished = self.unfinished,
            attempts = self.attempts,
            bytes = self.bytes_transferred,
            "Migration finished: {} uploaded ({}) in {:.1} minutes",
            self.succeeded,
            format_bytes(self.bytes_transferred),
            self.elapsed.as_secs_f64() / 60.0
        );

        if self.failed > 0 || self.unfinished > 0 {
            warn!(
                failed = self.failed,
                unfinished = self.unfinished,
                "Some objects were not migrated"
            );
        }
    }
}
