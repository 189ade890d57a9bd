//! Retry schedule for object transfers

use rand::Rng;
use std::time::Duration;

use crate::config::MigrationSettings;

/// Fixed attempt budget with flat random jitter.
///
/// Attempt 0 starts immediately. Every later attempt waits a uniformly random
/// delay in `[0, max_jitter)`; there is no exponential growth, the jitter only
/// keeps workers that failed together from retrying together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    max_jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, max_jitter: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            max_jitter,
        }
    }

    pub fn from_settings(settings: &MigrationSettings) -> Self {
        Self::new(settings.max_retry_attempts, settings.retry_jitter)
    }

    /// Total attempts per object, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait before `attempt` (0-indexed).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let bound = self.max_jitter.as_millis() as u64;
        if attempt == 0 || bound == 0 {
            return Duration::ZERO;
        }

        Duration::from_millis(rand::rng().random_range(0..bound))
    }
}
