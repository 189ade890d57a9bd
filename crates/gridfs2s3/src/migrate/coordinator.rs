//! Migration coordinator
//!
//! Owns one run: starts the worker pool, enumerates the source, feeds the
//! queue in sequence order, closes it, then waits for every worker to stop
//! before reporting. Workers report each finished item over a channel, so
//! items completed by a worker aborted at the drain timeout still count.
//!
//! ```text
//! Idle -> Running -> Draining -> Done
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::enumerator::{EnumerationPlan, Enumerator, NamePolicy};
use super::key::KeyBuilder;
use super::queue::work_queue;
use super::retry::RetryPolicy;
use super::summary::{MigrationSummary, WorkerStats};
use super::worker::TransferWorker;
use crate::config::MigrationSettings;
use crate::error::{MigrateError, Result};
use crate::source::SourceStore;
use crate::storage::Destination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Running,
    Draining,
    Done,
}

pub struct MigrationCoordinator<S, D: ?Sized> {
    source: S,
    destination: Arc<D>,
    keys: KeyBuilder,
    settings: MigrationSettings,
    state: CoordinatorState,
}

impl<S, D> MigrationCoordinator<S, D>
where
    S: SourceStore,
    D: Destination + ?Sized,
{
    /// `source` is used for the listing; each worker gets its own clone.
    pub fn new(
        source: S,
        destination: Arc<D>,
        keys: KeyBuilder,
        settings: MigrationSettings,
    ) -> Self {
        Self {
            source,
            destination,
            keys,
            settings,
            state: CoordinatorState::Idle,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Give back the coordinator's own source handle, e.g. to close it.
    pub fn into_source(self) -> S {
        self.source
    }

    fn transition(&mut self, next: CoordinatorState) {
        debug!(from = ?self.state, to = ?next, "Coordinator state change");
        self.state = next;
    }

    /// Migrate everything the source lists.
    ///
    /// Only invalid settings and enumeration failures are returned as errors.
    /// Per-item failures are counted in the summary.
    pub async fn run(&mut self) -> Result<MigrationSummary> {
        if self.state != CoordinatorState::Idle {
            return Err(MigrateError::Worker(
                "a coordinator runs only once".to_string(),
            ));
        }
        self.settings.validate()?;

        let started = Instant::now();
        self.transition(CoordinatorState::Running);

        info!(
            workers = self.settings.workers,
            queue_capacity = self.settings.queue_capacity,
            max_attempts = self.settings.max_retry_attempts,
            base = %self.keys.base(),
            "Starting migration"
        );

        let (queue, receiver) = work_queue(self.settings.queue_capacity);
        let retry = RetryPolicy::from_settings(&self.settings);
        let (reports, mut outcomes) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for id in 1..=self.settings.workers {
            let worker = TransferWorker::new(
                id,
                self.source.clone_handle(),
                Arc::clone(&self.destination),
                self.keys.clone(),
                retry,
            )
            .report_to(reports.clone());
            workers.spawn(worker.run(receiver.clone()));
        }
        drop(receiver);
        drop(reports);

        let policy = NamePolicy::from_settings(&self.settings);
        let listed = Enumerator::new(&self.source, policy).enumerate().await;
        let plan = match listed {
            Ok(plan) => plan,
            Err(e) => {
                error!(error = %e, "Enumeration failed, stopping workers");
                queue.close();
                Self::join_workers(&mut workers).await;
                self.transition(CoordinatorState::Done);
                return Err(e);
            }
        };

        let EnumerationPlan {
            found,
            items,
            rejected,
            duplicates,
        } = plan;
        let eligible = items.len();

        for (queued, item) in items.into_iter().enumerate() {
            if let Err(item) = queue.push(item).await {
                error!(
                    position = %item.position(),
                    not_queued = eligible - queued,
                    "Every worker has stopped, abandoning the rest of the run"
                );
                break;
            }
        }

        self.transition(CoordinatorState::Draining);
        queue.close();

        let drained = match self.settings.drain_timeout {
            None => {
                Self::join_workers(&mut workers).await;
                true
            }
            Some(limit) => tokio::time::timeout(limit, Self::join_workers(&mut workers))
                .await
                .is_ok(),
        };

        if !drained {
            warn!(
                remaining = workers.len(),
                "Drain timeout elapsed, aborting remaining workers"
            );
            workers.abort_all();
            Self::join_workers(&mut workers).await;
        }

        // Every sender went away with its worker task
        let mut totals = WorkerStats::default();
        while let Some(counted) = outcomes.recv().await {
            totals += counted;
        }

        self.transition(CoordinatorState::Done);

        let summary = MigrationSummary {
            found,
            eligible,
            duplicates,
            rejected: rejected.len(),
            succeeded: totals.succeeded,
            failed: totals.failed,
            unfinished: eligible.saturating_sub(totals.succeeded + totals.failed),
            bytes_transferred: totals.bytes_transferred,
            attempts: totals.attempts,
            elapsed: started.elapsed(),
        };
        summary.log();

        Ok(summary)
    }

    async fn join_workers(workers: &mut JoinSet<WorkerStats>) {
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(_) => {}
                Err(e) if e.is_cancelled() => warn!("Worker aborted before finishing"),
                Err(e) => error!(error = %MigrateError::Worker(e.to_string()), "Worker died"),
            }
        }
    }
}
