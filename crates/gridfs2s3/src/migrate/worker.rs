//! Transfer worker
//!
//! A worker pulls items off the shared queue until it is closed and drained.
//! For each item it opens the object from its own source handle, resolves
//! the content type and destination key, and uploads through the shared
//! destination. Upload failures are retried with jitter; a missing or
//! unreadable object abandons the item at once.

use std::sync::Arc;

use gridfs2s3_common::format_bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::key::KeyBuilder;
use super::queue::WorkReceiver;
use super::retry::RetryPolicy;
use super::summary::WorkerStats;
use crate::error::{MigrateError, Result};
use crate::source::SourceStore;
use crate::storage::Destination;
use crate::types::WorkItem;

/// Terminal result of one item
#[derive(Debug)]
pub enum TransferOutcome {
    Succeeded {
        location: String,
        bytes: u64,
        attempts: u32,
    },
    /// Every attempt failed to upload
    Exhausted { attempts: u32, error: MigrateError },
    /// The object could not be opened; no further attempts were made
    Abandoned { attempts: u32, error: MigrateError },
}

impl TransferOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            TransferOutcome::Succeeded { attempts, .. }
            | TransferOutcome::Exhausted { attempts, .. }
            | TransferOutcome::Abandoned { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Succeeded { .. })
    }
}

struct Uploaded {
    location: String,
    bytes: u64,
}

pub struct TransferWorker<S, D: ?Sized> {
    id: usize,
    source: S,
    destination: Arc<D>,
    keys: KeyBuilder,
    retry: RetryPolicy,
    reports: Option<mpsc::UnboundedSender<WorkerStats>>,
}

impl<S, D> TransferWorker<S, D>
where
    S: SourceStore,
    D: Destination + ?Sized,
{
    /// `source` must be a handle owned by this worker alone.
    pub fn new(
        id: usize,
        source: S,
        destination: Arc<D>,
        keys: KeyBuilder,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            id,
            source,
            destination,
            keys,
            retry,
            reports: None,
        }
    }

    /// Send the counts of every finished item to `reports` as soon as the
    /// item is done.
    pub fn report_to(mut self, reports: mpsc::UnboundedSender<WorkerStats>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Process items until the queue is closed and empty.
    pub async fn run(self, queue: WorkReceiver) -> WorkerStats {
        info!(worker = self.id, "Worker started");
        let mut stats = WorkerStats::default();

        while let Some(mut item) = queue.pull().await {
            let outcome = self.transfer_with_retry(&mut item).await;
            let mut counted = WorkerStats {
                attempts: u64::from(outcome.attempts()),
                ..WorkerStats::default()
            };

            match outcome {
                TransferOutcome::Succeeded { bytes, .. } => {
                    counted.succeeded = 1;
                    counted.bytes_transferred = bytes;
                }
                TransferOutcome::Exhausted { attempts, error } => {
                    error!(
                        worker = self.id,
                        position = %item.position(),
                        name = %item.name(),
                        attempts,
                        error = %error,
                        "Critical: giving up on {} after {} attempts",
                        item.name(),
                        attempts
                    );
                    counted.failed = 1;
                }
                TransferOutcome::Abandoned { error, .. } => {
                    error!(
                        worker = self.id,
                        position = %item.position(),
                        name = %item.name(),
                        error = %error,
                        "Critical: cannot read {} from source",
                        item.name()
                    );
                    counted.failed = 1;
                }
            }

            stats += counted;
            if let Some(reports) = &self.reports {
                // Receiver gone means nobody is counting any more
                let _ = reports.send(counted);
            }
        }

        info!(
            worker = self.id,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Worker stopped"
        );
        stats
    }

    /// Run attempts until one succeeds, the object cannot be opened, or the
    /// attempt budget is spent. `item.retry_attempt` tracks the attempt in
    /// progress.
    pub async fn transfer_with_retry(&self, item: &mut WorkItem) -> TransferOutcome {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            item.retry_attempt = attempt;

            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                debug!(
                    worker = self.id,
                    name = %item.name(),
                    delay_ms = delay.as_millis() as u64,
                    "Waiting before retry"
                );
                tokio::time::sleep(delay).await;
            }

            match self.transfer_once(item).await {
                Ok(uploaded) => {
                    return TransferOutcome::Succeeded {
                        location: uploaded.location,
                        bytes: uploaded.bytes,
                        attempts: attempt + 1,
                    }
                }
                Err(error) if error.is_retryable() => {
                    attempt += 1;
                    warn!(
                        worker = self.id,
                        name = %item.name(),
                        attempt,
                        max_attempts,
                        error = %error,
                        "Upload attempt failed"
                    );
                    if attempt >= max_attempts {
                        return TransferOutcome::Exhausted {
                            attempts: attempt,
                            error,
                        };
                    }
                }
                Err(error) => {
                    return TransferOutcome::Abandoned {
                        attempts: attempt + 1,
                        error,
                    }
                }
            }
        }
    }

    async fn transfer_once(&self, item: &WorkItem) -> Result<Uploaded> {
        let started = Instant::now();

        let opened = self.source.open(item.name()).await?;
        let content_type = resolve_content_type(
            opened.content_type.as_deref(),
            item.object.content_type.as_deref(),
            item.name(),
        );
        let key = self.keys.key_for(item.name());
        let bytes = opened.body.len() as u64;

        let location = self
            .destination
            .upload(&key, opened.body, content_type.as_deref())
            .await?;

        info!(
            worker = self.id,
            position = %item.position(),
            location = %location,
            content_type = content_type.as_deref().unwrap_or(""),
            bytes,
            "{} Done: {} in {:.2} secs, size {}",
            item.position(),
            location,
            started.elapsed().as_secs_f64(),
            format_bytes(bytes)
        );

        Ok(Uploaded { location, bytes })
    }
}

/// The type declared when the object was opened, else the one from the
/// listing, else a guess from the name's extension.
pub fn resolve_content_type(
    opened: Option<&str>,
    listed: Option<&str>,
    name: &str,
) -> Option<String> {
    let declared = |ct: &&str| !ct.trim().is_empty();
    opened
        .filter(declared)
        .or(listed.filter(declared))
        .map(str::to_string)
        .or_else(|| mime_guess::from_path(name).first().map(|m| m.to_string()))
}
