//! The transfer pipeline
//!
//! enumeration -> deduplication -> bounded queue -> retrying workers -> drain

pub mod coordinator;
pub mod enumerator;
pub mod key;
pub mod queue;
pub mod retry;
pub mod summary;
pub mod worker;

pub use coordinator::{CoordinatorState, MigrationCoordinator};
pub use enumerator::{plan, EnumerationPlan, Enumerator, NamePolicy, RejectReason, Rejection};
pub use key::{normalize_path, KeyBuilder};
pub use queue::{work_queue, WorkReceiver, WorkSender};
pub use retry::RetryPolicy;
pub use summary::{MigrationSummary, WorkerStats};
pub use worker::{resolve_content_type, TransferOutcome, TransferWorker};
