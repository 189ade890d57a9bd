//! Destination store
//!
//! The pipeline only needs one operation from the destination: put a byte
//! body under a key. [`Destination`] captures that; [`S3Destination`] is the
//! production implementation.

use async_trait::async_trait;

use crate::error::Result;

pub mod config;
pub mod s3;

pub use config::DestinationConfig;
pub use s3::S3Destination;

/// Write side of the migration.
///
/// Implementations are shared by every worker and must tolerate concurrent
/// calls.
#[async_trait]
pub trait Destination: Send + Sync + 'static {
    /// Store `body` under `key` and return the object's location.
    ///
    /// Failures are reported as [`crate::MigrateError::Transfer`] so the
    /// caller can retry them.
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<String>;
}
