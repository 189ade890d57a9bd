//! gridfs2s3 Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Migrates every file of a MongoDB GridFS bucket into an S3 bucket.
//!
//! # Overview
//!
//! - **Source**: [`source::SourceStore`], implemented for GridFS by
//!   [`source::GridFsSource`]
//! - **Destination**: [`storage::Destination`], implemented for S3 and
//!   S3-compatible stores by [`storage::S3Destination`]
//! - **Pipeline**: [`migrate`], which enumerates and deduplicates the source,
//!   feeds a bounded queue and runs a fixed pool of retrying transfer workers
//! - **Configuration**: [`config::Config`], built once at startup and passed
//!   down explicitly
//!
//! Flat GridFS names encode folders with underscores: `invoices_2019_march.pdf`
//! is stored at `<project>/<environment>/<prefix>/invoices/2019/march.pdf`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gridfs2s3::config::{MigrationSettings, SourceConfig};
//! use gridfs2s3::migrate::MigrationCoordinator;
//! use gridfs2s3::source::GridFsSource;
//! use gridfs2s3::storage::{DestinationConfig, S3Destination};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let destination_config = DestinationConfig::new("media-archive", "shop", "prod");
//!     let source = GridFsSource::connect(&SourceConfig::from_env()?).await?;
//!     let destination = S3Destination::connect(&destination_config).await?;
//!
//!     let mut coordinator = MigrationCoordinator::new(
//!         source,
//!         Arc::new(destination),
//!         destination_config.key_builder(),
//!         MigrationSettings::default(),
//!     );
//!     let summary = coordinator.run().await?;
//!     assert!(summary.is_balanced());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod migrate;
pub mod source;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use cli::Cli;
pub use config::Config;
pub use error::{MigrateError, Result};
pub use migrate::{MigrationCoordinator, MigrationSummary};
pub use types::{ObjectDescriptor, SourceObject, WorkItem};
