//! gridfs2s3 Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Ambient pieces shared by the gridfs2s3 workspace members:
//!
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Formatting**: human-readable byte sizes for log lines
//!
//! # Example
//!
//! ```no_run
//! use gridfs2s3_common::format::format_bytes;
//! use gridfs2s3_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!(size = %format_bytes(5_242_880), "object copied");
//!     Ok(())
//! }
//! ```

pub mod format;
pub mod logging;

pub use format::format_bytes;
