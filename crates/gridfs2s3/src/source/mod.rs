//! Source store
//!
//! [`SourceStore`] is the read side of a migration. The pipeline lists the
//! store once, then each worker opens objects through its own handle.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ObjectDescriptor, SourceObject};

pub mod gridfs;

pub use gridfs::GridFsSource;

#[async_trait]
pub trait SourceStore: Send + Sync + 'static {
    /// An independent handle on the same backing session, so that workers do
    /// not serialize their reads on one connection.
    fn clone_handle(&self) -> Self
    where
        Self: Sized;

    /// Every object in the store, sorted by name ascending.
    ///
    /// Fails with [`crate::MigrateError::Enumeration`] if the listing cannot
    /// be fully read.
    async fn list_objects(&self) -> Result<Vec<ObjectDescriptor>>;

    /// Read the object called `name` in full.
    ///
    /// Fails with [`crate::MigrateError::NotFound`] when no such object
    /// exists and [`crate::MigrateError::Open`] when it cannot be read.
    async fn open(&self, name: &str) -> Result<SourceObject>;
}
