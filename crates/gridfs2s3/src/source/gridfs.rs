//! MongoDB GridFS source
//!
//! Objects are read from `<bucket>.files` / `<bucket>.chunks`. The files
//! collection is queried directly for the listing because it carries the
//! legacy `contentType` field that the driver's GridFS API does not expose.

use async_trait::async_trait;
use chrono::DateTime;
use futures::{io::AsyncReadExt, TryStreamExt};
use mongodb::{
    bson::{doc, Bson},
    gridfs::GridFsBucket,
    options::GridFsBucketOptions,
    Client, Collection, Database,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::SourceStore;
use crate::config::SourceConfig;
use crate::error::{MigrateError, Result};
use crate::types::{ObjectDescriptor, SourceObject};

/// A document of the GridFS files collection
#[derive(Debug, Deserialize)]
struct FileEntry {
    #[serde(rename = "_id")]
    id: Bson,
    #[serde(default)]
    filename: Option<String>,
    #[serde(rename = "contentType", default)]
    content_type: Option<String>,
    #[serde(default)]
    length: i64,
    #[serde(rename = "uploadDate", default)]
    upload_date: Option<mongodb::bson::DateTime>,
}

impl FileEntry {
    fn into_descriptor(self) -> ObjectDescriptor {
        let id = match &self.id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s.clone(),
            other => other.to_string(),
        };

        ObjectDescriptor {
            id,
            name: self.filename.unwrap_or_default(),
            content_type: self.content_type.filter(|ct| !ct.is_empty()),
            size: u64::try_from(self.length).unwrap_or(0),
            created_at: self
                .upload_date
                .and_then(|d| DateTime::from_timestamp_millis(d.timestamp_millis())),
        }
    }
}

/// GridFS bucket in one MongoDB database.
///
/// Cloning shares the driver's connection pool; each operation checks out
/// its own connection, so cloned handles read in parallel.
#[derive(Clone)]
pub struct GridFsSource {
    client: Client,
    database: Database,
    bucket_name: String,
}

impl GridFsSource {
    /// Connect and ping the server. Any failure is a connection error.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let client = Client::with_uri_str(config.dsn()).await.map_err(|e| {
            MigrateError::Connection(format!("{}: {}", config.redacted_dsn(), e))
        })?;
        let database = client.database(&config.database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| MigrateError::Connection(format!("{}: {}", config.redacted_dsn(), e)))?;

        info!(dsn = %config.redacted_dsn(), bucket = %config.bucket, "Connected to MongoDB");

        Ok(Self {
            client,
            database,
            bucket_name: config.bucket.clone(),
        })
    }

    /// Shut the driver down once every handle has been dropped.
    pub async fn close(self) {
        self.client.shutdown().await;
    }

    fn files(&self) -> Collection<FileEntry> {
        self.database.collection(&format!("{}.files", self.bucket_name))
    }

    fn bucket(&self) -> GridFsBucket {
        let mut options = GridFsBucketOptions::default();
        options.bucket_name = Some(self.bucket_name.clone());
        self.database.gridfs_bucket(options)
    }
}

#[async_trait]
impl SourceStore for GridFsSource {
    fn clone_handle(&self) -> Self {
        self.clone()
    }

    #[instrument(skip(self), fields(bucket = %self.bucket_name))]
    async fn list_objects(&self) -> Result<Vec<ObjectDescriptor>> {
        let cursor = self
            .files()
            .find(doc! {})
            .sort(doc! { "filename": 1 })
            .await
            .map_err(|e| MigrateError::Enumeration(e.to_string()))?;

        let entries: Vec<FileEntry> = cursor
            .try_collect()
            .await
            .map_err(|e| MigrateError::Enumeration(e.to_string()))?;

        debug!(count = entries.len(), "Listed GridFS files");

        Ok(entries.into_iter().map(FileEntry::into_descriptor).collect())
    }

    async fn open(&self, name: &str) -> Result<SourceObject> {
        // Newest revision wins when a filename was uploaded more than once
        let entry = self
            .files()
            .find_one(doc! { "filename": name })
            .sort(doc! { "uploadDate": -1 })
            .await
            .map_err(|e| MigrateError::open(name, e))?
            .ok_or_else(|| MigrateError::NotFound(name.to_string()))?;

        let stream = self
            .bucket()
            .open_download_stream(entry.id.clone())
            .await
            .map_err(|e| MigrateError::open(name, e))?;

        let mut body = Vec::with_capacity(usize::try_from(entry.length).unwrap_or(0));
        Box::pin(stream)
            .read_to_end(&mut body)
            .await
            .map_err(|e| MigrateError::open(name, e))?;

        Ok(SourceObject {
            body,
            content_type: entry.content_type.filter(|ct| !ct.is_empty()),
        })
    }
}
