//! Data model shared by the source store and the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One object as listed by the source store. Never modified after listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Source-assigned identifier (hex ObjectId for GridFS)
    pub id: String,
    /// Logical filename; may be empty
    pub name: String,
    /// MIME type declared at upload time, if any
    pub content_type: Option<String>,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
}

impl ObjectDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_type: None,
            size,
            created_at: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// An object queued for transfer, tagged with its place in the run.
///
/// Owned by exactly one worker from the moment it is pulled off the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub object: ObjectDescriptor,
    /// 1-based position in the deduplicated, ordered eligible set
    pub sequence_number: usize,
    /// Size of the eligible set; identical for every item of a run
    pub total_count: usize,
    /// Attempt currently in progress, starting at 0
    pub retry_attempt: u32,
}

impl WorkItem {
    pub fn new(object: ObjectDescriptor, sequence_number: usize, total_count: usize) -> Self {
        Self {
            object,
            sequence_number,
            total_count,
            retry_attempt: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// "n/total", as printed in progress lines
    pub fn position(&self) -> String {
        format!("{}/{}", self.sequence_number, self.total_count)
    }
}

/// Bytes and declared type of an opened source object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}
