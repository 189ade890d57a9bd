//! Shared test doubles for pipeline integration tests
//!
//! [`MemorySource`] and [`MemoryDestination`] stand in for GridFS and S3.
//! Both record every call so tests can assert on attempt counts, and both
//! can be told to fail for specific names or keys.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use gridfs2s3::config::MigrationSettings;
use gridfs2s3::migrate::KeyBuilder;
use gridfs2s3::source::SourceStore;
use gridfs2s3::storage::Destination;
use gridfs2s3::{MigrateError, ObjectDescriptor, Result, SourceObject};

/// Install a test-friendly subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn keys() -> KeyBuilder {
    KeyBuilder::new("shop", "prod", "uploads")
}

pub fn settings(workers: usize, queue_capacity: usize) -> MigrationSettings {
    MigrationSettings {
        workers,
        queue_capacity,
        ..MigrationSettings::default()
    }
}

// ============================================================================
// Source
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broken {
    /// Listed, but gone by the time it is opened
    Missing,
    /// Present but its content cannot be read
    Unreadable,
}

struct StoredObject {
    descriptor: ObjectDescriptor,
    body: Vec<u8>,
}

#[derive(Default)]
struct SourceState {
    objects: Mutex<Vec<StoredObject>>,
    broken: Mutex<HashMap<String, Broken>>,
    listing_fails: AtomicBool,
    open_calls: Mutex<HashMap<String, usize>>,
    handles: AtomicUsize,
}

/// In-memory source store. Clones share state.
#[derive(Clone, Default)]
pub struct MemorySource {
    state: Arc<SourceState>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source holding one small object per name, listed in the given order.
    pub fn with_names(names: &[&str]) -> Self {
        let source = Self::new();
        for name in names {
            source.add(name, format!("content of {}", name).into_bytes(), None);
        }
        source
    }

    pub fn add(&self, name: &str, body: Vec<u8>, content_type: Option<&str>) -> String {
        let mut objects = self.state.objects.lock().unwrap();
        let id = format!("oid-{:04}", objects.len());
        let mut descriptor = ObjectDescriptor::new(id.clone(), name, body.len() as u64);
        descriptor.content_type = content_type.map(str::to_string);
        objects.push(StoredObject { descriptor, body });
        id
    }

    pub fn break_object(&self, name: &str, how: Broken) {
        self.state
            .broken
            .lock()
            .unwrap()
            .insert(name.to_string(), how);
    }

    pub fn fail_listing(&self) {
        self.state.listing_fails.store(true, Ordering::SeqCst);
    }

    pub fn open_calls(&self, name: &str) -> usize {
        self.state
            .open_calls
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Handles created through `clone_handle`
    pub fn handles(&self) -> usize {
        self.state.handles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceStore for MemorySource {
    fn clone_handle(&self) -> Self {
        self.state.handles.fetch_add(1, Ordering::SeqCst);
        self.clone()
    }

    async fn list_objects(&self) -> Result<Vec<ObjectDescriptor>> {
        if self.state.listing_fails.load(Ordering::SeqCst) {
            return Err(MigrateError::Enumeration("cursor killed".to_string()));
        }

        let mut listing: Vec<ObjectDescriptor> = self
            .state
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.descriptor.clone())
            .collect();
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }

    async fn open(&self, name: &str) -> Result<SourceObject> {
        *self
            .state
            .open_calls
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default() += 1;

        match self.state.broken.lock().unwrap().get(name) {
            Some(Broken::Missing) => return Err(MigrateError::NotFound(name.to_string())),
            Some(Broken::Unreadable) => return Err(MigrateError::open(name, "chunk 3 missing")),
            None => {}
        }

        self.state
            .objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.descriptor.name == name)
            .map(|o| SourceObject {
                body: o.body.clone(),
                content_type: o.descriptor.content_type.clone(),
            })
            .ok_or_else(|| MigrateError::NotFound(name.to_string()))
    }
}

// ============================================================================
// Destination
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Failure {
    Always,
    FirstN(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// In-memory destination store
#[derive(Default)]
pub struct MemoryDestination {
    stored: Mutex<HashMap<String, Stored>>,
    calls: Mutex<HashMap<String, usize>>,
    call_times: Mutex<HashMap<String, Vec<Instant>>>,
    failures: Mutex<HashMap<String, Failure>>,
    delay: Option<Duration>,
    fail_everything: bool,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload fails
    pub fn broken() -> Self {
        Self {
            fail_everything: true,
            ..Self::default()
        }
    }

    /// Every upload takes `delay` before completing
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn fail_always(&self, key: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(key.to_string(), Failure::Always);
    }

    pub fn fail_first(&self, key: &str, times: usize) {
        self.failures
            .lock()
            .unwrap()
            .insert(key.to_string(), Failure::FirstN(times));
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// When each upload of `key` started, in call order
    pub fn call_times(&self, key: &str) -> Vec<Instant> {
        self.call_times
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn stored(&self, key: &str) -> Option<Stored> {
        self.stored.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.stored.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<String> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(key.to_string()).or_default();
            *count += 1;
            *count
        };
        self.call_times
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(Instant::now());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().unwrap().get(key).copied();
        let fails = self.fail_everything
            || match failure {
                Some(Failure::Always) => true,
                Some(Failure::FirstN(n)) => call <= n,
                None => false,
            };
        if fails {
            return Err(MigrateError::transfer(key, "503 Slow Down"));
        }

        self.stored.lock().unwrap().insert(
            key.to_string(),
            Stored {
                body,
                content_type: content_type.map(str::to_string),
            },
        );

        Ok(format!("memory://{}", key))
    }
}
