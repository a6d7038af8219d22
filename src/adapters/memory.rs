use crate::domain::model::ObjectInfo;
use crate::domain::ports::{ObjectListing, ObjectSink, ObjectStore};
use crate::utils::compression::gunzip;
use crate::utils::error::{ImporterError, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<String, BTreeMap<String, StoredObject>>,
    failing_listings: HashMap<String, usize>,
    failing_writes: HashSet<String>,
}

/// In-process object store. Objects are listed in name order and written
/// objects are stamped with the wall-clock time of their `close`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    writes_opened: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn put_object(&self, bucket: &str, name: &str, data: Vec<u8>, updated_at: DateTime<Utc>) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(name.to_string(), StoredObject { data, updated_at });
    }

    pub fn object(&self, bucket: &str, name: &str) -> Option<Vec<u8>> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .map(|object| object.data.clone())
    }

    pub fn object_names(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Listings of `bucket` yield `items` entries and then fail.
    pub fn fail_listing_after(&self, bucket: &str, items: usize) {
        self.lock()
            .failing_listings
            .insert(bucket.to_string(), items);
    }

    /// Every sink opened on `bucket` fails on close.
    pub fn fail_writes_to(&self, bucket: &str) {
        self.lock().failing_writes.insert(bucket.to_string());
    }

    pub fn writes_opened(&self) -> usize {
        self.writes_opened.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryStore {
    type Sink = MemorySink;

    fn list_objects<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectListing<'a> {
        let state = self.lock();
        let mut items: Vec<Result<ObjectInfo>> = state
            .buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(name, _)| name.starts_with(prefix))
                    .map(|(name, object)| {
                        Ok(ObjectInfo {
                            name: name.clone(),
                            size: object.data.len() as i64,
                            updated_at: object.updated_at,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(&limit) = state.failing_listings.get(bucket) {
            items.truncate(limit);
            items.push(Err(ImporterError::store(
                "list_objects",
                format!("listing of {} interrupted", bucket),
            )));
        }

        stream::iter(items).boxed()
    }

    async fn read_object(&self, bucket: &str, name: &str, decompress: bool) -> Result<Vec<u8>> {
        let data = self
            .object(bucket, name)
            .ok_or_else(|| ImporterError::ObjectNotFound {
                bucket: bucket.to_string(),
                name: name.to_string(),
            })?;

        if decompress {
            gunzip(name, &data)
        } else {
            Ok(data)
        }
    }

    async fn open_write(&self, bucket: &str, name: &str) -> Result<MemorySink> {
        self.writes_opened.fetch_add(1, Ordering::SeqCst);
        let fail_on_close = self.lock().failing_writes.contains(bucket);
        Ok(MemorySink {
            store: self.clone(),
            bucket: bucket.to_string(),
            name: name.to_string(),
            buffer: Vec::new(),
            fail_on_close,
        })
    }
}

pub struct MemorySink {
    store: MemoryStore,
    bucket: String,
    name: String,
    buffer: Vec<u8>,
    fail_on_close: bool,
}

impl ObjectSink for MemorySink {
    async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    async fn close(self) -> Result<()> {
        if self.fail_on_close {
            return Err(ImporterError::write(&self.name, "upload rejected"));
        }
        self.store
            .put_object(&self.bucket, &self.name, self.buffer, Utc::now());
        Ok(())
    }
}
