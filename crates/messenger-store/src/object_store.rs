//! In-memory object storage
//!
//! Buckets of blobs with stable public URLs.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use messenger_core::{DomainError, ObjectStore, PortResult};

/// Stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object store keeping blobs in memory
#[derive(Debug)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), StoredObject>,
    public_base: String,
    max_bytes: usize,
    failing: AtomicBool,
}

impl MemoryObjectStore {
    /// Create a store serving public URLs under `public_base`
    #[must_use]
    pub fn new(public_base: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            objects: DashMap::new(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
            max_bytes,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every upload fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::ObjectStore("storage unavailable".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(DomainError::ObjectStore(format!(
                "{key} is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }

        let id = (bucket.to_string(), key.to_string());
        if !upsert && self.objects.contains_key(&id) {
            return Err(DomainError::ObjectStore(format!("{bucket}/{key} already exists")));
        }

        tracing::debug!(bucket, key, size = bytes.len(), "Object uploaded");
        self.objects.insert(
            id,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> PortResult<String> {
        if !self
            .objects
            .contains_key(&(bucket.to_string(), key.to_string()))
        {
            return Err(DomainError::ObjectNotFound(format!("{bucket}/{key}")));
        }
        Ok(format!("{}/{bucket}/{key}", self.public_base))
    }
}
