//! In-memory reference backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::blob_id::BlobId;
use crate::bucket::BucketName;
use crate::error::{BlobStoreError, Result};
use crate::raw_store::RawBlobStore;

type Key = (BucketName, BlobId);

/// A [`RawBlobStore`] keeping every payload in a process-local map.
///
/// Cloning shares the underlying map. Writes are write-if-absent, so racing
/// puts of the same key leave exactly one entry. Counts the `put` calls that
/// reached it, which lets tests observe physical writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    blobs: RwLock<HashMap<Key, Bytes>>,
    puts: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physical entries across all buckets
    pub fn len(&self) -> usize {
        self.inner.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries in `bucket`
    pub fn bucket_len(&self, bucket: &BucketName) -> usize {
        self.inner
            .blobs
            .read()
            .keys()
            .filter(|(b, _)| b == bucket)
            .count()
    }

    /// Number of `put` calls received, including ones that found the key present
    pub fn put_count(&self) -> usize {
        self.inner.puts.load(Ordering::SeqCst)
    }

    pub fn contains(&self, bucket: &BucketName, id: &BlobId) -> bool {
        self.inner
            .blobs
            .read()
            .contains_key(&(bucket.clone(), *id))
    }

    /// Total payload bytes held
    pub fn total_size(&self) -> usize {
        self.inner.blobs.read().values().map(Bytes::len).sum()
    }
}

#[async_trait]
impl RawBlobStore for MemoryBlobStore {
    async fn exists(&self, bucket: &BucketName, id: &BlobId) -> Result<bool> {
        Ok(self.contains(bucket, id))
    }

    async fn get(&self, bucket: &BucketName, id: &BlobId) -> Result<Bytes> {
        self.inner
            .blobs
            .read()
            .get(&(bucket.clone(), *id))
            .cloned()
            .ok_or_else(|| BlobStoreError::not_found(bucket, id))
    }

    async fn put(&self, bucket: &BucketName, id: &BlobId, data: Bytes) -> Result<()> {
        self.inner.puts.fetch_add(1, Ordering::SeqCst);
        self.inner
            .blobs
            .write()
            .entry((bucket.clone(), *id))
            .or_insert(data);
        Ok(())
    }

    async fn delete(&self, bucket: &BucketName, id: &BlobId) -> Result<()> {
        self.inner.blobs.write().remove(&(bucket.clone(), *id));
        Ok(())
    }
}
