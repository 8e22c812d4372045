//! Fault injection for exercising backend failure paths.
//!
//! [`FaultyBlobStore`] wraps any backend and can be paused, made to fail a
//! single write, or made to hang, without the wrapped store noticing.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::blob_id::BlobId;
use crate::bucket::BucketName;
use crate::error::{BlobStoreError, Result};
use crate::raw_store::RawBlobStore;

const AVAILABLE: u8 = 0;
const UNAVAILABLE: u8 = 1;
const STALLED: u8 = 2;

#[derive(Debug, Default)]
struct Faults {
    mode: AtomicU8,
    fail_next_put: AtomicBool,
}

/// Backend wrapper whose availability is controlled by the test.
///
/// Clones share the same fault switches.
#[derive(Debug, Clone)]
pub struct FaultyBlobStore<S> {
    inner: S,
    faults: Arc<Faults>,
}

impl<S: RawBlobStore> FaultyBlobStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Pause or resume the backend. While paused every call fails with
    /// `BackendUnavailable`.
    pub fn set_available(&self, available: bool) {
        let mode = if available { AVAILABLE } else { UNAVAILABLE };
        self.faults.mode.store(mode, Ordering::SeqCst);
    }

    /// Make every subsequent call hang without ever completing
    pub fn stall(&self) {
        self.faults.mode.store(STALLED, Ordering::SeqCst);
    }

    /// Fail the next `put` only; the wrapped store never sees it
    pub fn fail_next_put(&self) {
        self.faults.fail_next_put.store(true, Ordering::SeqCst);
    }

    async fn check(&self, op: &str) -> Result<()> {
        match self.faults.mode.load(Ordering::SeqCst) {
            UNAVAILABLE => Err(BlobStoreError::unavailable(format!(
                "{op}: backend paused"
            ))),
            STALLED => std::future::pending().await,
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<S: RawBlobStore> RawBlobStore for FaultyBlobStore<S> {
    async fn exists(&self, bucket: &BucketName, id: &BlobId) -> Result<bool> {
        self.check("exists").await?;
        self.inner.exists(bucket, id).await
    }

    async fn get(&self, bucket: &BucketName, id: &BlobId) -> Result<Bytes> {
        self.check("get").await?;
        self.inner.get(bucket, id).await
    }

    async fn put(&self, bucket: &BucketName, id: &BlobId, data: Bytes) -> Result<()> {
        self.check("put").await?;
        if self.faults.fail_next_put.swap(false, Ordering::SeqCst) {
            return Err(BlobStoreError::unavailable("put: connection reset"));
        }
        self.inner.put(bucket, id, data).await
    }

    async fn delete(&self, bucket: &BucketName, id: &BlobId) -> Result<()> {
        self.check("delete").await?;
        self.inner.delete(bucket, id).await
    }
}
