use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use crate::blob_id::BlobId;
use crate::bucket::BucketName;
use crate::error::{BlobStoreError, Result};
use crate::raw_store::RawBlobStore;

/// Default deadline for a single backend call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounds every backend call with a deadline.
///
/// A call that does not complete in time is abandoned and reported as
/// `BackendUnavailable`, never as an absent key.
#[derive(Debug, Clone)]
pub struct TimeoutBlobStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: RawBlobStore> TimeoutBlobStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(&self, op: &'static str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "backend call timed out");
                Err(BlobStoreError::unavailable(format!(
                    "{op} timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl<S: RawBlobStore> RawBlobStore for TimeoutBlobStore<S> {
    async fn exists(&self, bucket: &BucketName, id: &BlobId) -> Result<bool> {
        self.bounded("exists", self.inner.exists(bucket, id)).await
    }

    async fn get(&self, bucket: &BucketName, id: &BlobId) -> Result<Bytes> {
        self.bounded("get", self.inner.get(bucket, id)).await
    }

    async fn put(&self, bucket: &BucketName, id: &BlobId, data: Bytes) -> Result<()> {
        self.bounded("put", self.inner.put(bucket, id, data)).await
    }

    async fn delete(&self, bucket: &BucketName, id: &BlobId) -> Result<()> {
        self.bounded("delete", self.inner.delete(bucket, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlobStore;
    use crate::testing::FaultyBlobStore;
    use crate::{Blake3Hasher, ContentHasher};

    #[tokio::test(start_paused = true)]
    async fn test_stalled_backend_times_out() {
        let faulty = FaultyBlobStore::new(MemoryBlobStore::new());
        let store = TimeoutBlobStore::new(faulty.clone(), Duration::from_secs(5));
        let bucket = BucketName::default_bucket();
        let id = Blake3Hasher.hash(b"data");

        faulty.stall();
        let err = store.exists(&bucket, &id).await.unwrap_err();
        assert!(matches!(err, BlobStoreError::BackendUnavailable(_)));

        let err = store.get(&bucket, &id).await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_calls_pass_through() {
        let store = TimeoutBlobStore::new(MemoryBlobStore::new(), Duration::from_millis(10));
        let bucket = BucketName::default_bucket();
        let id = Blake3Hasher.hash(b"data");

        store
            .put(&bucket, &id, Bytes::from_static(b"data"))
            .await
            .unwrap();
        assert_eq!(store.get(&bucket, &id).await.unwrap().as_ref(), b"data");
        assert!(store.get(&bucket, &Blake3Hasher.hash(b"other")).await.unwrap_err().is_not_found());
    }
}
