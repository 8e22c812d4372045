use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::blob_id::BlobId;
use crate::bucket::BucketName;
use crate::error::Result;

/// Keyed byte storage underneath the deduplication layer.
///
/// Every operation is scoped by an explicit `(bucket, id)` key and the store
/// knows nothing about how ids are derived. Implementations are shared
/// handles: one instance is built at startup and used by every caller
/// concurrently.
///
/// Should behave as follows to be considered correct:
/// * `exists` answers `false` only when the backend was reached and the key
///   is absent; any failure to answer is `BackendUnavailable`.
/// * `get` of an absent key is `NotFound`.
/// * `put` is idempotent: storing the same bytes under the same key again,
///   including from two racing callers, succeeds and leaves one entry. A
///   failed `put` leaves the key absent.
/// * `delete` of an absent key succeeds.
#[async_trait]
pub trait RawBlobStore: Send + Sync + std::fmt::Debug {
    async fn exists(&self, bucket: &BucketName, id: &BlobId) -> Result<bool>;

    async fn get(&self, bucket: &BucketName, id: &BlobId) -> Result<Bytes>;

    async fn put(&self, bucket: &BucketName, id: &BlobId, data: Bytes) -> Result<()>;

    async fn delete(&self, bucket: &BucketName, id: &BlobId) -> Result<()>;
}

#[async_trait]
impl<T> RawBlobStore for Arc<T>
where
    T: RawBlobStore + ?Sized,
{
    async fn exists(&self, bucket: &BucketName, id: &BlobId) -> Result<bool> {
        (**self).exists(bucket, id).await
    }

    async fn get(&self, bucket: &BucketName, id: &BlobId) -> Result<Bytes> {
        (**self).get(bucket, id).await
    }

    async fn put(&self, bucket: &BucketName, id: &BlobId, data: Bytes) -> Result<()> {
        (**self).put(bucket, id, data).await
    }

    async fn delete(&self, bucket: &BucketName, id: &BlobId) -> Result<()> {
        (**self).delete(bucket, id).await
    }
}
