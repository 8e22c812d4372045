//! Content-addressed storage on top of a [`RawBlobStore`].
//!
//! Saving computes the payload's id, asks the backend whether `(bucket, id)`
//! is already present and only writes when it is not. Two callers racing
//! with identical content may both miss the existence check and both write;
//! that is harmless because the backend's `put` is idempotent and the bytes
//! are identical by construction. No lock is taken around the check and the
//! write.
//!
//! Deletion is not reference counted. The same `(bucket, id)` may back any
//! number of logical owners (two messages carrying the same attachment, say),
//! and [`DeduplicatingBlobStore::delete`] removes the payload for all of
//! them. Callers must only delete once no logical reference remains.

use bytes::Bytes;
use tracing::{debug, info};

use crate::blob_id::BlobId;
use crate::bucket::BucketName;
use crate::error::Result;
use crate::hasher::{Blake3Hasher, ContentHasher};
use crate::raw_store::RawBlobStore;

/// Deduplicating blob store.
///
/// Stateless apart from its collaborators: every operation is a pure function
/// of its inputs and the backend's contents. Failures from the backend are
/// returned unchanged and never retried here.
#[derive(Debug, Clone)]
pub struct DeduplicatingBlobStore<S, H = Blake3Hasher> {
    raw: S,
    hasher: H,
    default_bucket: BucketName,
}

impl<S: RawBlobStore> DeduplicatingBlobStore<S, Blake3Hasher> {
    /// BLAKE3 ids and the `default` bucket
    pub fn with_defaults(raw: S) -> Self {
        Self::new(raw, Blake3Hasher, BucketName::default_bucket())
    }
}

impl<S, H> DeduplicatingBlobStore<S, H>
where
    S: RawBlobStore,
    H: ContentHasher,
{
    pub fn new(raw: S, hasher: H, default_bucket: BucketName) -> Self {
        Self {
            raw,
            hasher,
            default_bucket,
        }
    }

    /* Getters */

    pub fn default_bucket(&self) -> &BucketName {
        &self.default_bucket
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn raw(&self) -> &S {
        &self.raw
    }

    /// Id `data` would be stored under, without touching the backend
    pub fn blob_id(&self, data: &[u8]) -> BlobId {
        self.hasher.hash(data)
    }

    /// Store `data` in `bucket` and return its id.
    ///
    /// Performs at most two backend calls: an existence check and, on a
    /// miss, a write.
    pub async fn save(&self, bucket: &BucketName, data: impl Into<Bytes>) -> Result<BlobId> {
        let data = data.into();
        let id = self.hasher.hash(&data);

        if self.raw.exists(bucket, &id).await? {
            debug!(bucket = %bucket, id = %id, size = data.len(), "dedup hit, skipping write");
            return Ok(id);
        }

        let size = data.len();
        self.raw.put(bucket, &id, data).await?;

        info!(bucket = %bucket, id = %id, size = size, "blob stored");
        Ok(id)
    }

    pub async fn save_default(&self, data: impl Into<Bytes>) -> Result<BlobId> {
        self.save(&self.default_bucket, data).await
    }

    pub async fn read(&self, bucket: &BucketName, id: &BlobId) -> Result<Bytes> {
        self.raw.get(bucket, id).await
    }

    pub async fn read_default(&self, id: &BlobId) -> Result<Bytes> {
        self.read(&self.default_bucket, id).await
    }

    pub async fn exists(&self, bucket: &BucketName, id: &BlobId) -> Result<bool> {
        self.raw.exists(bucket, id).await
    }

    /// Remove `(bucket, id)`.
    ///
    /// This removes the payload for every logical owner sharing it. The
    /// caller is responsible for knowing that none remain.
    pub async fn delete(&self, bucket: &BucketName, id: &BlobId) -> Result<()> {
        self.raw.delete(bucket, id).await?;
        debug!(bucket = %bucket, id = %id, "blob deleted");
        Ok(())
    }
}
