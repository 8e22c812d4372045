//! Error taxonomy shared by every layer of the blob store.
//!
//! Callers match on these variants, so they are kept stable: a backend
//! adapter maps whatever its storage technology reports into one of them at
//! its own boundary.

use crate::blob_id::BlobId;
use crate::bucket::BucketName;

/// Errors surfaced by the blob store and its backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobStoreError {
    /// The key is absent from a reachable backend
    #[error("blob {id} not found in bucket {bucket}")]
    NotFound { bucket: BucketName, id: BlobId },

    /// The backend could not be reached, failed, or timed out.
    /// This is never a statement about whether the key exists.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("invalid blob id: {0}")]
    InvalidBlobId(String),
}

impl BlobStoreError {
    pub fn not_found(bucket: &BucketName, id: &BlobId) -> Self {
        Self::NotFound {
            bucket: bucket.clone(),
            id: *id,
        }
    }

    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable(reason.to_string())
    }

    /* Getters */

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether retrying the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, BlobStoreError>;
