use common::BlobStoreError;
use thiserror::Error;

/// Errors raised while opening a store. Once open, every failure is reported
/// through [`BlobStoreError`].
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("SQLite error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("object storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("failed to prepare directory: {0}")]
    Io(#[from] std::io::Error),
}

/// The index is part of the backend: failing to query it means the backend
/// cannot answer, not that the key is absent.
pub(crate) fn index_unavailable(err: sqlx::Error) -> BlobStoreError {
    BlobStoreError::unavailable(format!("bucket index: {err}"))
}

pub(crate) fn storage_unavailable(err: object_store::Error) -> BlobStoreError {
    BlobStoreError::unavailable(format!("object storage: {err}"))
}
