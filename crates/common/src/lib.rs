//! Deduplicating, content-addressed blob storage.
//!
//! Payloads (message bodies, attachments) are stored once per distinct
//! content within a bucket. The identity of a payload is its hash, computed by
//! a pluggable [`ContentHasher`]; the bytes live in a pluggable
//! [`RawBlobStore`] backend that may be remote and may be unavailable.
//!
//! # Example
//!
//! ```rust
//! use common::{BucketName, DeduplicatingBlobStore, MemoryBlobStore};
//!
//! # async fn example() -> Result<(), common::BlobStoreError> {
//! let raw = MemoryBlobStore::new();
//! let store = DeduplicatingBlobStore::with_defaults(raw.clone());
//!
//! let attachments = BucketName::new("attachments")?;
//! let first = store.save(&attachments, b"%PDF-1.7".to_vec()).await?;
//! let second = store.save(&attachments, b"%PDF-1.7".to_vec()).await?;
//!
//! assert_eq!(first, second);
//! assert_eq!(raw.len(), 1);
//! # Ok(())
//! # }
//! ```

mod blob_id;
mod bucket;
mod dedup;
mod error;
mod hasher;
mod memory;
mod raw_store;
pub mod testing;
mod timeout;

pub use blob_id::{BlobId, BLOB_ID_LEN};
pub use bucket::BucketName;
pub use dedup::DeduplicatingBlobStore;
pub use error::{BlobStoreError, Result};
pub use hasher::{Blake3Hasher, ContentHasher, HashAlgorithm, Sha256Hasher, UnknownHashAlgorithm};
pub use memory::MemoryBlobStore;
pub use raw_store::RawBlobStore;
pub use timeout::{TimeoutBlobStore, DEFAULT_TIMEOUT};
