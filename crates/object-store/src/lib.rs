//! Object storage backend for mailblob.
//!
//! Payloads live in any `object_store` backend (S3, MinIO, a local directory
//! or memory). A SQLite index records which `(bucket, id)` keys exist, so
//! existence checks, listings and counts never touch object storage.
//!
//! # Example
//!
//! ```rust,no_run
//! use common::DeduplicatingBlobStore;
//! use mailblob_object_store::{ObjectBlobStore, StoreOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = ObjectBlobStore::new_local("/tmp/mailblob".as_ref(), StoreOptions::default()).await?;
//! let store = DeduplicatingBlobStore::with_defaults(raw);
//!
//! let id = store.save_default(&b"Subject: hello"[..]).await?;
//! let body = store.read_default(&id).await?;
//! assert_eq!(&body[..], b"Subject: hello");
//! # Ok(())
//! # }
//! ```

mod database;
mod error;
mod storage;
mod store;

pub use database::BucketIndex;
pub use error::SetupError;
pub use storage::{ObjectStoreConfig, Storage, StorageOptions, StoredObject};
pub use store::{ObjectBlobStore, RecoveryStats, StoreOptions};
