//! Shared helpers for blob store integration tests
#![allow(dead_code)]

use ::common::{BucketName, DeduplicatingBlobStore, MemoryBlobStore};
use rand::Rng;

/// Install a test-writer subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Dedup store over a fresh in-memory backend, plus a handle on the backend
pub fn memory_store() -> (DeduplicatingBlobStore<MemoryBlobStore>, MemoryBlobStore) {
    init_test_tracing();
    let raw = MemoryBlobStore::new();
    (DeduplicatingBlobStore::with_defaults(raw.clone()), raw)
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill(&mut data[..]);
    data
}

pub fn bucket(name: &str) -> BucketName {
    BucketName::new(name).unwrap()
}
