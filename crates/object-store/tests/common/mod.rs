//! Shared helpers for object store integration tests
#![allow(dead_code)]

use ::common::BucketName;
use mailblob_object_store::{ObjectBlobStore, ObjectStoreConfig, StoreOptions};
use rand::Rng;
use tempfile::TempDir;

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Object store with an in-memory index and in-memory payloads
pub async fn ephemeral_store() -> ObjectBlobStore {
    init_test_tracing();
    ObjectBlobStore::new_ephemeral().await.unwrap()
}

/// Object store rooted in a fresh temp directory. Keep the `TempDir` alive
/// for as long as the store is used.
pub async fn local_store() -> (ObjectBlobStore, TempDir) {
    init_test_tracing();
    let temp_dir = tempfile::tempdir().unwrap();
    let store = ObjectBlobStore::new_local(temp_dir.path(), StoreOptions::default())
        .await
        .unwrap();
    (store, temp_dir)
}

/// Local payloads behind an in-memory index
pub async fn local_payloads_memory_index() -> (ObjectBlobStore, TempDir) {
    init_test_tracing();
    let temp_dir = tempfile::tempdir().unwrap();
    let config = ObjectStoreConfig::Local {
        path: temp_dir.path().to_path_buf(),
    };
    let store = ObjectBlobStore::in_memory(config, StoreOptions::default())
        .await
        .unwrap();
    (store, temp_dir)
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill(&mut data[..]);
    data
}

pub fn bucket(name: &str) -> BucketName {
    BucketName::new(name).unwrap()
}
