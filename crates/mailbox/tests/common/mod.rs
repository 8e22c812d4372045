//! Shared helpers for mailbox integration tests
#![allow(dead_code)]

use ::common::testing::FaultyBlobStore;
use ::common::{DeduplicatingBlobStore, MemoryBlobStore};
use mailbox::{Mailbox, ReferenceTracker};

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub type FaultyStore = FaultyBlobStore<MemoryBlobStore>;

/// Mailbox over a switchable in-memory backend
pub fn faulty_mailbox(name: &str) -> (Mailbox<FaultyStore>, FaultyStore) {
    init_test_tracing();
    let raw = FaultyBlobStore::new(MemoryBlobStore::new());
    let store = DeduplicatingBlobStore::with_defaults(raw.clone());
    (Mailbox::new(name, store, ReferenceTracker::new()), raw)
}

/// Two mailboxes sharing one backend and one reference tracker
pub fn shared_mailboxes() -> (Mailbox<MemoryBlobStore>, Mailbox<MemoryBlobStore>, MemoryBlobStore) {
    init_test_tracing();
    let raw = MemoryBlobStore::new();
    let store = DeduplicatingBlobStore::with_defaults(raw.clone());
    let references = ReferenceTracker::new();
    (
        Mailbox::new("INBOX", store.clone(), references.clone()),
        Mailbox::new("Archive", store, references),
        raw,
    )
}
