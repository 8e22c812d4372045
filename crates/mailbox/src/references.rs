//! Reference counting for deduplicated payloads.
//!
//! The blob store keeps one physical copy per `(bucket, id)` and its delete
//! removes that copy for everyone. [`ReferenceTracker`] counts the logical
//! owners of each key so a payload is only deleted once the last owner lets
//! go. Acquiring (save then increment) and releasing (decrement then delete
//! at zero) of one key run under that key's lock, so an append of identical
//! content can never slip between a release's decrement and its delete.
//! Different keys never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use common::{BlobId, BucketName, ContentHasher, DeduplicatingBlobStore, RawBlobStore, Result};
use parking_lot::Mutex;
use tokio::sync::{Mutex as KeyMutex, OwnedMutexGuard};
use tracing::debug;

type Key = (BucketName, BlobId);

#[derive(Debug, Default)]
struct Slot {
    references: usize,
    /// Set once the slot has been dropped from the map. Waiters holding a
    /// retired slot must look the key up again.
    retired: bool,
}

/// Shared per-key reference counts. Clones share the same counts, so every
/// mailbox storing into the same buckets must use the same tracker.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTracker {
    slots: Arc<Mutex<HashMap<Key, Arc<KeyMutex<Slot>>>>>,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the slot for `key`, creating it if absent
    async fn lock_key(&self, key: &Key) -> OwnedMutexGuard<Slot> {
        loop {
            let slot = self.slots.lock().entry(key.clone()).or_default().clone();
            let guard = slot.lock_owned().await;
            if !guard.retired {
                return guard;
            }
        }
    }

    /// Drop an unreferenced slot from the map. Caller holds its lock.
    fn retire(&self, key: &Key, slot: &mut Slot) {
        slot.retired = true;
        self.slots.lock().remove(key);
    }

    /// Store `data` and record one more reference to it
    pub async fn acquire<S, H>(
        &self,
        store: &DeduplicatingBlobStore<S, H>,
        bucket: &BucketName,
        data: Bytes,
    ) -> Result<BlobId>
    where
        S: RawBlobStore,
        H: ContentHasher,
    {
        let key = (bucket.clone(), store.blob_id(&data));
        let mut slot = self.lock_key(&key).await;

        let id = match store.save(bucket, data).await {
            Ok(id) => id,
            Err(e) => {
                if slot.references == 0 {
                    self.retire(&key, &mut slot);
                }
                return Err(e);
            }
        };

        slot.references += 1;
        debug!(bucket = %bucket, id = %id, references = slot.references, "reference acquired");
        Ok(id)
    }

    /// Drop one reference, deleting the payload when it was the last.
    ///
    /// Returns whether the payload was deleted. If the delete fails the
    /// reference is kept, so the release can be retried. A key with no
    /// recorded references is deleted outright.
    pub async fn release<S, H>(
        &self,
        store: &DeduplicatingBlobStore<S, H>,
        bucket: &BucketName,
        id: &BlobId,
    ) -> Result<bool>
    where
        S: RawBlobStore,
        H: ContentHasher,
    {
        let key = (bucket.clone(), *id);
        let mut slot = self.lock_key(&key).await;

        if slot.references > 1 {
            slot.references -= 1;
            debug!(bucket = %bucket, id = %id, references = slot.references, "reference released");
            return Ok(false);
        }

        if let Err(e) = store.delete(bucket, id).await {
            if slot.references == 0 {
                self.retire(&key, &mut slot);
            }
            return Err(e);
        }
        slot.references = 0;
        self.retire(&key, &mut slot);
        debug!(bucket = %bucket, id = %id, "last reference released, payload deleted");
        Ok(true)
    }

    pub async fn count(&self, bucket: &BucketName, id: &BlobId) -> usize {
        let slot = self.slots.lock().get(&(bucket.clone(), *id)).cloned();
        match slot {
            Some(slot) => {
                let slot = slot.lock().await;
                if slot.retired {
                    0
                } else {
                    slot.references
                }
            }
            None => 0,
        }
    }
}
