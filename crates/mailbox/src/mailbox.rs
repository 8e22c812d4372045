use bytes::Bytes;
use common::{
    Blake3Hasher, BlobId, BucketName, ContentHasher, DeduplicatingBlobStore, RawBlobStore,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::MailboxError;
use crate::references::ReferenceTracker;
use crate::sequence::MessageSequenceNumber;

/// An ordered listing of messages whose bodies live in the blob store.
///
/// Positions are 1-based and shift down on expunge, as IMAP sequence numbers
/// do. Identical bodies appended to any mailbox sharing the same
/// [`ReferenceTracker`] are stored once and deleted only when the last copy
/// is expunged.
#[derive(Debug)]
pub struct Mailbox<S, H = Blake3Hasher> {
    name: String,
    bucket: BucketName,
    store: DeduplicatingBlobStore<S, H>,
    references: ReferenceTracker,
    messages: RwLock<Vec<BlobId>>,
}

impl<S, H> Mailbox<S, H>
where
    S: RawBlobStore,
    H: ContentHasher,
{
    /// Mailbox storing bodies in the store's default bucket
    pub fn new(
        name: impl Into<String>,
        store: DeduplicatingBlobStore<S, H>,
        references: ReferenceTracker,
    ) -> Self {
        let bucket = store.default_bucket().clone();
        Self::with_bucket(name, bucket, store, references)
    }

    pub fn with_bucket(
        name: impl Into<String>,
        bucket: BucketName,
        store: DeduplicatingBlobStore<S, H>,
        references: ReferenceTracker,
    ) -> Self {
        Self {
            name: name.into(),
            bucket,
            store,
            references,
            messages: RwLock::new(Vec::new()),
        }
    }

    /* Getters */

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Store `body` and add it at the end of the listing.
    ///
    /// On failure nothing is added and no reference is recorded.
    pub async fn append(&self, body: impl Into<Bytes>) -> Result<MessageSequenceNumber, MailboxError> {
        let id = self
            .references
            .acquire(&self.store, &self.bucket, body.into())
            .await?;

        let mut messages = self.messages.write().await;
        messages.push(id);
        let msn = MessageSequenceNumber::from_index(messages.len() - 1)?;

        info!(mailbox = %self.name, msn = %msn, id = %id, "message appended");
        Ok(msn)
    }

    /// Blob backing the message at `msn`
    pub async fn blob_id(&self, msn: MessageSequenceNumber) -> Result<BlobId, MailboxError> {
        let messages = self.messages.read().await;
        msn.index()
            .and_then(|i| messages.get(i).copied())
            .ok_or(MailboxError::NoSuchMessage(msn))
    }

    pub async fn fetch(&self, msn: MessageSequenceNumber) -> Result<Bytes, MailboxError> {
        let id = self.blob_id(msn).await?;
        debug!(mailbox = %self.name, msn = %msn, id = %id, "fetching message");
        Ok(self.store.read(&self.bucket, &id).await?)
    }

    /// Remove the message at `msn`, deleting its body if no other message
    /// references it.
    ///
    /// If the store fails the message stays in the listing.
    pub async fn expunge(&self, msn: MessageSequenceNumber) -> Result<(), MailboxError> {
        let mut messages = self.messages.write().await;
        let index = msn
            .index()
            .filter(|&i| i < messages.len())
            .ok_or(MailboxError::NoSuchMessage(msn))?;
        let id = messages[index];

        let deleted = self
            .references
            .release(&self.store, &self.bucket, &id)
            .await?;
        messages.remove(index);

        info!(mailbox = %self.name, msn = %msn, id = %id, body_deleted = deleted, "message expunged");
        Ok(())
    }
}
