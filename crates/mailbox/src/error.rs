use common::BlobStoreError;
use thiserror::Error;

use crate::sequence::MessageSequenceNumber;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),

    #[error("no message at sequence number {0}")]
    NoSuchMessage(MessageSequenceNumber),

    #[error("invalid message sequence number: {0}")]
    InvalidSequenceNumber(i64),
}

impl MailboxError {
    /// Whether retrying the same command later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }
}
