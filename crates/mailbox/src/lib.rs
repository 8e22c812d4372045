//! Mailbox-side use of the deduplicating blob store.
//!
//! Message bodies are stored through [`common::DeduplicatingBlobStore`] and
//! addressed by [`MessageSequenceNumber`]. Because the store removes a payload
//! for every owner at once, deletes go through a shared [`ReferenceTracker`].
//! Store failures are turned into tagged [`StatusResponse`]s rather than
//! ending the session.

mod error;
mod mailbox;
mod references;
mod response;
mod sequence;

pub use error::MailboxError;
pub use mailbox::Mailbox;
pub use references::ReferenceTracker;
pub use response::{ResponseCode, Status, StatusResponse};
pub use sequence::MessageSequenceNumber;
