//! IMAP-style tagged status responses.
//!
//! Store failures end the command, not the session: an unreachable backend
//! becomes `NO [UNAVAILABLE]`, a missing message or blob `NO [NONEXISTENT]`,
//! malformed input `BAD`.

use std::fmt;

use common::BlobStoreError;

use crate::error::MailboxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    No,
    Bad,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::No => write!(f, "NO"),
            Status::Bad => write!(f, "BAD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Unavailable,
    Nonexistent,
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::Unavailable => write!(f, "[UNAVAILABLE]"),
            ResponseCode::Nonexistent => write!(f, "[NONEXISTENT]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub tag: String,
    pub status: Status,
    pub code: Option<ResponseCode>,
    pub text: String,
}

impl StatusResponse {
    pub fn ok(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            status: Status::Ok,
            code: None,
            text: text.into(),
        }
    }

    /// Negative response for a failed command
    pub fn from_error(tag: impl Into<String>, command: &str, err: &MailboxError) -> Self {
        let (status, code) = match err {
            MailboxError::Store(BlobStoreError::BackendUnavailable(_)) => {
                (Status::No, Some(ResponseCode::Unavailable))
            }
            MailboxError::Store(BlobStoreError::NotFound { .. })
            | MailboxError::NoSuchMessage(_) => (Status::No, Some(ResponseCode::Nonexistent)),
            MailboxError::InvalidSequenceNumber(_)
            | MailboxError::Store(BlobStoreError::InvalidBlobId(_))
            | MailboxError::Store(BlobStoreError::InvalidBucketName(_)) => (Status::Bad, None),
        };

        Self {
            tag: tag.into(),
            status,
            code,
            text: format!("{command} failed: {err}"),
        }
    }

    /// `OK` with `"<command> completed"` on success, [`from_error`](Self::from_error) otherwise
    pub fn for_result<T>(
        tag: impl Into<String>,
        command: &str,
        result: &Result<T, MailboxError>,
    ) -> Self {
        match result {
            Ok(_) => Self::ok(tag, format!("{command} completed")),
            Err(err) => Self::from_error(tag, command, err),
        }
    }
}

impl fmt::Display for StatusResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tag, self.status)?;
        if let Some(code) = self.code {
            write!(f, " {code}")?;
        }
        write!(f, " {}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use common::{BlobId, BucketName};

    use super::*;
    use crate::sequence::MessageSequenceNumber;

    #[test]
    fn test_unavailable_maps_to_no() {
        let err = MailboxError::Store(BlobStoreError::unavailable("connection refused"));
        let response = StatusResponse::from_error("A1", "FETCH", &err);

        assert_eq!(response.status, Status::No);
        assert_eq!(response.code, Some(ResponseCode::Unavailable));
        assert!(response.to_string().starts_with("A1 NO [UNAVAILABLE] FETCH failed"));
    }

    #[test]
    fn test_missing_maps_to_nonexistent() {
        let err = MailboxError::NoSuchMessage(MessageSequenceNumber::from(4u32));
        let response = StatusResponse::from_error("A2", "FETCH", &err);
        assert_eq!(response.to_string(), "A2 NO [NONEXISTENT] FETCH failed: no message at sequence number 4");

        let err = MailboxError::Store(BlobStoreError::not_found(
            &BucketName::default_bucket(),
            &BlobId::from_digest([0; 32]),
        ));
        assert_eq!(
            StatusResponse::from_error("A3", "FETCH", &err).code,
            Some(ResponseCode::Nonexistent)
        );
    }

    #[test]
    fn test_invalid_input_maps_to_bad() {
        let err = MailboxError::InvalidSequenceNumber(-1);
        let response = StatusResponse::from_error("A4", "FETCH", &err);
        assert_eq!(response.status, Status::Bad);
        assert_eq!(response.code, None);
    }

    #[test]
    fn test_for_result() {
        let ok: Result<(), MailboxError> = Ok(());
        assert_eq!(
            StatusResponse::for_result("A5", "APPEND", &ok).to_string(),
            "A5 OK APPEND completed"
        );
    }
}
