use std::fmt;

use crate::error::MailboxError;

/// Position of a message within a mailbox listing.
///
/// Zero is a valid value even though mailbox positions start at one; it is
/// the caller's job to reject it where a real message is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageSequenceNumber(u32);

impl MessageSequenceNumber {
    pub fn new(value: i64) -> Result<Self, MailboxError> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| MailboxError::InvalidSequenceNumber(value))
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Zero-based index into a listing, `None` for zero
    pub(crate) fn index(&self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    pub(crate) fn from_index(index: usize) -> Result<Self, MailboxError> {
        Self::new(index as i64 + 1)
    }
}

impl TryFrom<i64> for MessageSequenceNumber {
    type Error = MailboxError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<u32> for MessageSequenceNumber {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for MessageSequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_is_rejected() {
        let err = MessageSequenceNumber::new(-1).unwrap_err();
        assert!(matches!(err, MailboxError::InvalidSequenceNumber(-1)));
    }

    #[test]
    fn test_zero_and_positive_are_accepted() {
        assert_eq!(MessageSequenceNumber::new(0).unwrap().as_u32(), 0);
        assert_eq!(MessageSequenceNumber::new(12).unwrap().as_u32(), 12);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(MessageSequenceNumber::new(i64::from(u32::MAX)).is_ok());
        assert!(MessageSequenceNumber::new(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn test_value_equality() {
        let a = MessageSequenceNumber::try_from(12i64).unwrap();
        let b = MessageSequenceNumber::from(12u32);
        assert_eq!(a, b);
        assert_ne!(a, MessageSequenceNumber::from(13u32));
        assert_eq!(a.to_string(), "12");
    }

    #[test]
    fn test_index() {
        assert_eq!(MessageSequenceNumber::from(0u32).index(), None);
        assert_eq!(MessageSequenceNumber::from(1u32).index(), Some(0));
        assert_eq!(
            MessageSequenceNumber::from_index(4).unwrap(),
            MessageSequenceNumber::from(5u32)
        );
    }
}
