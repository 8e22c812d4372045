use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::BlobStoreError;

/// Length of a blob id digest in bytes
pub const BLOB_ID_LEN: usize = 32;

/// Content-derived identifier of a stored payload.
///
/// A `BlobId` is only ever produced by a [`ContentHasher`](crate::ContentHasher)
/// or parsed from its canonical encoding: 64 lowercase hex characters.
/// Parsing accepts upper case hex but always renders lower case, so two ids
/// for the same digest compare and print identically.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct BlobId([u8; BLOB_ID_LEN]);

impl BlobId {
    pub fn from_digest(digest: [u8; BLOB_ID_LEN]) -> Self {
        Self(digest)
    }

    /// Parse the canonical hex encoding, rejecting anything malformed
    pub fn parse(s: &str) -> Result<Self, BlobStoreError> {
        if s.len() != BLOB_ID_LEN * 2 {
            return Err(BlobStoreError::InvalidBlobId(format!(
                "expected {} hex characters, got {}",
                BLOB_ID_LEN * 2,
                s.len()
            )));
        }
        let mut digest = [0u8; BLOB_ID_LEN];
        hex::decode_to_slice(s, &mut digest)
            .map_err(|e| BlobStoreError::InvalidBlobId(format!("{s}: {e}")))?;
        Ok(Self(digest))
    }

    pub fn as_bytes(&self) -> &[u8; BLOB_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.to_hex())
    }
}

impl FromStr for BlobId {
    type Err = BlobStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&[u8]> for BlobId {
    type Error = BlobStoreError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let digest: [u8; BLOB_ID_LEN] = bytes.try_into().map_err(|_| {
            BlobStoreError::InvalidBlobId(format!(
                "expected {} bytes, got {}",
                BLOB_ID_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262";

    #[test]
    fn test_parse_and_display() {
        let id = BlobId::parse(SAMPLE).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
        assert_eq!(id, SAMPLE.parse::<BlobId>().unwrap());
    }

    #[test]
    fn test_parse_normalizes_case() {
        let upper = BlobId::parse(&SAMPLE.to_uppercase()).unwrap();
        assert_eq!(upper, BlobId::parse(SAMPLE).unwrap());
        assert_eq!(upper.to_string(), SAMPLE);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = BlobId::parse("abcd").unwrap_err();
        assert!(matches!(err, BlobStoreError::InvalidBlobId(_)));
        assert!(BlobId::parse("").is_err());
        assert!(BlobId::parse(&format!("{SAMPLE}00")).is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let bad = format!("zz{}", &SAMPLE[2..]);
        assert!(matches!(
            BlobId::parse(&bad),
            Err(BlobStoreError::InvalidBlobId(_))
        ));
    }

    #[test]
    fn test_try_from_slice() {
        let id = BlobId::parse(SAMPLE).unwrap();
        assert_eq!(BlobId::try_from(&id.as_bytes()[..]).unwrap(), id);
        assert!(BlobId::try_from(&[0u8; 31][..]).is_err());
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let id = BlobId::parse(SAMPLE).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{SAMPLE}\""));
        let back: BlobId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<BlobId>("\"nope\"").is_err());
    }
}
