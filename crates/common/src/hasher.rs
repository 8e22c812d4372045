//! Content hashing policies.
//!
//! A hasher turns a payload into its [`BlobId`]. Swapping the policy keeps the
//! store's semantics intact, but ids produced under different policies are
//! not comparable with each other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::blob_id::BlobId;

/// Computes the identifier of a payload.
///
/// Implementations must be deterministic across processes and must not keep
/// mutable state, since one hasher is shared by every concurrent caller.
pub trait ContentHasher: Send + Sync + fmt::Debug + 'static {
    fn hash(&self, data: &[u8]) -> BlobId;

    /// Stable name of the algorithm, recorded in configuration
    fn name(&self) -> &'static str;
}

/// BLAKE3, the default policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn hash(&self, data: &[u8]) -> BlobId {
        BlobId::from_digest(*blake3::hash(data).as_bytes())
    }

    fn name(&self) -> &'static str {
        "blake3"
    }
}

/// SHA-256
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> BlobId {
        BlobId::from_digest(Sha256::digest(data).into())
    }

    fn name(&self) -> &'static str {
        "sha256"
    }
}

/// Hash policy selected by configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

impl ContentHasher for HashAlgorithm {
    fn hash(&self, data: &[u8]) -> BlobId {
        match self {
            HashAlgorithm::Blake3 => Blake3Hasher.hash(data),
            HashAlgorithm::Sha256 => Sha256Hasher.hash(data),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => Blake3Hasher.name(),
            HashAlgorithm::Sha256 => Sha256Hasher.name(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown hash algorithm: {0}")]
pub struct UnknownHashAlgorithm(String);

impl FromStr for HashAlgorithm {
    type Err = UnknownHashAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(UnknownHashAlgorithm(other.to_string())),
        }
    }
}
