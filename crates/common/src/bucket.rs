use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::BlobStoreError;

/// Name of a storage namespace.
///
/// Buckets come into existence on first write; this type only guarantees the
/// name is well formed. Equality is exact string equality: `"Mail"` and
/// `"mail"` are different buckets.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct BucketName(Arc<str>);

impl BucketName {
    /// Name of the distinguished default bucket
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn new(name: impl AsRef<str>) -> Result<Self, BlobStoreError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(BlobStoreError::InvalidBucketName(
                "bucket name must not be empty".to_string(),
            ));
        }
        Ok(Self(Arc::from(name)))
    }

    /// The distinguished default bucket
    pub fn default_bucket() -> Self {
        Self(Arc::from(Self::DEFAULT_NAME))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BucketName {
    fn default() -> Self {
        Self::default_bucket()
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketName({:?})", &*self.0)
    }
}

impl FromStr for BucketName {
    type Err = BlobStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BucketName {
    type Error = BlobStoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
