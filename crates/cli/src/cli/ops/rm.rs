use std::fmt;

use clap::Args;
use common::{BlobId, BlobStoreError, BucketName};
use owo_colors::OwoColorize;

use mailblob_cli::StoreSetupError;

/// Remove a blob. This removes it for every message that shares it.
#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Blob id (64 hex characters)
    pub id: BlobId,

    /// Bucket to remove from (default: the configured default bucket)
    #[arg(long, short)]
    pub bucket: Option<BucketName>,
}

#[derive(Debug)]
pub struct RmOutput {
    pub id: BlobId,
    pub bucket: BucketName,
    pub existed: bool,
}

impl fmt::Display for RmOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.existed {
            write!(f, "{} {} from {}", "Removed".green().bold(), self.id, self.bucket.bold())
        } else {
            write!(f, "{} was not in {}", self.id, self.bucket.bold())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Setup(#[from] StoreSetupError),

    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = RmOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_state, store) = super::open_store(ctx).await?;
        let bucket = self
            .bucket
            .clone()
            .unwrap_or_else(|| store.default_bucket().clone());

        let existed = store.exists(&bucket, &self.id).await?;
        store.delete(&bucket, &self.id).await?;

        Ok(RmOutput {
            id: self.id,
            bucket,
            existed,
        })
    }
}
