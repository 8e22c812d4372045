use std::fmt;
use std::path::PathBuf;

use clap::Args;
use common::{BlobId, BlobStoreError, BucketName};
use tokio::io::AsyncWriteExt;

use mailblob_cli::StoreSetupError;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Blob id (64 hex characters)
    pub id: BlobId,

    /// Bucket to read from (default: the configured default bucket)
    #[arg(long, short)]
    pub bucket: Option<BucketName>,

    /// Write the payload to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct GetOutput {
    pub size: usize,
    pub written_to: Option<PathBuf>,
}

impl fmt::Display for GetOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // payloads sent to stdout are already written
        match &self.written_to {
            Some(path) => write!(f, "Wrote {} bytes to {}", self.size, path.display()),
            None => Ok(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error(transparent)]
    Setup(#[from] StoreSetupError),

    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),

    #[error("failed to write payload: {0}")]
    Write(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = GetError;
    type Output = GetOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_state, store) = super::open_store(ctx).await?;
        let bucket = self
            .bucket
            .clone()
            .unwrap_or_else(|| store.default_bucket().clone());

        let data = store.read(&bucket, &self.id).await?;

        match &self.output {
            Some(path) => tokio::fs::write(path, &data).await?,
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&data).await?;
                stdout.flush().await?;
            }
        }

        Ok(GetOutput {
            size: data.len(),
            written_to: self.output.clone(),
        })
    }
}
