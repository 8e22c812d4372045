use std::fmt;
use std::path::PathBuf;

use clap::Args;
use common::{BlobId, BlobStoreError, BucketName};
use owo_colors::OwoColorize;
use tokio::io::AsyncReadExt;

use mailblob_cli::StoreSetupError;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// File to store, `-` for stdin
    pub path: PathBuf,

    /// Bucket to store into (default: the configured default bucket)
    #[arg(long, short)]
    pub bucket: Option<BucketName>,
}

#[derive(Debug)]
pub struct PutOutput {
    pub id: BlobId,
    pub bucket: BucketName,
    pub size: usize,
}

impl fmt::Display for PutOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} bytes in {}",
            "Stored".green(),
            self.size,
            self.bucket.bold()
        )?;
        write!(f, "{}", self.id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error(transparent)]
    Setup(#[from] StoreSetupError),

    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),
}

impl Put {
    async fn read_input(&self) -> Result<Vec<u8>, PutError> {
        let read_err = |e| PutError::Read(self.path.clone(), e);
        if self.path.as_os_str() == "-" {
            let mut data = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .map_err(read_err)?;
            Ok(data)
        } else {
            tokio::fs::read(&self.path).await.map_err(read_err)
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = PutError;
    type Output = PutOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_state, store) = super::open_store(ctx).await?;
        let bucket = self
            .bucket
            .clone()
            .unwrap_or_else(|| store.default_bucket().clone());

        let data = self.read_input().await?;
        let size = data.len();
        let id = store.save(&bucket, data).await?;

        Ok(PutOutput {
            id,
            bucket,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_reports_id_and_size() {
        let id = BlobId::from_digest([7; 32]);
        let output = PutOutput {
            id,
            bucket: BucketName::new("archive").unwrap(),
            size: 42,
        }
        .to_string();

        let mut lines = output.lines();
        let summary = lines.next().unwrap();
        assert!(summary.contains("Stored"));
        assert!(summary.contains("42 bytes in"));
        assert!(summary.contains("archive"));
        assert_eq!(lines.next(), Some(id.to_string().as_str()));
        assert_eq!(lines.next(), None);
    }
}
