use std::fmt;

use clap::Args;
use comfy_table::Table;
use common::{BlobStoreError, BucketName, HashAlgorithm};
use owo_colors::OwoColorize;

use mailblob_cli::StoreSetupError;

#[derive(Args, Debug, Clone)]
pub struct Stat {}

#[derive(Debug)]
pub struct StatOutput {
    pub backend: String,
    pub default_bucket: BucketName,
    pub hash: HashAlgorithm,
    pub buckets: Vec<(BucketName, u64)>,
    pub total_size: u64,
}

impl fmt::Display for StatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {} {}", "Backend:".dimmed(), self.backend)?;
        writeln!(f, "  {} {}", "Default bucket:".dimmed(), self.default_bucket)?;
        writeln!(f, "  {} {}", "Hash:".dimmed(), self.hash)?;
        write!(f, "  {} {} bytes", "Total size:".dimmed(), self.total_size)?;

        if !self.buckets.is_empty() {
            let mut table = Table::new();
            table.set_header(vec!["BUCKET", "BLOBS"]);
            for (bucket, count) in &self.buckets {
                table.add_row(vec![bucket.to_string(), count.to_string()]);
            }
            write!(f, "\n{table}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatError {
    #[error(transparent)]
    Setup(#[from] StoreSetupError),

    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Stat {
    type Error = StatError;
    type Output = StatOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, store) = super::open_store(ctx).await?;
        let backend = store.raw().inner();

        let mut buckets = Vec::new();
        for bucket in backend.buckets().await? {
            let count = backend.count(&bucket).await?;
            buckets.push((bucket, count));
        }

        Ok(StatOutput {
            backend: state.config.backend.describe(),
            default_bucket: state.config.default_bucket,
            hash: state.config.hash,
            buckets,
            total_size: backend.total_size().await?,
        })
    }
}
