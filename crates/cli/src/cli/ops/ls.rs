use std::fmt;

use clap::Args;
use comfy_table::Table;
use common::{BlobId, BlobStoreError, BucketName};

use mailblob_cli::StoreSetupError;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Bucket to list (default: the configured default bucket)
    #[arg(long, short)]
    pub bucket: Option<BucketName>,
}

#[derive(Debug)]
pub struct LsOutput {
    pub bucket: BucketName,
    pub items: Vec<(BlobId, u64)>,
}

impl fmt::Display for LsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "No blobs in {}", self.bucket);
        }

        let mut table = Table::new();
        table.set_header(vec!["ID", "SIZE"]);
        for (id, size) in &self.items {
            table.add_row(vec![id.to_string(), size.to_string()]);
        }
        write!(f, "{table}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Setup(#[from] StoreSetupError),

    #[error("blob store error: {0}")]
    Store(#[from] BlobStoreError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = LsOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_state, store) = super::open_store(ctx).await?;
        let bucket = self
            .bucket
            .clone()
            .unwrap_or_else(|| store.default_bucket().clone());
        let backend = store.raw().inner();

        let mut items = Vec::new();
        for id in backend.list(&bucket).await? {
            // removed between list and lookup
            if let Some(size) = backend.size(&bucket, &id).await? {
                items.push((id, size));
            }
        }

        Ok(LsOutput { bucket, items })
    }
}
