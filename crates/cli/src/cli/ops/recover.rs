use std::fmt;

use clap::Args;
use common::BlobStoreError;
use mailblob_object_store::RecoveryStats;
use owo_colors::OwoColorize;

use mailblob_cli::StoreSetupError;

/// Rebuild the bucket index from the payloads in object storage
#[derive(Args, Debug, Clone)]
pub struct Recover {}

#[derive(Debug)]
pub struct RecoverOutput {
    pub stats: RecoveryStats,
}

impl fmt::Display for RecoverOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "Recovery complete".green().bold())?;
        writeln!(f, "  {} {}", "Found:".dimmed(), self.stats.found)?;
        writeln!(f, "  {} {}", "Added:".dimmed(), self.stats.added)?;
        writeln!(f, "  {} {}", "Already indexed:".dimmed(), self.stats.existing)?;
        writeln!(f, "  {} {}", "Corrupt:".dimmed(), self.stats.corrupt)?;
        write!(f, "  {} {}", "Errors:".dimmed(), self.stats.errors)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecoverError {
    #[error(transparent)]
    Setup(#[from] StoreSetupError),

    #[error("recovery failed: {0}")]
    Store(#[from] BlobStoreError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Recover {
    type Error = RecoverError;
    type Output = RecoverOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (_state, store) = super::open_store(ctx).await?;
        let stats = store
            .raw()
            .inner()
            .recover_from_storage(store.hasher())
            .await?;
        Ok(RecoverOutput { stats })
    }
}
