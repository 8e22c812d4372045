use std::fmt;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use common::{BucketName, HashAlgorithm};
use owo_colors::OwoColorize;

use mailblob_cli::state::{AppConfig, AppState, BackendConfig, StateError, OBJECTS_DIR_NAME};

/// Backend type for CLI selection
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum BackendType {
    /// In-memory, for trying things out (nothing survives the command)
    Memory,
    /// Local directory (default)
    #[default]
    Local,
    /// S3-compatible object storage
    S3,
}

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Backend type
    #[arg(long, value_enum, default_value_t = BackendType::Local)]
    pub backend: BackendType,

    /// S3/MinIO URL (required for --backend s3)
    /// Format: s3://access_key:secret_key@host:port/bucket
    /// Example: s3://minioadmin:minioadmin@localhost:9000/mail-blobs
    #[arg(long)]
    pub s3_url: Option<String>,

    /// Directory for payloads (--backend local, default: <config dir>/objects)
    /// Must be an absolute path
    #[arg(long)]
    pub objects_path: Option<PathBuf>,

    /// Name of the default bucket
    #[arg(long, default_value = BucketName::DEFAULT_NAME)]
    pub default_bucket: BucketName,

    /// Content hash policy (blake3 or sha256). Cannot be changed once blobs are stored.
    #[arg(long, default_value = "blake3")]
    pub hash: HashAlgorithm,

    /// Per-call backend timeout in seconds
    #[arg(long, default_value_t = common::DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Client-side retries for S3 requests
    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,
}

#[derive(Debug)]
pub struct InitOutput {
    pub dir: PathBuf,
    pub config_path: PathBuf,
    pub index_path: PathBuf,
    pub backend: String,
    pub default_bucket: BucketName,
    pub hash: HashAlgorithm,
}

impl fmt::Display for InitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} mailblob at {}",
            "Initialized".green().bold(),
            self.dir.display().to_string().bold()
        )?;
        writeln!(f, "  {} {}", "Config:".dimmed(), self.config_path.display())?;
        writeln!(f, "  {} {}", "Index:".dimmed(), self.index_path.display())?;
        writeln!(f, "  {} {}", "Backend:".dimmed(), self.backend)?;
        writeln!(f, "  {} {}", "Default bucket:".dimmed(), self.default_bucket)?;
        write!(f, "  {} {}", "Hash:".dimmed(), self.hash)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),

    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl Init {
    fn build_backend_config(&self, dir: &std::path::Path) -> Result<BackendConfig, InitError> {
        match self.backend {
            BackendType::Memory => Ok(BackendConfig::Memory),

            BackendType::Local => {
                let path = match &self.objects_path {
                    Some(p) => {
                        if !p.is_absolute() {
                            return Err(InitError::InvalidPath(
                                "--objects-path must be an absolute path".to_string(),
                            ));
                        }
                        p.clone()
                    }
                    None => dir.join(OBJECTS_DIR_NAME),
                };
                Ok(BackendConfig::Local { path })
            }

            BackendType::S3 => {
                let url = self.s3_url.clone().ok_or_else(|| {
                    InitError::MissingConfig("--s3-url required for S3 backend".to_string())
                })?;

                BackendConfig::parse_s3_url(&url)?;

                Ok(BackendConfig::S3 { url })
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = InitOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let dir = AppState::dir(ctx.config_path.clone())?;
        let backend = self.build_backend_config(&dir)?;

        let config = AppConfig {
            default_bucket: self.default_bucket.clone(),
            hash: self.hash,
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            backend,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(InitOutput {
            backend: state.config.backend.describe(),
            default_bucket: state.config.default_bucket,
            hash: state.config.hash,
            dir: state.dir,
            config_path: state.config_path,
            index_path: state.index_path,
        })
    }
}
