use std::path::PathBuf;
use std::time::Duration;

use common::{BucketName, HashAlgorithm};
use mailblob_object_store::{ObjectStoreConfig, StoreOptions};
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "mailblob";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const INDEX_FILE_NAME: &str = "index.db";
pub const OBJECTS_DIR_NAME: &str = "objects";

/// Where payloads are kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process-local; contents are lost when the command exits
    Memory,
    /// A local directory
    Local { path: PathBuf },
    /// S3 or MinIO, `s3://access_key:secret_key@host:port/bucket`
    S3 { url: String },
}

impl BackendConfig {
    /// Description safe to print: S3 credentials are masked
    pub fn describe(&self) -> String {
        match self {
            BackendConfig::Memory => "memory".to_string(),
            BackendConfig::Local { path } => format!("local ({})", path.display()),
            BackendConfig::S3 { url } => format!("s3 ({})", mask_s3_url(url)),
        }
    }
}

/// Parsed form of an S3 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

impl BackendConfig {
    /// Parse `s3://access_key:secret_key@host[:port]/bucket`.
    ///
    /// Port 443 (or no port) is reached over https, anything else over http.
    pub fn parse_s3_url(url: &str) -> Result<S3Config, StateError> {
        let invalid = |reason: &str| StateError::InvalidS3Url(format!("{}: {reason}", mask_s3_url(url)));

        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != "s3" {
            return Err(invalid("scheme must be s3://"));
        }

        let access_key = parsed.username();
        if access_key.is_empty() {
            return Err(invalid("missing access key"));
        }
        let secret_key = parsed
            .password()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing secret key"))?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?;
        let bucket = parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|b| !b.is_empty())
            .ok_or_else(|| invalid("missing bucket"))?;

        let endpoint = match parsed.port() {
            None | Some(443) => format!("https://{host}"),
            Some(port) => format!("http://{host}:{port}"),
        };

        Ok(S3Config {
            endpoint,
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            bucket: bucket.to_string(),
        })
    }
}

/// Replace the credentials of an S3 URL with `***`
pub fn mask_s3_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("s3://") {
        if let Some(at_pos) = rest.find('@') {
            let host_bucket = &rest[at_pos..];
            return format!("s3://***:***{}", host_bucket);
        }
    }
    url.to_string()
}

fn default_timeout_secs() -> u64 {
    common::DEFAULT_TIMEOUT.as_secs()
}

fn default_max_retries() -> usize {
    3
}

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub default_bucket: BucketName,
    #[serde(default)]
    pub hash: HashAlgorithm,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    pub backend: BackendConfig,
}

impl AppConfig {
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            default_bucket: BucketName::default_bucket(),
            hash: HashAlgorithm::default(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backend,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            default_bucket: self.default_bucket.clone(),
            timeout: self.timeout(),
            max_retries: self.max_retries,
        }
    }

    pub fn object_store_config(&self) -> Result<ObjectStoreConfig, StateError> {
        match &self.backend {
            BackendConfig::Memory => Ok(ObjectStoreConfig::Memory),
            BackendConfig::Local { path } => Ok(ObjectStoreConfig::Local { path: path.clone() }),
            BackendConfig::S3 { url } => {
                let s3 = BackendConfig::parse_s3_url(url)?;
                Ok(ObjectStoreConfig::S3 {
                    endpoint: s3.endpoint,
                    access_key: s3.access_key,
                    secret_key: s3.secret_key,
                    bucket: s3.bucket,
                    region: None,
                })
            }
        }
    }
}

/// Resolved state directory and its configuration
#[derive(Debug, Clone)]
pub struct AppState {
    pub dir: PathBuf,
    pub config_path: PathBuf,
    pub index_path: PathBuf,
    pub config: AppConfig,
}

impl AppState {
    /// State directory: the given path, or `~/.mailblob`
    pub fn dir(custom: Option<PathBuf>) -> Result<PathBuf, StateError> {
        match custom {
            Some(dir) => Ok(dir),
            None => dirs::home_dir()
                .map(|home| home.join(format!(".{APP_NAME}")))
                .ok_or(StateError::NoHomeDirectory),
        }
    }

    /// Create the state directory and write its config.
    ///
    /// Without a config, payloads go to a local `objects/` directory next to
    /// the index.
    pub fn init(custom: Option<PathBuf>, config: Option<AppConfig>) -> Result<Self, StateError> {
        let dir = Self::dir(custom)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(StateError::AlreadyInitialized(dir));
        }

        std::fs::create_dir_all(&dir)?;
        let config = config.unwrap_or_else(|| {
            AppConfig::new(BackendConfig::Local {
                path: dir.join(OBJECTS_DIR_NAME),
            })
        });
        // reject unusable S3 URLs before anything is written
        config.object_store_config()?;

        let contents = toml::to_string_pretty(&config)?;
        std::fs::write(&config_path, contents)?;
        tracing::info!(path = %config_path.display(), "wrote config");

        Ok(Self::from_parts(dir, config))
    }

    /// Load an initialized state directory
    pub fn load(custom: Option<PathBuf>) -> Result<Self, StateError> {
        let dir = Self::dir(custom)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized(dir));
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        tracing::debug!(path = %config_path.display(), backend = %config.backend.describe(), "loaded config");

        Ok(Self::from_parts(dir, config))
    }

    fn from_parts(dir: PathBuf, config: AppConfig) -> Self {
        Self {
            config_path: dir.join(CONFIG_FILE_NAME),
            index_path: dir.join(INDEX_FILE_NAME),
            dir,
            config,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not determine home directory")]
    NoHomeDirectory,

    #[error("{0} is already initialized")]
    AlreadyInitialized(PathBuf),

    #[error("{0} is not initialized, run `mailblob init` first")]
    NotInitialized(PathBuf),

    #[error("invalid S3 URL {0}")]
    InvalidS3Url(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read config: {0}")]
    ConfigRead(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}
