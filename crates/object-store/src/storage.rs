//! Payload storage on top of the `object_store` crate.
//!
//! Layout inside the configured container:
//!
//! ```text
//! default/<blob id>                       payloads of the default bucket
//! buckets/<hex(bucket name)>/<blob id>    payloads of every other bucket
//! ```
//!
//! The default bucket skips the bucket segment entirely. Named buckets are
//! hex encoded so any name maps to a single, reversible path segment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use common::{BlobId, BucketName};
use futures::stream::BoxStream;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::{Path as ObjectPath, PathPart};
use object_store::{ClientOptions, ObjectMeta, ObjectStore, PutPayload, RetryConfig};
use tracing::{info, warn};

use crate::error::SetupError;

const DEFAULT_PREFIX: &str = "default";
const BUCKETS_PREFIX: &str = "buckets";
const DEFAULT_REGION: &str = "us-east-1";

/// Where payloads live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreConfig {
    /// Process-local, lost on drop
    Memory,
    /// A directory on the local filesystem
    Local { path: PathBuf },
    /// S3 or an S3-compatible service such as MinIO
    S3 {
        endpoint: String,
        access_key: String,
        secret_key: String,
        bucket: String,
        region: Option<String>,
    },
}

/// Connection policy for remote object storage
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries performed by the client before a request is reported as failed
    pub max_retries: usize,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            timeout: common::DEFAULT_TIMEOUT,
            max_retries: 3,
        }
    }
}

/// A payload found while listing storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: BucketName,
    pub id: BlobId,
    pub size: u64,
}

/// Bucket-aware handle on an object store
#[derive(Debug, Clone)]
pub struct Storage {
    store: Arc<dyn ObjectStore>,
    config: ObjectStoreConfig,
    default_bucket: BucketName,
}

impl Storage {
    pub async fn new(
        config: ObjectStoreConfig,
        options: &StorageOptions,
        default_bucket: BucketName,
    ) -> Result<Self, SetupError> {
        let store: Arc<dyn ObjectStore> = match &config {
            ObjectStoreConfig::Memory => Arc::new(InMemory::new()),
            ObjectStoreConfig::Local { path } => {
                tokio::fs::create_dir_all(path).await?;
                info!(path = %path.display(), "using local object storage");
                Arc::new(LocalFileSystem::new_with_prefix(path)?)
            }
            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                info!(endpoint = %endpoint, bucket = %bucket, "using S3 object storage");
                let client_options = ClientOptions::new()
                    .with_timeout(options.timeout)
                    .with_connect_timeout(options.timeout)
                    .with_allow_http(endpoint.starts_with("http://"));
                let retry = RetryConfig {
                    max_retries: options.max_retries,
                    retry_timeout: options.timeout,
                    ..Default::default()
                };
                let s3 = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or(DEFAULT_REGION))
                    .with_client_options(client_options)
                    .with_retry(retry)
                    .build()?;
                Arc::new(s3)
            }
        };

        Ok(Self::from_object_store(store, config, default_bucket))
    }

    /// Wrap an already-built object store
    pub fn from_object_store(
        store: Arc<dyn ObjectStore>,
        config: ObjectStoreConfig,
        default_bucket: BucketName,
    ) -> Self {
        Self {
            store,
            config,
            default_bucket,
        }
    }

    /* Getters */

    pub fn config(&self) -> &ObjectStoreConfig {
        &self.config
    }

    pub fn default_bucket(&self) -> &BucketName {
        &self.default_bucket
    }

    /// Object location for `(bucket, id)`
    pub fn location(&self, bucket: &BucketName, id: &BlobId) -> ObjectPath {
        let id = id.to_hex();
        if *bucket == self.default_bucket {
            ObjectPath::from_iter([DEFAULT_PREFIX, id.as_str()])
        } else {
            let encoded = hex::encode(bucket.as_str());
            ObjectPath::from_iter([BUCKETS_PREFIX, encoded.as_str(), id.as_str()])
        }
    }

    /// Write a payload. Object stores replace objects atomically, so a failed
    /// write never leaves a truncated payload behind.
    pub async fn put(
        &self,
        bucket: &BucketName,
        id: &BlobId,
        data: Bytes,
    ) -> Result<(), object_store::Error> {
        let location = self.location(bucket, id);
        self.store.put(&location, PutPayload::from(data)).await?;
        Ok(())
    }

    /// Read a payload, `None` if the object does not exist
    pub async fn get(
        &self,
        bucket: &BucketName,
        id: &BlobId,
    ) -> Result<Option<Bytes>, object_store::Error> {
        let location = self.location(bucket, id);
        match self.store.get(&location).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete a payload; a missing object is not an error
    pub async fn delete(&self, bucket: &BucketName, id: &BlobId) -> Result<(), object_store::Error> {
        let location = self.location(bucket, id);
        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Stream every payload in storage. Objects that do not follow the
    /// layout are skipped.
    pub fn list(&self) -> BoxStream<'_, Result<StoredObject, object_store::Error>> {
        self.store
            .list(None)
            .filter_map(move |item| {
                let parsed = match item {
                    Ok(meta) => self.parse_object(&meta).map(Ok),
                    Err(e) => Some(Err(e)),
                };
                futures::future::ready(parsed)
            })
            .boxed()
    }

    fn parse_object(&self, meta: &ObjectMeta) -> Option<StoredObject> {
        let parts: Vec<PathPart<'_>> = meta.location.parts().collect();
        let segments: Vec<&str> = parts.iter().map(|p| p.as_ref()).collect();

        let parsed = match segments.as_slice() {
            [DEFAULT_PREFIX, id] => BlobId::parse(id)
                .ok()
                .map(|id| (self.default_bucket.clone(), id)),
            [BUCKETS_PREFIX, encoded, id] => decode_bucket(encoded)
                .zip(BlobId::parse(id).ok()),
            _ => None,
        };

        match parsed {
            Some((bucket, id)) => Some(StoredObject {
                bucket,
                id,
                size: meta.size as u64,
            }),
            None => {
                warn!(location = %meta.location, "skipping object outside the blob layout");
                None
            }
        }
    }
}

fn decode_bucket(encoded: &str) -> Option<BucketName> {
    let raw = hex::decode(encoded).ok()?;
    let name = String::from_utf8(raw).ok()?;
    BucketName::new(name).ok()
}
