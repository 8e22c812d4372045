//! SQLite bucket index.
//!
//! Records which `(bucket, id)` keys are present so existence checks never
//! touch object storage. The default bucket gets its own table keyed by id
//! alone; every other bucket shares a table keyed by `(bucket, id)`. Both
//! answer the same questions, the default table just carries less per row.

use std::path::Path;

use common::{BlobId, BucketName};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{info, warn};

use crate::error::SetupError;

/// Connection pool for the bucket index
#[derive(Debug, Clone)]
pub struct BucketIndex {
    pool: SqlitePool,
    default_bucket: BucketName,
}

impl BucketIndex {
    /// Open (creating if needed) a file-backed index and run migrations
    pub async fn new(path: impl AsRef<Path>, default_bucket: BucketName) -> Result<Self, SetupError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let index = Self {
            pool,
            default_bucket,
        };
        index.run_migrations().await?;

        info!("bucket index initialized at {:?}", path);
        Ok(index)
    }

    /// Create an in-memory index. Its contents can be rebuilt from object
    /// storage with a recovery pass.
    pub async fn in_memory(default_bucket: BucketName) -> Result<Self, SetupError> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        // a single connection that never idles out, or the database vanishes
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let index = Self {
            pool,
            default_bucket,
        };
        index.run_migrations().await?;

        info!("bucket index initialized in-memory");
        Ok(index)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS default_bucket_blobs (
                id TEXT PRIMARY KEY,
                size INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bucket_blobs (
                bucket TEXT NOT NULL,
                id TEXT NOT NULL,
                size INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (bucket, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn is_default(&self, bucket: &BucketName) -> bool {
        *bucket == self.default_bucket
    }

    pub async fn contains(&self, bucket: &BucketName, id: &BlobId) -> Result<bool, sqlx::Error> {
        Ok(self.size(bucket, id).await?.is_some())
    }

    /// Recorded payload size, `None` if the key is absent
    pub async fn size(&self, bucket: &BucketName, id: &BlobId) -> Result<Option<u64>, sqlx::Error> {
        let row = if self.is_default(bucket) {
            sqlx::query("SELECT size FROM default_bucket_blobs WHERE id = ?")
                .bind(id.to_hex())
                .fetch_optional(&self.pool)
                .await?
        } else {
            sqlx::query("SELECT size FROM bucket_blobs WHERE bucket = ? AND id = ?")
                .bind(bucket.as_str())
                .bind(id.to_hex())
                .fetch_optional(&self.pool)
                .await?
        };
        Ok(row.map(|r| r.get::<i64, _>("size") as u64))
    }

    /// Record a key. Recording a key that is already present is a no-op.
    pub async fn insert(&self, bucket: &BucketName, id: &BlobId, size: u64) -> Result<(), sqlx::Error> {
        let now = chrono::Utc::now().timestamp();
        if self.is_default(bucket) {
            sqlx::query(
                "INSERT INTO default_bucket_blobs (id, size, created_at) VALUES (?, ?, ?)
                 ON CONFLICT(id) DO NOTHING",
            )
            .bind(id.to_hex())
            .bind(size as i64)
            .bind(now)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO bucket_blobs (bucket, id, size, created_at) VALUES (?, ?, ?, ?)
                 ON CONFLICT(bucket, id) DO NOTHING",
            )
            .bind(bucket.as_str())
            .bind(id.to_hex())
            .bind(size as i64)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Forget a key. Returns whether it was present.
    pub async fn remove(&self, bucket: &BucketName, id: &BlobId) -> Result<bool, sqlx::Error> {
        let result = if self.is_default(bucket) {
            sqlx::query("DELETE FROM default_bucket_blobs WHERE id = ?")
                .bind(id.to_hex())
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query("DELETE FROM bucket_blobs WHERE bucket = ? AND id = ?")
                .bind(bucket.as_str())
                .bind(id.to_hex())
                .execute(&self.pool)
                .await?
        };
        Ok(result.rows_affected() > 0)
    }

    /// Ids recorded in `bucket`, ordered by id
    pub async fn list(&self, bucket: &BucketName) -> Result<Vec<BlobId>, sqlx::Error> {
        let rows = if self.is_default(bucket) {
            sqlx::query("SELECT id FROM default_bucket_blobs ORDER BY id")
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query("SELECT id FROM bucket_blobs WHERE bucket = ? ORDER BY id")
                .bind(bucket.as_str())
                .fetch_all(&self.pool)
                .await?
        };

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let s: String = row.get("id");
            match BlobId::parse(&s) {
                Ok(id) => ids.push(id),
                Err(_) => warn!(id = %s, bucket = %bucket, "invalid blob id in index, skipping"),
            }
        }
        Ok(ids)
    }

    pub async fn count(&self, bucket: &BucketName) -> Result<u64, sqlx::Error> {
        let row = if self.is_default(bucket) {
            sqlx::query("SELECT COUNT(*) AS count FROM default_bucket_blobs")
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query("SELECT COUNT(*) AS count FROM bucket_blobs WHERE bucket = ?")
                .bind(bucket.as_str())
                .fetch_one(&self.pool)
                .await?
        };
        Ok(row.get::<i64, _>("count") as u64)
    }

    /// Total recorded payload bytes across every bucket
    pub async fn total_size(&self) -> Result<u64, sqlx::Error> {
        let row = sqlx::query(
            "SELECT
                (SELECT COALESCE(SUM(size), 0) FROM default_bucket_blobs)
              + (SELECT COALESCE(SUM(size), 0) FROM bucket_blobs) AS total",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("total") as u64)
    }

    /// Buckets holding at least one key
    pub async fn buckets(&self) -> Result<Vec<BucketName>, sqlx::Error> {
        let mut buckets = Vec::new();
        if self.count(&self.default_bucket).await? > 0 {
            buckets.push(self.default_bucket.clone());
        }

        let rows = sqlx::query("SELECT DISTINCT bucket FROM bucket_blobs ORDER BY bucket")
            .fetch_all(&self.pool)
            .await?;
        for row in rows {
            let name: String = row.get("bucket");
            match BucketName::new(&name) {
                Ok(bucket) if bucket != self.default_bucket => buckets.push(bucket),
                Ok(_) => {}
                Err(_) => warn!(bucket = %name, "invalid bucket name in index, skipping"),
            }
        }
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use common::{Blake3Hasher, ContentHasher};

    use super::*;

    async fn index() -> BucketIndex {
        BucketIndex::in_memory(BucketName::default_bucket())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_and_named_tables() {
        let index = index().await;
        let default = BucketName::default_bucket();
        let named = BucketName::new("attachments").unwrap();
        let id = Blake3Hasher.hash(b"x");

        index.insert(&default, &id, 1).await.unwrap();
        assert!(index.contains(&default, &id).await.unwrap());
        assert!(!index.contains(&named, &id).await.unwrap());

        index.insert(&named, &id, 1).await.unwrap();
        assert_eq!(index.count(&default).await.unwrap(), 1);
        assert_eq!(index.count(&named).await.unwrap(), 1);
        assert_eq!(index.total_size().await.unwrap(), 2);
        assert_eq!(index.buckets().await.unwrap(), vec![default, named]);
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let index = index().await;
        let bucket = BucketName::new("inbox").unwrap();
        let id = Blake3Hasher.hash(b"x");

        index.insert(&bucket, &id, 10).await.unwrap();
        index.insert(&bucket, &id, 10).await.unwrap();
        assert_eq!(index.count(&bucket).await.unwrap(), 1);
        assert_eq!(index.size(&bucket, &id).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_remove() {
        let index = index().await;
        let default = BucketName::default_bucket();
        let id = Blake3Hasher.hash(b"x");

        assert!(!index.remove(&default, &id).await.unwrap());
        index.insert(&default, &id, 1).await.unwrap();
        assert!(index.remove(&default, &id).await.unwrap());
        assert!(!index.contains(&default, &id).await.unwrap());
        assert!(index.buckets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_per_bucket() {
        let index = index().await;
        let a = BucketName::new("a").unwrap();
        let b = BucketName::new("b").unwrap();
        let one = Blake3Hasher.hash(b"1");
        let two = Blake3Hasher.hash(b"2");

        index.insert(&a, &one, 1).await.unwrap();
        index.insert(&a, &two, 1).await.unwrap();
        index.insert(&b, &two, 1).await.unwrap();

        let mut expected = vec![one, two];
        expected.sort();
        assert_eq!(index.list(&a).await.unwrap(), expected);
        assert_eq!(index.list(&b).await.unwrap(), vec![two]);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let index = index().await;
        index.run_migrations().await.unwrap();
    }
}
