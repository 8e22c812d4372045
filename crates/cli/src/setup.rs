//! Opening the configured store.

use common::{DeduplicatingBlobStore, HashAlgorithm, TimeoutBlobStore};
use mailblob_object_store::{ObjectBlobStore, SetupError};

use crate::state::{AppState, BackendConfig, StateError};

/// The store every command works against: configured hash policy, every
/// backend call bounded by the configured timeout.
pub type Store = DeduplicatingBlobStore<TimeoutBlobStore<ObjectBlobStore>, HashAlgorithm>;

/// Open the backend described by `state`.
///
/// The index lives next to the config unless the backend is in-memory, in
/// which case the index is in-memory too.
pub async fn open_backend(state: &AppState) -> Result<ObjectBlobStore, StoreSetupError> {
    let config = &state.config;
    let object_config = config.object_store_config()?;
    let options = config.store_options();

    tracing::info!(
        backend = %config.backend.describe(),
        default_bucket = %config.default_bucket,
        hash = %config.hash,
        "opening blob store"
    );

    let backend = match config.backend {
        BackendConfig::Memory => ObjectBlobStore::in_memory(object_config, options).await?,
        _ => ObjectBlobStore::new(&state.index_path, object_config, options).await?,
    };
    Ok(backend)
}

/// Open the backend and wrap it in the deduplicating store
pub async fn open_store(state: &AppState) -> Result<Store, StoreSetupError> {
    let backend = open_backend(state).await?;
    let config = &state.config;
    Ok(DeduplicatingBlobStore::new(
        TimeoutBlobStore::new(backend, config.timeout()),
        config.hash,
        config.default_bucket.clone(),
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreSetupError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("failed to open blob store: {0}")]
    Backend(#[from] SetupError),
}

#[cfg(test)]
mod tests {
    use common::{BucketName, ContentHasher, Sha256Hasher};

    use super::*;
    use crate::state::AppConfig;

    #[tokio::test]
    async fn test_open_local_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = AppState::init(Some(temp_dir.path().to_path_buf()), None).unwrap();

        let store = open_store(&state).await.unwrap();
        let id = store.save_default(&b"hello"[..]).await.unwrap();
        assert_eq!(store.read_default(&id).await.unwrap().as_ref(), b"hello");
        assert!(state.index_path.exists());

        // a second open sees what the first stored
        store.raw().inner().close().await;
        let reopened = open_store(&AppState::load(Some(state.dir.clone())).unwrap())
            .await
            .unwrap();
        assert!(reopened.exists(&BucketName::default_bucket(), &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_configured_policy_and_bucket() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::new(BackendConfig::Memory);
        config.hash = HashAlgorithm::Sha256;
        config.default_bucket = BucketName::new("mail").unwrap();
        let state = AppState::init(Some(temp_dir.path().to_path_buf()), Some(config)).unwrap();

        let store = open_store(&state).await.unwrap();
        let id = store.save_default(&b"body"[..]).await.unwrap();
        assert_eq!(id, Sha256Hasher.hash(b"body"));
        assert_eq!(store.default_bucket().as_str(), "mail");
        assert!(!state.index_path.exists());
    }
}
