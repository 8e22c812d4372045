//! Configuration and store setup shared by the `mailblob` binary.

pub mod setup;
pub mod state;

pub use setup::{open_backend, open_store, Store, StoreSetupError};
pub use state::{mask_s3_url, AppConfig, AppState, BackendConfig, S3Config, StateError};
