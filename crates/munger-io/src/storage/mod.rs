//! Object storage backends.
//!
//! - `fs`: Local filesystem rooted at a directory.
//! - `cloud`: S3-compatible object stores built on top of `object_store`.
//! - `crate::memory_storage`: in-process map, for `memory://` and tests.
//!
//! Also exposes `RetryConfig` and a builder that chooses the backend from the
//! configured URI (e.g. `file:///srv/inventory`, `s3://bucket/prefix`).

mod fs;
pub use fs::FsStorage;

#[cfg(feature = "s3")]
mod cloud;
#[cfg(feature = "s3")]
pub use cloud::{CloudStorageBuilderError, S3Storage};

use std::time::Duration;

use munger_core::config::StorageConfig;

use crate::error::{Error, Result};
use crate::memory_storage::MemoryStorage;

/// Keyed object access. Keys are relative to the backend's root.
pub trait Storage: Send + Sync {
    /// Read a whole object. Missing keys are `Error::NotFound`.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Create or replace an object. Returns an ETag when the backend has one.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<Option<String>>;
}

/// Retry/backoff configuration for cloud adapters.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn from_storage_config(cfg: &StorageConfig) -> Self {
        Self {
            max_retries: cfg.retry_max_retries,
            initial_backoff: Duration::from_millis(cfg.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.retry_max_backoff_ms),
        }
    }
}

/// Build the correct storage backend using the provided configuration.
pub fn build_storage_from_config(cfg: &StorageConfig) -> Result<Box<dyn Storage>> {
    match cfg.scheme() {
        Some("s3") => {
            #[cfg(feature = "s3")]
            {
                let storage = S3Storage::new(cfg)?;
                Ok(Box::new(storage))
            }

            #[cfg(not(feature = "s3"))]
            {
                Err(Error::Config(
                    "munger was built without the `s3` feature; rebuild with `--features munger-io/s3`"
                        .into(),
                ))
            }
        }
        Some("memory") => Ok(Box::new(MemoryStorage::new())),
        Some("file") | None => {
            let root = cfg
                .uri
                .as_deref()
                .map(|uri| file_uri_to_path(uri).unwrap_or_else(|| uri.to_string()))
                .ok_or_else(|| Error::Config("storage uri is not set".into()))?;
            Ok(Box::new(FsStorage::new(root)))
        }
        Some(other) => Err(Error::Config(format!("unsupported storage scheme '{other}'"))),
    }
}

fn file_uri_to_path(uri: &str) -> Option<String> {
    let stripped = uri.strip_prefix("file://")?;
    if stripped.starts_with('/') {
        Some(stripped.to_string())
    } else {
        Some(format!("/{}", stripped))
    }
}
