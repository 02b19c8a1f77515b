use std::future::Future;
use std::sync::Arc;
use std::thread;

use munger_core::config::StorageConfig;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, ObjectStore, PutOptions,
    PutPayload,
};
use tokio::runtime::Runtime;
use url::Url;

use super::{RetryConfig, Storage};
use crate::error::{Error, Result};

#[derive(Debug, thiserror::Error)]
pub enum CloudStorageBuilderError {
    #[error("missing storage URI for {scheme} storage")]
    MissingUri { scheme: &'static str },

    #[error("unsupported or malformed URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URI '{uri}' missing bucket component")]
    MissingBucket { uri: String },

    #[error("failed to initialize async runtime: {0}")]
    Runtime(String),

    #[error("object_store builder error: {0}")]
    Builder(String),
}

impl From<CloudStorageBuilderError> for Error {
    fn from(err: CloudStorageBuilderError) -> Self {
        Error::Config(err.to_string())
    }
}

#[derive(Debug, Clone)]
struct CloudIdentity {
    bucket: String,
    prefix: String,
}

impl CloudIdentity {
    fn new_s3(uri: &str) -> std::result::Result<Self, CloudStorageBuilderError> {
        let parsed = Url::parse(uri).map_err(|source| CloudStorageBuilderError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;
        if parsed.scheme() != "s3" {
            return Err(CloudStorageBuilderError::MissingUri { scheme: "s3" });
        }
        let bucket = parsed
            .host_str()
            .ok_or_else(|| CloudStorageBuilderError::MissingBucket {
                uri: uri.to_string(),
            })?
            .to_string();
        let prefix = parsed.path().trim_matches('/').to_string();
        Ok(Self { bucket, prefix })
    }

    fn key_from_relative(&self, rel: &str) -> String {
        if self.prefix.is_empty() {
            rel.to_string()
        } else if rel.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), rel)
        }
    }
}

/// Blocking facade over an async `ObjectStore`.
///
/// Owns a private runtime; must not be called from inside another tokio
/// runtime.
struct CloudStorage {
    runtime: Runtime,
    store: Arc<dyn ObjectStore>,
    identity: CloudIdentity,
    retry: RetryConfig,
}

impl CloudStorage {
    fn new(
        store: Arc<dyn ObjectStore>,
        identity: CloudIdentity,
        retry: RetryConfig,
    ) -> std::result::Result<Self, CloudStorageBuilderError> {
        let runtime =
            Runtime::new().map_err(|e| CloudStorageBuilderError::Runtime(e.to_string()))?;
        Ok(Self {
            runtime,
            store,
            identity,
            retry,
        })
    }

    fn object_path(&self, key: &str) -> ObjectPath {
        ObjectPath::from(self.identity.key_from_relative(key))
    }

    fn run_with_retry<F, Fut, T>(&self, key: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = object_store::Result<T>>,
    {
        let mut attempt = 0usize;
        let mut backoff = self.retry.initial_backoff;

        loop {
            match self.runtime.block_on(op()) {
                Ok(value) => return Ok(value),
                Err(ObjectStoreError::NotFound { .. }) => {
                    return Err(Error::NotFound {
                        key: key.to_string(),
                    })
                }
                Err(err) => {
                    if attempt >= self.retry.max_retries || !is_retryable(&err) {
                        return Err(Error::Storage(format!("{err}")));
                    }
                    attempt += 1;
                    tracing::debug!(key, attempt, error = %err, "retrying object store request");
                    thread::sleep(backoff);
                    backoff = std::cmp::min(backoff * 2, self.retry.max_backoff);
                }
            }
        }
    }
}

fn is_retryable(err: &ObjectStoreError) -> bool {
    !matches!(
        err,
        ObjectStoreError::NotFound { .. }
            | ObjectStoreError::AlreadyExists { .. }
            | ObjectStoreError::InvalidPath { .. }
            | ObjectStoreError::NotSupported { .. }
    )
}

impl Storage for CloudStorage {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let obj_path = self.object_path(key);
        self.run_with_retry(key, || {
            let store = Arc::clone(&self.store);
            let obj_path = obj_path.clone();
            async move { store.get(&obj_path).await?.bytes().await }
        })
        .map(|bytes| bytes.to_vec())
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<Option<String>> {
        let obj_path = self.object_path(key);
        let data = bytes::Bytes::copy_from_slice(bytes);
        let content_type = content_type.to_string();
        self.run_with_retry(key, || {
            let store = Arc::clone(&self.store);
            let obj_path = obj_path.clone();
            let payload = PutPayload::from(data.clone());
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, content_type.clone().into());
            let opts = PutOptions {
                attributes,
                ..Default::default()
            };
            async move { store.put_opts(&obj_path, payload, opts).await }
        })
        .map(|res| res.e_tag)
    }
}

/// Client-level retries are off; `run_with_retry` is the only retry layer.
fn client_retry() -> object_store::RetryConfig {
    object_store::RetryConfig {
        max_retries: 0,
        ..Default::default()
    }
}

/// S3 or S3-compatible bucket (`s3://bucket/prefix`). A custom `endpoint`
/// switches to path-style addressing for on-prem stores such as ECS.
pub struct S3Storage {
    inner: CloudStorage,
}

impl S3Storage {
    pub fn new(cfg: &StorageConfig) -> std::result::Result<Self, CloudStorageBuilderError> {
        let uri = cfg
            .uri
            .as_deref()
            .ok_or(CloudStorageBuilderError::MissingUri { scheme: "s3" })?;
        let identity = CloudIdentity::new_s3(uri)?;
        let retry = RetryConfig::from_storage_config(cfg);
        let mut builder = AmazonS3Builder::new().with_bucket_name(identity.bucket.clone());
        if let Some(region) = &cfg.aws_region {
            builder = builder.with_region(region.clone());
        }
        if let Some(endpoint) = &cfg.endpoint {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_virtual_hosted_style_request(false);
        }
        if cfg.allow_http {
            builder = builder.with_allow_http(true);
        }
        if let Some(access_key) = &cfg.aws_access_key_id {
            builder = builder.with_access_key_id(access_key.clone());
        }
        if let Some(secret_key) = &cfg.aws_secret_access_key {
            builder = builder.with_secret_access_key(secret_key.clone());
        }
        if let Some(token) = &cfg.aws_session_token {
            builder = builder.with_token(token.clone());
        }
        builder = builder.with_retry(client_retry());
        let store: AmazonS3 = builder
            .build()
            .map_err(|e| CloudStorageBuilderError::Builder(e.to_string()))?;
        let inner = CloudStorage::new(Arc::new(store), identity, retry)?;
        Ok(Self { inner })
    }
}

impl Storage for S3Storage {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<Option<String>> {
        self.inner.put(key, bytes, content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_splits_bucket_and_prefix() {
        let id = CloudIdentity::new_s3("s3://munger-insights/answers/").unwrap();
        assert_eq!(id.bucket, "munger-insights");
        assert_eq!(id.key_from_relative("1000.1.4"), "answers/1000.1.4");

        let bare = CloudIdentity::new_s3("s3://pacnwinstalls").unwrap();
        assert_eq!(bare.key_from_relative("1000.json"), "1000.json");
    }

    #[test]
    fn client_does_not_retry_on_its_own() {
        assert_eq!(client_retry().max_retries, 0);
    }

    #[test]
    fn identity_rejects_other_schemes() {
        assert!(CloudIdentity::new_s3("gs://bucket").is_err());
        assert!(CloudIdentity::new_s3("not a uri").is_err());
    }
}
