//! Pipeline configuration that downstream crates can serialize/deserialize.
//!
//! Built once at startup (defaults → env → config file → CLI flags) and
//! passed by value into the driver and scheduler. Nothing reads process
//! state after that.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MungerConfig {
    /// Field of a raw record row that carries the dimension code (e.g. `State`).
    pub dimension_field: String,

    /// Output schema version; last segment of every result key.
    pub munger_version: String,

    /// Delay between the end of one cycle and the start of the next.
    pub cycle_interval_secs: u64,

    /// Key of the master customer list in the source store.
    pub master_list_key: String,

    /// Appended to a customer id to form its record key.
    pub record_key_suffix: String,

    /// Customers processed concurrently within one dimension value. 1 = sequential.
    pub max_parallel_customers: usize,

    /// Where raw inventory lives.
    pub source: StorageConfig,

    /// Where results are published.
    pub sink: StorageConfig,
}

impl Default for MungerConfig {
    fn default() -> Self {
        Self {
            dimension_field: "State".to_string(),
            munger_version: "4".to_string(),
            cycle_interval_secs: 86_400, // 24 hours
            master_list_key: "PNWandNCAcustomers.json".to_string(),
            record_key_suffix: ".json".to_string(),
            max_parallel_customers: 1,
            source: StorageConfig::with_uri("s3://pacnwinstalls"),
            sink: StorageConfig::with_uri("s3://munger-insights"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `s3://bucket/prefix`, `file:///dir`, a bare path, or `memory://`.
    pub uri: Option<String>,
    /// Custom endpoint for S3-compatible stores (ECS, MinIO, ...).
    pub endpoint: Option<String>,
    pub allow_http: bool,
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub retry_max_retries: usize,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uri: None,
            endpoint: None,
            allow_http: false,
            aws_region: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            retry_max_retries: 3,
            retry_initial_backoff_ms: 200,
            retry_max_backoff_ms: 5_000,
        }
    }
}

impl StorageConfig {
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        self.uri
            .as_deref()
            .filter(|uri| uri.contains("://"))
            .and_then(|uri| uri.split("://").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Apply `<prefix>_URI`, `<prefix>_ENDPOINT`, ... overrides.
    fn apply_env(&mut self, prefix: &str) {
        let var = |name: &str| std::env::var(format!("{prefix}_{name}")).ok();

        if let Some(s) = var("URI") {
            self.uri = Some(s);
        }
        if let Some(s) = var("ENDPOINT") {
            self.endpoint = Some(s);
        }
        if let Some(s) = var("ALLOW_HTTP") {
            if let Ok(v) = s.parse::<bool>() {
                self.allow_http = v;
            }
        }
        if let Some(s) = var("REGION") {
            self.aws_region = Some(s);
        }
        if let Some(s) = var("ACCESS_KEY_ID") {
            self.aws_access_key_id = Some(s);
        }
        if let Some(s) = var("SECRET_ACCESS_KEY") {
            self.aws_secret_access_key = Some(s);
        }
        if let Some(s) = var("SESSION_TOKEN") {
            self.aws_session_token = Some(s);
        }
    }

    fn apply_retry_env(&mut self) {
        if let Ok(s) = std::env::var("MUNGER_RETRY_MAX_RETRIES") {
            if let Ok(v) = s.parse::<usize>() {
                self.retry_max_retries = v;
            }
        }

        if let Ok(s) = std::env::var("MUNGER_RETRY_INITIAL_MS") {
            if let Ok(v) = s.parse::<u64>() {
                self.retry_initial_backoff_ms = v;
            }
        }

        if let Ok(s) = std::env::var("MUNGER_RETRY_MAX_MS") {
            if let Ok(v) = s.parse::<u64>() {
                self.retry_max_backoff_ms = v;
            }
        }
    }
}

impl MungerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `MUNGER_DIMENSION_FIELD`: record field compared against dimension codes
    /// - `MUNGER_VERSION`: munger version segment of result keys
    /// - `MUNGER_CYCLE_INTERVAL_SECS`: delay between cycles
    /// - `MUNGER_MASTER_LIST_KEY`: key of the customer list
    /// - `MUNGER_RECORD_KEY_SUFFIX`: record key suffix
    /// - `MUNGER_MAX_PARALLEL_CUSTOMERS`: worker pool size
    /// - `MUNGER_SOURCE_*` / `MUNGER_SINK_*`: `URI`, `ENDPOINT`, `ALLOW_HTTP`,
    ///   `REGION`, `ACCESS_KEY_ID`, `SECRET_ACCESS_KEY`, `SESSION_TOKEN`
    /// - `MUNGER_RETRY_MAX_RETRIES`, `MUNGER_RETRY_INITIAL_MS`, `MUNGER_RETRY_MAX_MS`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("MUNGER_DIMENSION_FIELD") {
            cfg.dimension_field = s;
        }

        if let Ok(s) = std::env::var("MUNGER_VERSION") {
            cfg.munger_version = s;
        }

        if let Ok(s) = std::env::var("MUNGER_CYCLE_INTERVAL_SECS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.cycle_interval_secs = v;
            }
        }

        if let Ok(s) = std::env::var("MUNGER_MASTER_LIST_KEY") {
            cfg.master_list_key = s;
        }

        if let Ok(s) = std::env::var("MUNGER_RECORD_KEY_SUFFIX") {
            cfg.record_key_suffix = s;
        }

        if let Ok(s) = std::env::var("MUNGER_MAX_PARALLEL_CUSTOMERS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_parallel_customers = v;
            }
        }

        cfg.source.apply_env("MUNGER_SOURCE");
        cfg.sink.apply_env("MUNGER_SINK");
        cfg.source.apply_retry_env();
        cfg.sink.apply_retry_env();

        cfg
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    /// Startup checks. Any error here is fatal: no cycle may start.
    pub fn validate(&self) -> Result<()> {
        if self.dimension_field.trim().is_empty() {
            return Err(Error::Config("dimension_field must be set".into()));
        }
        if self.munger_version.trim().is_empty() {
            return Err(Error::Config("munger_version must be set".into()));
        }
        if self.munger_version.contains('.') {
            return Err(Error::Config(format!(
                "munger_version '{}' must not contain '.'",
                self.munger_version
            )));
        }
        if self.cycle_interval_secs == 0 {
            return Err(Error::Config("cycle_interval_secs must be > 0".into()));
        }
        if self.max_parallel_customers == 0 {
            return Err(Error::Config("max_parallel_customers must be >= 1".into()));
        }
        if self.master_list_key.is_empty() {
            return Err(Error::Config("master_list_key must be set".into()));
        }
        Ok(())
    }
}
