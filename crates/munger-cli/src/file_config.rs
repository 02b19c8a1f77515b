//! YAML config file overlay.
//!
//! Every field is optional; present fields override env/defaults, absent ones
//! leave them alone. Example:
//! ```yaml
//! munger_version: "4"
//! dimension_field: State
//! source: { uri: "s3://pacnwinstalls", endpoint: "http://10.4.44.125:9020", allow_http: true }
//! sink:   { uri: "s3://munger-insights", aws_region: "us-east-1" }
//! catalog:
//!   - { display_name: WASHINGTON, external_code: WA, output_suffix: "1" }
//!   - { display_name: OREGON,     external_code: OR, output_suffix: "2" }
//! ```

use serde::Deserialize;

use munger_core::catalog::DimensionCatalog;
use munger_core::config::{MungerConfig, StorageConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub dimension_field: Option<String>,
    pub munger_version: Option<String>,
    pub cycle_interval_secs: Option<u64>,
    pub master_list_key: Option<String>,
    pub record_key_suffix: Option<String>,
    pub max_parallel_customers: Option<usize>,
    pub source: Option<StorageOverrides>,
    pub sink: Option<StorageOverrides>,
    /// Replaces the built-in catalog; validated while parsing.
    pub catalog: Option<DimensionCatalog>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageOverrides {
    pub uri: Option<String>,
    pub endpoint: Option<String>,
    pub allow_http: Option<bool>,
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub retry_max_retries: Option<usize>,
    pub retry_initial_backoff_ms: Option<u64>,
    pub retry_max_backoff_ms: Option<u64>,
}

pub fn parse_config_file(yaml: &str) -> Result<FileConfig, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(yaml)
}

pub fn apply_file_config(cfg: &mut MungerConfig, doc: &FileConfig) {
    if let Some(v) = &doc.dimension_field {
        cfg.dimension_field = v.clone();
    }
    if let Some(v) = &doc.munger_version {
        cfg.munger_version = v.clone();
    }
    if let Some(v) = doc.cycle_interval_secs {
        cfg.cycle_interval_secs = v;
    }
    if let Some(v) = &doc.master_list_key {
        cfg.master_list_key = v.clone();
    }
    if let Some(v) = &doc.record_key_suffix {
        cfg.record_key_suffix = v.clone();
    }
    if let Some(v) = doc.max_parallel_customers {
        cfg.max_parallel_customers = v;
    }
    if let Some(o) = &doc.source {
        apply_storage_overrides(&mut cfg.source, o);
    }
    if let Some(o) = &doc.sink {
        apply_storage_overrides(&mut cfg.sink, o);
    }
}

fn apply_storage_overrides(cfg: &mut StorageConfig, o: &StorageOverrides) {
    if let Some(v) = &o.uri {
        cfg.uri = Some(v.clone());
    }
    if let Some(v) = &o.endpoint {
        cfg.endpoint = Some(v.clone());
    }
    if let Some(v) = o.allow_http {
        cfg.allow_http = v;
    }
    if let Some(v) = &o.aws_region {
        cfg.aws_region = Some(v.clone());
    }
    if let Some(v) = &o.aws_access_key_id {
        cfg.aws_access_key_id = Some(v.clone());
    }
    if let Some(v) = &o.aws_secret_access_key {
        cfg.aws_secret_access_key = Some(v.clone());
    }
    if let Some(v) = &o.aws_session_token {
        cfg.aws_session_token = Some(v.clone());
    }
    if let Some(v) = o.retry_max_retries {
        cfg.retry_max_retries = v;
    }
    if let Some(v) = o.retry_initial_backoff_ms {
        cfg.retry_initial_backoff_ms = v;
    }
    if let Some(v) = o.retry_max_backoff_ms {
        cfg.retry_max_backoff_ms = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_only_present_fields() {
        let doc = parse_config_file(
            r#"
munger_version: "5"
sink:
  uri: "memory://"
"#,
        )
        .unwrap();
        let mut cfg = MungerConfig::default();
        apply_file_config(&mut cfg, &doc);
        assert_eq!(cfg.munger_version, "5");
        assert_eq!(cfg.dimension_field, "State");
        assert_eq!(cfg.sink.uri.as_deref(), Some("memory://"));
        assert_eq!(cfg.source.uri.as_deref(), Some("s3://pacnwinstalls"));
        assert!(doc.catalog.is_none());
    }

    #[test]
    fn parses_catalog() {
        let doc = parse_config_file(
            r#"
catalog:
  - { display_name: NEVADA, external_code: NV, output_suffix: "6" }
  - { display_name: UTAH, external_code: UT, output_suffix: "7" }
"#,
        )
        .unwrap();
        let cat = doc.catalog.unwrap();
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.list()[1].external_code, "UT");
    }

    #[test]
    fn duplicate_suffix_in_file_is_rejected() {
        let res = parse_config_file(
            r#"
catalog:
  - { display_name: A, external_code: A, output_suffix: "1" }
  - { display_name: B, external_code: B, output_suffix: "1" }
"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config_file("munger_number: 4\n").is_err());
    }
}
