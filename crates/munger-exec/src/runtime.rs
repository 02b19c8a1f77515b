//! Runtime: execute one full cycle and emit a `CycleReport`.
//!
//! - Fetches the master list once; any failure there aborts the cycle.
//! - Walks catalog order (outer) × customer order (inner).
//! - Per pair: fetch records → decode/validate → extract → publish.
//! - Per-pair errors are logged and recorded as skips, never propagated.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use munger_core::catalog::DimensionCatalog;
use munger_core::config::MungerConfig;
use munger_core::error::Error as CoreError;
use munger_core::extract::extract_insight;
use munger_core::key::{record_key, ResultKey};
use munger_core::payload::decode_record_set;
use munger_core::traits::{MasterListSource, RecordSource, ResultSink};
use munger_core::types::{CustomerId, DimensionValue, ResultObject};

use munger_io::storage::{build_storage_from_config, Storage};
use munger_io::{ObjectMasterList, ObjectRecordSource, ObjectResultSink};

use crate::metrics::{CycleReport, SkipKind, SkippedItem};
use crate::pool::for_each_isolated;
use crate::signal::ShutdownSignal;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("master list '{key}' unavailable: {source}")]
    MasterList {
        key: String,
        #[source]
        source: CoreError,
    },
    #[error("cycle panicked: {0}")]
    Panicked(String),
}

impl From<CoreError> for ExecError {
    fn from(e: CoreError) -> Self {
        ExecError::Config(e.to_string())
    }
}

impl From<munger_io::error::Error> for ExecError {
    fn from(e: munger_io::error::Error) -> Self {
        ExecError::Config(e.to_string())
    }
}

/// Driver owns the configuration, the catalog, and the three collaborators.
pub struct Driver {
    cfg: MungerConfig,
    catalog: DimensionCatalog,
    master: Arc<dyn MasterListSource>,
    records: Arc<dyn RecordSource>,
    sink: Arc<dyn ResultSink>,
    cycles: AtomicU64,
}

impl Driver {
    /// Validates the configuration; a driver is never built from a config
    /// that would fail at cycle time.
    pub fn new(
        cfg: MungerConfig,
        catalog: DimensionCatalog,
        master: Arc<dyn MasterListSource>,
        records: Arc<dyn RecordSource>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self, ExecError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            catalog,
            master,
            records,
            sink,
            cycles: AtomicU64::new(0),
        })
    }

    /// Build object-store collaborators from `cfg.source` / `cfg.sink`.
    pub fn from_config(cfg: MungerConfig, catalog: DimensionCatalog) -> Result<Self, ExecError> {
        let source: Arc<dyn Storage> = Arc::from(build_storage_from_config(&cfg.source)?);
        let sink: Arc<dyn Storage> = Arc::from(build_storage_from_config(&cfg.sink)?);
        let master = Arc::new(ObjectMasterList::new(Arc::clone(&source)));
        let records = Arc::new(ObjectRecordSource::new(source, cfg.record_key_suffix.clone()));
        let sink = Arc::new(ObjectResultSink::new(sink));
        Self::new(cfg, catalog, master, records, sink)
    }

    pub fn config(&self) -> &MungerConfig {
        &self.cfg
    }

    pub fn catalog(&self) -> &DimensionCatalog {
        &self.catalog
    }

    /// Execute one cycle. `Err` only for cycle-level failures (master list).
    pub fn run_cycle(&self, shutdown: &ShutdownSignal) -> Result<CycleReport, ExecError> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let started_ms = now_ms();
        tracing::info!(cycle, master_list = %self.cfg.master_list_key, "starting cycle");

        let customers = self
            .master
            .fetch_customers(&self.cfg.master_list_key)
            .map_err(|source| ExecError::MasterList {
                key: self.cfg.master_list_key.clone(),
                source,
            })?;

        let mut report = CycleReport::new(cycle, started_ms, customers.len(), self.catalog.len());

        for dimension in self.catalog.list() {
            if shutdown.is_triggered() {
                report.cancelled = true;
                break;
            }
            tracing::debug!(
                dimension = %dimension.display_name,
                suffix = %dimension.output_suffix,
                "processing dimension value"
            );

            let run = for_each_isolated(
                &customers,
                self.cfg.max_parallel_customers,
                shutdown,
                |customer| self.process_item(dimension, customer),
            );
            for (_, outcome) in run.outcomes {
                match outcome {
                    Ok(_) => report.record_published(),
                    Err(skip) => report.record_skipped(skip),
                }
            }
            if run.cancelled {
                report.cancelled = true;
                break;
            }
        }

        if report.cancelled {
            tracing::warn!(cycle, attempted = report.attempted, "cycle cancelled by shutdown");
        }
        report.finish(now_ms());
        report.emit_summary();
        Ok(report)
    }

    /// One (dimension, customer) pair. Returns the sink's confirmation token.
    fn process_item(
        &self,
        dimension: &DimensionValue,
        customer: &CustomerId,
    ) -> Result<String, SkippedItem> {
        let raw = self
            .records
            .fetch_records(customer)
            .map_err(|e| skip(dimension, customer, SkipKind::from_fetch_error(&e), &e))?;

        let source_key = record_key(customer, &self.cfg.record_key_suffix);
        let records = decode_record_set(&source_key, &raw)
            .map_err(|e| skip(dimension, customer, SkipKind::from_fetch_error(&e), &e))?;

        let insight = extract_insight(&self.cfg.dimension_field, dimension, &records);
        let key = ResultKey::for_dimension(customer, dimension, &self.cfg.munger_version);
        let token = self
            .sink
            .put(&key, &ResultObject::from_insight(insight))
            .map_err(|e| skip(dimension, customer, SkipKind::Publish, &e))?;

        tracing::debug!(%key, insight = insight.get(), "published insight");
        Ok(token)
    }
}

fn skip(
    dimension: &DimensionValue,
    customer: &CustomerId,
    kind: SkipKind,
    err: &CoreError,
) -> SkippedItem {
    tracing::warn!(
        customer = %customer,
        suffix = %dimension.output_suffix,
        kind = err.kind(),
        error = %err,
        "skipping customer, moving on to the next"
    );
    SkippedItem {
        customer: customer.to_string(),
        suffix: dimension.output_suffix.clone(),
        kind,
        reason: err.to_string(),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
