//! Pipeline collaborators backed by a `Storage`.
//!
//! The source bucket holds the master list and one export per customer; the
//! sink bucket receives one small JSON object per (customer, dimension).

use std::sync::Arc;

use munger_core::error::Result;
use munger_core::key::{record_key, ResultKey};
use munger_core::payload::decode_master_list;
use munger_core::traits::{MasterListSource, RecordSource, ResultSink};
use munger_core::types::{CustomerId, ResultObject};

use crate::storage::Storage;

pub struct ObjectMasterList {
    storage: Arc<dyn Storage>,
}

impl ObjectMasterList {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl MasterListSource for ObjectMasterList {
    fn fetch_customers(&self, key: &str) -> Result<Vec<CustomerId>> {
        let bytes = self.storage.get(key)?;
        let customers = decode_master_list(key, &bytes)?;
        tracing::info!(key, customers = customers.len(), "loaded master customer list");
        Ok(customers)
    }
}

pub struct ObjectRecordSource {
    storage: Arc<dyn Storage>,
    key_suffix: String,
}

impl ObjectRecordSource {
    pub fn new(storage: Arc<dyn Storage>, key_suffix: impl Into<String>) -> Self {
        Self {
            storage,
            key_suffix: key_suffix.into(),
        }
    }
}

impl RecordSource for ObjectRecordSource {
    fn fetch_records(&self, customer: &CustomerId) -> Result<Vec<u8>> {
        let key = record_key(customer, &self.key_suffix);
        Ok(self.storage.get(&key)?)
    }
}

pub struct ObjectResultSink {
    storage: Arc<dyn Storage>,
}

impl ObjectResultSink {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl ResultSink for ObjectResultSink {
    fn put(&self, key: &ResultKey, body: &ResultObject) -> Result<String> {
        let etag = self.storage.put(
            key.as_str(),
            &body.to_json_bytes(),
            ResultObject::CONTENT_TYPE,
        )?;
        Ok(etag.unwrap_or_else(|| key.to_string()))
    }
}
