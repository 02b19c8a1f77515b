//! Shared fakes and payload builders for the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use munger_core::catalog::DimensionCatalog;
use munger_core::config::MungerConfig;
use munger_core::error::{Error, Result};
use munger_core::key::ResultKey;
use munger_core::payload::encode_record_set;
use munger_core::traits::{MasterListSource, RecordSource, ResultSink};
use munger_core::types::{
    CustomerId, DimensionValue, InventoryRecord, InventoryRecordSet, ResultObject,
};
use munger_exec::Driver;
use munger_io::{MemoryStorage, ObjectRecordSource, ObjectResultSink, Storage};
use serde_json::json;

/// Master list that returns a fixed customer list and records every call.
pub struct FakeMasterList {
    customers: Vec<CustomerId>,
    fail: bool,
    panic_on_first: bool,
    pub calls: AtomicUsize,
    pub started: Mutex<Vec<Instant>>,
}

impl FakeMasterList {
    pub fn new(customers: &[&str]) -> Self {
        Self {
            customers: customers.iter().map(|c| CustomerId::new(*c)).collect(),
            fail: false,
            panic_on_first: false,
            calls: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn panicking_once(customers: &[&str]) -> Self {
        Self {
            panic_on_first: true,
            ..Self::new(customers)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn start_times(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }
}

impl MasterListSource for FakeMasterList {
    fn fetch_customers(&self, key: &str) -> Result<Vec<CustomerId>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().push(Instant::now());
        if self.panic_on_first && n == 0 {
            panic!("master list exploded");
        }
        if self.fail {
            return Err(Error::Transport(format!("{key}: connection refused")));
        }
        Ok(self.customers.clone())
    }
}

/// Record source over a `MemoryStorage` that counts fetches and can be told
/// to fail specific customers with a transport error.
pub struct CountingRecords {
    inner: ObjectRecordSource,
    failing: HashSet<String>,
    pub calls: AtomicUsize,
}

impl CountingRecords {
    pub fn new(storage: &MemoryStorage) -> Self {
        Self {
            inner: ObjectRecordSource::new(Arc::new(storage.clone()), ".json"),
            failing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_for(mut self, customer: &str) -> Self {
        self.failing.insert(customer.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordSource for CountingRecords {
    fn fetch_records(&self, customer: &CustomerId) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(customer.as_str()) {
            return Err(Error::Transport(format!("{customer}: read timed out")));
        }
        self.inner.fetch_records(customer)
    }
}

/// Result sink over a `MemoryStorage` that rejects writes for chosen customers.
pub struct FailingSink {
    inner: ObjectResultSink,
    failing: HashSet<String>,
}

impl FailingSink {
    pub fn new(storage: &MemoryStorage, customers: &[&str]) -> Self {
        Self {
            inner: ObjectResultSink::new(Arc::new(storage.clone())),
            failing: customers.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ResultSink for FailingSink {
    fn put(&self, key: &ResultKey, body: &ResultObject) -> Result<String> {
        let customer = key.as_str().split('.').next().unwrap_or_default();
        if self.failing.contains(customer) {
            return Err(Error::Transport(format!("{key}: access denied")));
        }
        self.inner.put(key, body)
    }
}

/// Wire payload for a customer whose rows carry the given `State` values.
pub fn state_payload(states: &[&str]) -> Vec<u8> {
    let rows = states
        .iter()
        .map(|s| {
            let mut row = InventoryRecord::new();
            row.insert("State".into(), json!(s));
            row.insert("Model".into(), json!("VNX5300"));
            row
        })
        .collect();
    encode_record_set(&InventoryRecordSet::from_rows(rows)).unwrap()
}

pub fn washington_only() -> DimensionCatalog {
    DimensionCatalog::new(vec![DimensionValue::new("WASHINGTON", "WA", "1")]).unwrap()
}

pub fn driver_with(
    cfg: MungerConfig,
    catalog: DimensionCatalog,
    master: Arc<FakeMasterList>,
    records: Arc<CountingRecords>,
    sink: &MemoryStorage,
) -> Driver {
    Driver::new(
        cfg,
        catalog,
        master,
        records,
        Arc::new(ObjectResultSink::new(Arc::new(sink.clone()))),
    )
    .unwrap()
}

pub fn body(sink: &MemoryStorage, key: &str) -> Option<String> {
    sink.get(key).ok().map(|b| String::from_utf8(b).unwrap())
}
