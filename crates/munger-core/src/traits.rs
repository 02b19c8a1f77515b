//! Collaborator seams used by the cycle driver.
//!
//! `munger-io` provides object-store backed implementations; tests plug in
//! in-memory fakes.

use crate::error::Result;
use crate::key::ResultKey;
use crate::types::{CustomerId, ResultObject};

/// Source of the authoritative customer list.
pub trait MasterListSource: Send + Sync {
    /// Fetch the list stored under `key`. Errors abort the whole cycle.
    fn fetch_customers(&self, key: &str) -> Result<Vec<CustomerId>>;
}

/// Source of raw per-customer inventory payloads.
pub trait RecordSource: Send + Sync {
    /// Raw bytes; decoding and validation happen in the caller.
    fn fetch_records(&self, customer: &CustomerId) -> Result<Vec<u8>>;
}

/// Destination for published results.
pub trait ResultSink: Send + Sync {
    /// Write (or overwrite) the object at `key`. Returns a confirmation token.
    fn put(&self, key: &ResultKey, body: &ResultObject) -> Result<String>;
}
