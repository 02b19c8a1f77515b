//! Convenient re-exports for downstream crates.

pub use crate::catalog::DimensionCatalog;
pub use crate::config::{MungerConfig, StorageConfig};
pub use crate::error::{Error, Result};
pub use crate::extract::extract_insight;
pub use crate::key::{record_key, ResultKey};
pub use crate::payload::{decode_master_list, decode_record_set};
pub use crate::traits::{MasterListSource, RecordSource, ResultSink};
pub use crate::types::{
    CustomerId, DimensionValue, Insight, InventoryRecord, InventoryRecordSet, ResultObject,
};
