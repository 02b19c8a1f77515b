//! Decoding and validation of raw objects fetched from the inventory store.
//!
//! Customer exports are stored double-encoded: the object body is a JSON
//! string whose contents are the JSON record set. A body that is already an
//! object is accepted as well. Anything that does not end up as an object with
//! at least one row is rejected before extraction.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{CustomerId, InventoryRecordSet};

/// Decode and validate one customer's record payload.
pub fn decode_record_set(key: &str, bytes: &[u8]) -> Result<InventoryRecordSet> {
    let outer: Value =
        serde_json::from_slice(bytes).map_err(|e| Error::malformed(key, e.to_string()))?;

    let inner = match outer {
        Value::String(s) => serde_json::from_str::<Value>(&s)
            .map_err(|e| Error::malformed(key, format!("inner document: {e}")))?,
        other => other,
    };

    if !inner.is_object() {
        return Err(Error::malformed(key, "record payload is not an object"));
    }
    if !inner.get("rows").map(Value::is_array).unwrap_or(false) {
        return Err(Error::malformed(key, "record payload has no rows array"));
    }

    let set: InventoryRecordSet =
        serde_json::from_value(inner).map_err(|e| Error::malformed(key, e.to_string()))?;

    if let Some(n) = set.declared_count() {
        if n < 1.0 {
            return Err(Error::malformed(key, format!("declared record count {n}")));
        }
    }
    if set.rows.is_empty() {
        return Err(Error::malformed(key, "record payload has no rows"));
    }

    Ok(set)
}

/// Decode the master customer list: `[{"gduns": "1000"}, {"gduns": 2000}, ...]`.
///
/// Order and duplicates are kept as listed. Only a body that is not a JSON
/// array fails; entries without a usable identifier are logged and dropped so
/// the remaining customers still run.
pub fn decode_master_list(key: &str, bytes: &[u8]) -> Result<Vec<CustomerId>> {
    let entries: Vec<Value> =
        serde_json::from_slice(bytes).map_err(|e| Error::malformed(key, e.to_string()))?;

    let mut ids = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        match entry.get("gduns").and_then(customer_id) {
            Some(id) => ids.push(id),
            None => tracing::warn!(
                key,
                entry = i,
                "master list entry has no usable customer identifier, skipping"
            ),
        }
    }
    Ok(ids)
}

/// Strings are taken as is; numbers must be whole (`1000.0` reads as `1000`).
fn customer_id(v: &Value) -> Option<CustomerId> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(CustomerId::new(s.as_str())),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(CustomerId::new(u.to_string()))
            } else if let Some(i) = n.as_i64() {
                Some(CustomerId::new(i.to_string()))
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15)
                    .map(|f| CustomerId::new(format!("{}", f as i64)))
            }
        }
        _ => None,
    }
}

/// Encode a record set the way the inventory store holds it (double-encoded).
pub fn encode_record_set(set: &InventoryRecordSet) -> Result<Vec<u8>> {
    let inner = serde_json::to_string(set).map_err(|e| Error::malformed("<encode>", e.to_string()))?;
    serde_json::to_vec(&Value::String(inner)).map_err(|e| Error::malformed("<encode>", e.to_string()))
}
