//! Data model shared by every stage of a cycle.
//!
//! Record rows stay as loose JSON maps: the inventory export carries many
//! columns and only the configured dimension field is ever read.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque business identifier (a GDUN in the inventory export).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One countable category, e.g. `{WASHINGTON, "WA", "1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub display_name: String,
    /// Value compared against the dimension field of each record row.
    pub external_code: String,
    /// Middle segment of the result key; unique within a catalog.
    pub output_suffix: String,
}

impl DimensionValue {
    pub fn new(
        display_name: impl Into<String>,
        external_code: impl Into<String>,
        output_suffix: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            external_code: external_code.into(),
            output_suffix: output_suffix.into(),
        }
    }
}

/// One raw inventory row: field name → value.
pub type InventoryRecord = Map<String, Value>;

/// Decoded per-customer payload. Transient; never persisted by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecordSet {
    /// Record count as declared by the export, when present. Exports are not
    /// consistent about its JSON type (`3`, `3.0`, `"3"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Value>,
    #[serde(default)]
    pub rows: Vec<InventoryRecord>,
}

impl InventoryRecordSet {
    pub fn from_rows(rows: Vec<InventoryRecord>) -> Self {
        Self {
            records: Some(Value::from(rows.len())),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Declared count as a number. `None` when absent or not numeric.
    pub fn declared_count(&self) -> Option<f64> {
        match self.records.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Insight(u64);

impl Insight {
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Published body: `{"answer": "<n>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultObject {
    pub answer: String,
}

impl ResultObject {
    pub const CONTENT_TYPE: &'static str = "application/json";

    pub fn from_insight(insight: Insight) -> Self {
        Self {
            answer: insight.to_string(),
        }
    }

    pub fn to_json_bytes(&self) -> Vec<u8> {
        // A struct of one String field cannot fail to serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_object_wire_format() {
        let obj = ResultObject::from_insight(Insight::new(2));
        assert_eq!(obj.to_json_bytes(), br#"{"answer":"2"}"#.to_vec());
    }

    #[test]
    fn customer_id_is_transparent() {
        let id: CustomerId = serde_json::from_str("\"1000\"").unwrap();
        assert_eq!(id.as_str(), "1000");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1000\"");
    }

    #[test]
    fn record_set_tolerates_missing_count() {
        let set: InventoryRecordSet = serde_json::from_str(r#"{"rows":[{"State":"WA"}]}"#).unwrap();
        assert_eq!(set.records, None);
        assert_eq!(set.declared_count(), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn declared_count_reads_numbers_and_numeric_strings() {
        let set: InventoryRecordSet =
            serde_json::from_str(r#"{"records":3.0,"rows":[]}"#).unwrap();
        assert_eq!(set.declared_count(), Some(3.0));
        let set: InventoryRecordSet =
            serde_json::from_str(r#"{"records":" 2 ","rows":[]}"#).unwrap();
        assert_eq!(set.declared_count(), Some(2.0));
        let set: InventoryRecordSet =
            serde_json::from_str(r#"{"records":"many","rows":[]}"#).unwrap();
        assert_eq!(set.declared_count(), None);
    }
}
