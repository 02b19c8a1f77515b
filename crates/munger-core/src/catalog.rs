//! Static list of dimension values to count.
//!
//! Invariant: `output_suffix` is unique across the catalog. Two values sharing
//! a suffix would publish to the same key and silently overwrite each other,
//! so construction rejects that as a configuration error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::DimensionValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DimensionCatalog {
    values: Vec<DimensionValue>,
}

impl DimensionCatalog {
    /// Validate and build a catalog. Order is preserved and is the outer
    /// iteration order of a cycle.
    pub fn new(values: Vec<DimensionValue>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::Config("dimension catalog is empty".into()));
        }

        let mut seen = HashSet::with_capacity(values.len());
        for v in &values {
            if v.external_code.is_empty() {
                return Err(Error::Config(format!(
                    "dimension '{}' has an empty external code",
                    v.display_name
                )));
            }
            if v.output_suffix.is_empty() {
                return Err(Error::Config(format!(
                    "dimension '{}' has an empty output suffix",
                    v.display_name
                )));
            }
            if !seen.insert(v.output_suffix.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate output suffix '{}' (dimension '{}')",
                    v.output_suffix, v.display_name
                )));
            }
        }

        Ok(Self { values })
    }

    pub fn list(&self) -> &[DimensionValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for DimensionCatalog {
    /// Pacific-northwest and southwest states, in publishing order.
    fn default() -> Self {
        Self {
            values: vec![
                DimensionValue::new("WASHINGTON", "WA", "1"),
                DimensionValue::new("OREGON", "OR", "2"),
                DimensionValue::new("IDAHO", "ID", "3"),
                DimensionValue::new("ARIZONA", "AZ", "4"),
                DimensionValue::new("CALIFORNIA", "CA", "5"),
            ],
        }
    }
}

impl<'de> Deserialize<'de> for DimensionCatalog {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<DimensionValue>::deserialize(deserializer)?;
        DimensionCatalog::new(values).map_err(serde::de::Error::custom)
    }
}
