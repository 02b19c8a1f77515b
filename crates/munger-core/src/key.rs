//! Deterministic output addressing.
//!
//! A key is `<customer>.<suffix>.<munger version>`. The same triple always
//! yields the same key, so re-running a cycle overwrites instead of
//! accumulating objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{CustomerId, DimensionValue};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultKey(String);

impl ResultKey {
    pub fn compose(customer: &CustomerId, output_suffix: &str, munger_version: &str) -> Self {
        Self(format!("{customer}.{output_suffix}.{munger_version}"))
    }

    pub fn for_dimension(
        customer: &CustomerId,
        dimension: &DimensionValue,
        munger_version: &str,
    ) -> Self {
        Self::compose(customer, &dimension.output_suffix, munger_version)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResultKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Object key of a customer's raw inventory export (`<customer><suffix>`).
pub fn record_key(customer: &CustomerId, record_key_suffix: &str) -> String {
    format!("{customer}{record_key_suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_dotted_key() {
        let dim = DimensionValue::new("WASHINGTON", "WA", "1");
        let key = ResultKey::for_dimension(&CustomerId::new("1000"), &dim, "4");
        assert_eq!(key.as_str(), "1000.1.4");
    }

    #[test]
    fn same_inputs_same_key() {
        let c = CustomerId::new("98765");
        let a = ResultKey::compose(&c, "3", "4");
        let b = ResultKey::compose(&c, "3", "4");
        assert_eq!(a, b);
        assert_ne!(a, ResultKey::compose(&c, "3", "5"));
        assert_ne!(a, ResultKey::compose(&c, "2", "4"));
    }

    #[test]
    fn record_key_appends_suffix() {
        assert_eq!(record_key(&CustomerId::new("1000"), ".json"), "1000.json");
    }
}
