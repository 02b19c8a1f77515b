//! Insight extraction: count rows matching a dimension value.

use serde_json::Value;

use crate::types::{DimensionValue, Insight, InventoryRecordSet};

/// Count rows whose `dimension_field` equals `dimension.external_code`.
///
/// Exact, case-sensitive string comparison; non-string field values never
/// match. Callers validate the payload first (see [`crate::payload`]), but an
/// empty set is still well defined and yields zero.
pub fn extract_insight(
    dimension_field: &str,
    dimension: &DimensionValue,
    records: &InventoryRecordSet,
) -> Insight {
    let n = records
        .rows
        .iter()
        .filter(|row| match row.get(dimension_field) {
            Some(Value::String(v)) => v == &dimension.external_code,
            _ => false,
        })
        .count();
    Insight::new(n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InventoryRecord;
    use serde_json::json;

    fn rows(states: &[Value]) -> InventoryRecordSet {
        InventoryRecordSet::from_rows(
            states
                .iter()
                .map(|s| {
                    let mut r = InventoryRecord::new();
                    r.insert("State".into(), s.clone());
                    r
                })
                .collect(),
        )
    }

    fn wa() -> DimensionValue {
        DimensionValue::new("WASHINGTON", "WA", "1")
    }

    #[test]
    fn counts_exact_matches() {
        let set = rows(&[json!("WA"), json!("WA"), json!("OR")]);
        assert_eq!(extract_insight("State", &wa(), &set).get(), 2);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(extract_insight("State", &wa(), &InventoryRecordSet::default()).get(), 0);
    }

    #[test]
    fn no_partial_or_case_insensitive_match() {
        let set = rows(&[json!("wa"), json!("WA "), json!("WASH"), json!(null), json!(1)]);
        assert_eq!(extract_insight("State", &wa(), &set).get(), 0);
    }

    #[test]
    fn order_does_not_matter() {
        let a = rows(&[json!("WA"), json!("OR"), json!("WA"), json!("ID")]);
        let b = rows(&[json!("ID"), json!("WA"), json!("WA"), json!("OR")]);
        assert_eq!(
            extract_insight("State", &wa(), &a),
            extract_insight("State", &wa(), &b)
        );
    }

    #[test]
    fn other_field_is_ignored() {
        let mut r = InventoryRecord::new();
        r.insert("Region".into(), json!("WA"));
        let set = InventoryRecordSet::from_rows(vec![r]);
        assert_eq!(extract_insight("State", &wa(), &set).get(), 0);
        assert_eq!(extract_insight("Region", &wa(), &set).get(), 1);
    }
}
