//! Response-envelope normalization.
//!
//! Backend list endpoints disagree on their wrapping: some return a bare
//! array, others wrap it under `data`, `results`, or `items`. This module is
//! the single compatibility layer; everything upstream sees a plain vector.

use serde_json::Value;

/// Envelope keys probed, in order, when a list response is an object.
const ENVELOPE_KEYS: [&str; 3] = ["data", "results", "items"];

/// Extract the list of records from a decoded response body.
///
/// - A bare array returns its elements unchanged.
/// - An object is probed for `data`, `results`, `items` (in that order); the
///   first key holding an array wins.
/// - Anything else yields an empty vector.
///
/// This never fails. The cost of that tolerance is that a malformed response
/// is indistinguishable from a genuinely empty list.
pub fn extract_records(value: &Value) -> Vec<Value> {
    if let Value::Array(items) = value {
        return items.clone();
    }

    if let Value::Object(map) = value {
        for key in ENVELOPE_KEYS {
            if let Some(Value::Array(items)) = map.get(key) {
                return items.clone();
            }
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_passes_through() {
        let value = json!([{"id": 1}, {"id": 2}]);
        let records = extract_records(&value);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], 1);
    }

    #[test]
    fn data_envelope_is_unwrapped() {
        let value = json!({"data": [{"id": 1}]});
        assert_eq!(extract_records(&value).len(), 1);
    }

    #[test]
    fn results_envelope_is_unwrapped() {
        let value = json!({"results": [{"id": 1}, {"id": 2}, {"id": 3}]});
        assert_eq!(extract_records(&value).len(), 3);
    }

    #[test]
    fn items_envelope_is_unwrapped() {
        let value = json!({"items": []});
        assert_eq!(extract_records(&value), Vec::<Value>::new());
    }

    #[test]
    fn probe_order_prefers_data_over_results() {
        let value = json!({"results": [{"id": 2}], "data": [{"id": 1}]});
        let records = extract_records(&value);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], 1);
    }

    #[test]
    fn object_without_recognized_key_degrades_to_empty() {
        assert!(extract_records(&json!({})).is_empty());
        assert!(extract_records(&json!({"foo": 1})).is_empty());
    }

    #[test]
    fn recognized_key_holding_non_array_is_skipped() {
        // `data` is not an array, but `results` is; the probe keeps going.
        let value = json!({"data": "oops", "results": [{"id": 1}]});
        assert_eq!(extract_records(&value).len(), 1);
    }

    #[test]
    fn scalars_and_null_degrade_to_empty() {
        assert!(extract_records(&json!(null)).is_empty());
        assert!(extract_records(&json!(42)).is_empty());
        assert!(extract_records(&json!("text")).is_empty());
    }
}
