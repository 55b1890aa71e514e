use uuid::Uuid;

use gridbase_engine::Value;

/// Extract the record ids stored in a linked-record value.
///
/// Accepts a single id string, an array of id strings, or an array of objects
/// carrying an `"id"` member. Anything that does not parse as an id is
/// skipped. Duplicates are kept in order.
pub fn extract_record_ids(value: &Value) -> Vec<Uuid> {
    match value {
        Value::String(s) => parse_id(s).into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(element_id).collect(),
        _ => Vec::new(),
    }
}

fn element_id(item: &Value) -> Option<Uuid> {
    match item {
        Value::String(s) => parse_id(s),
        Value::Object(map) => map.get("id").and_then(Value::as_str).and_then(parse_id),
        _ => None,
    }
}

fn parse_id(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const A: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";
    const B: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    fn id(s: &str) -> Uuid {
        Uuid::parse_str(s).unwrap()
    }

    #[test]
    fn test_invalid_elements_are_skipped() {
        let value = Value::Array(vec![Value::from("not-a-uuid"), Value::from(A)]);
        assert_eq!(extract_record_ids(&value), vec![id(A)]);
    }

    #[test]
    fn test_null_and_scalars_yield_nothing() {
        assert!(extract_record_ids(&Value::Null).is_empty());
        assert!(extract_record_ids(&Value::Number(4.0)).is_empty());
        assert!(extract_record_ids(&Value::from("")).is_empty());
    }

    #[test]
    fn test_single_string_id() {
        assert_eq!(extract_record_ids(&Value::from(A)), vec![id(A)]);
    }

    #[test]
    fn test_object_elements_and_duplicates() {
        let linked = Value::Object(BTreeMap::from([
            ("id".to_string(), Value::from(B)),
            ("name".to_string(), Value::from("Widget")),
        ]));
        let value = Value::Array(vec![
            Value::from(A),
            linked,
            Value::Bool(true),
            Value::from(A),
        ]);
        assert_eq!(extract_record_ids(&value), vec![id(A), id(B), id(A)]);
    }
}
