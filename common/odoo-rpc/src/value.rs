//! Wire values
//!
//! The backend speaks in untyped trees (null, bool, number, string, list,
//! string-keyed map). `serde_json::Value` is exactly that closed union, so it
//! is used as-is; the helpers below read the relational shapes Odoo returns.

pub use serde_json::{Map, Value};

/// Named arguments of a backend call
pub type Kwargs = Map<String, Value>;

/// Id of a many2one field value (`[id, "display name"]`, or `false` when unset)
pub fn many2one_id(value: &Value) -> Option<i64> {
    value.as_array()?.first()?.as_i64()
}

/// Display name of a many2one field value
pub fn many2one_name(value: &Value) -> Option<&str> {
    value.as_array()?.get(1)?.as_str()
}

/// Numeric field of a record; missing, `null` and `false` read as zero
pub fn as_f64(record: &Value, field: &str) -> f64 {
    record.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

/// String field of a record; `false` (Odoo's empty char) reads as `None`
pub fn field_str<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

/// Record id
pub fn record_id(record: &Value) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_many2one_set_and_unset() {
        let set = json!([7, "Acme Corp"]);
        assert_eq!(many2one_id(&set), Some(7));
        assert_eq!(many2one_name(&set), Some("Acme Corp"));

        let unset = json!(false);
        assert_eq!(many2one_id(&unset), None);
        assert_eq!(many2one_name(&unset), None);
    }

    #[test]
    fn test_numeric_and_string_fields() {
        let record = json!({"id": 3, "amount_total": 120.5, "ref": false, "name": "SO003"});
        assert_eq!(as_f64(&record, "amount_total"), 120.5);
        assert_eq!(as_f64(&record, "ref"), 0.0);
        assert_eq!(as_f64(&record, "missing"), 0.0);
        assert_eq!(field_str(&record, "name"), Some("SO003"));
        assert_eq!(field_str(&record, "ref"), None);
        assert_eq!(record_id(&record), Some(3));
    }
}
