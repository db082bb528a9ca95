//! Safety defaults for the generic dispatch path
//!
//! A read without a limit or a field list against a large model returns
//! every row with every column. Requests that arrive through
//! [`Gateway::dispatch`](crate::Gateway::dispatch) are shaped here before
//! they go out; the typed helpers always carry explicit values and skip this.
//!
//! A value the caller passed positionally counts as given. Injecting the
//! same parameter as a keyword would make the backend reject the call with
//! "multiple values for argument".

use serde_json::Value;

use crate::value::Kwargs;

/// Limit injected when a bulk read omits one
pub const DEFAULT_LIMIT: u64 = 100;

/// Projection injected when a combined search-and-read asks for no fields
pub const DEFAULT_FIELDS: [&str; 5] = ["id", "name", "display_name", "create_date", "write_date"];

/// Methods that can return an unbounded number of records
const BULK_METHODS: [&str; 2] = ["search", "search_read"];

const SEARCH_READ: &str = "search_read";

/// Positional slot of `fields` in `search_read(domain, fields, offset, limit, order)`
const SEARCH_READ_FIELDS_SLOT: usize = 1;

/// Positional slot of `limit` for a bulk method
fn limit_slot(method: &str) -> usize {
    // search(domain, offset, limit, order)
    // search_read(domain, fields, offset, limit, order)
    if method == SEARCH_READ {
        3
    } else {
        2
    }
}

/// How the caller expressed the `fields` keyword
///
/// "No key", "explicit null" and "explicit empty list" are different
/// intents; all three currently receive the default projection, but they
/// are reported separately so callers and logs can tell them apart.
/// `Positional` fields are left exactly as sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldsRequest {
    Omitted,
    Null,
    Empty,
    Explicit,
    Positional,
}

impl FieldsRequest {
    fn of(args: &[Value], kwargs: &Kwargs) -> Self {
        if args.len() > SEARCH_READ_FIELDS_SLOT {
            return FieldsRequest::Positional;
        }
        match kwargs.get("fields") {
            None => FieldsRequest::Omitted,
            Some(Value::Null) => FieldsRequest::Null,
            Some(Value::Array(items)) if items.is_empty() => FieldsRequest::Empty,
            Some(Value::Bool(false)) => FieldsRequest::Empty,
            Some(_) => FieldsRequest::Explicit,
        }
    }
}

/// What shaping did to one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shaping {
    pub limit_injected: bool,
    pub fields_injected: bool,
    /// `limit` was given as a positional argument
    pub limit_positional: bool,
    /// `fields` as the caller sent it; `None` for methods that are not
    /// search-and-read
    pub fields_request: Option<FieldsRequest>,
}

impl Shaping {
    pub fn changed(&self) -> bool {
        self.limit_injected || self.fields_injected
    }
}

/// Whether `method` is a bulk read/search method
pub fn is_bulk_method(method: &str) -> bool {
    BULK_METHODS.contains(&method)
}

/// Apply the safety defaults to `kwargs` in place
///
/// `args` is only inspected, never changed.
pub fn apply(method: &str, args: &[Value], kwargs: &mut Kwargs) -> Shaping {
    let mut shaping = Shaping::default();

    if !is_bulk_method(method) {
        return shaping;
    }

    shaping.limit_positional = args.len() > limit_slot(method);
    if !shaping.limit_positional && !kwargs.contains_key("limit") {
        kwargs.insert("limit".to_string(), Value::from(DEFAULT_LIMIT));
        shaping.limit_injected = true;
    }

    if method == SEARCH_READ {
        let request = FieldsRequest::of(args, kwargs);
        shaping.fields_request = Some(request);
        if !matches!(request, FieldsRequest::Explicit | FieldsRequest::Positional) {
            kwargs.insert("fields".to_string(), default_fields());
            shaping.fields_injected = true;
        }
    }

    shaping
}

fn default_fields() -> Value {
    Value::Array(DEFAULT_FIELDS.iter().map(|f| Value::from(*f)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kwargs(value: Value) -> Kwargs {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_search_read_without_limit_or_fields() {
        let mut kw = kwargs(json!({"domain": [["name", "=", "Acme"]]}));
        let shaping = apply("search_read", &[], &mut kw);

        assert_eq!(kw["limit"], json!(100));
        assert_eq!(
            kw["fields"],
            json!(["id", "name", "display_name", "create_date", "write_date"])
        );
        assert!(shaping.limit_injected);
        assert!(shaping.fields_injected);
        assert_eq!(shaping.fields_request, Some(FieldsRequest::Omitted));
    }

    #[test]
    fn test_explicit_limit_and_fields_pass_through() {
        let mut kw = kwargs(json!({"limit": 5, "fields": ["email"]}));
        let shaping = apply("search_read", &[], &mut kw);

        assert_eq!(kw["limit"], json!(5));
        assert_eq!(kw["fields"], json!(["email"]));
        assert!(!shaping.changed());
        assert_eq!(shaping.fields_request, Some(FieldsRequest::Explicit));
    }

    #[test]
    fn test_explicit_null_limit_is_respected() {
        // The caller asked for "no limit" explicitly; only a missing key is defaulted.
        let mut kw = kwargs(json!({"limit": null, "fields": ["name"]}));
        apply("search_read", &[], &mut kw);
        assert_eq!(kw["limit"], Value::Null);
    }

    #[test]
    fn test_empty_and_null_fields_are_distinguished_but_defaulted() {
        let mut empty = kwargs(json!({"fields": []}));
        let mut null = kwargs(json!({"fields": null}));

        let a = apply("search_read", &[], &mut empty);
        let b = apply("search_read", &[], &mut null);

        assert_eq!(a.fields_request, Some(FieldsRequest::Empty));
        assert_eq!(b.fields_request, Some(FieldsRequest::Null));
        assert_eq!(empty["fields"], default_fields());
        assert_eq!(null["fields"], default_fields());
    }

    #[test]
    fn test_search_gets_limit_but_no_fields() {
        let mut kw = Kwargs::new();
        let shaping = apply("search", &[], &mut kw);
        assert_eq!(kw["limit"], json!(100));
        assert!(!kw.contains_key("fields"));
        assert_eq!(shaping.fields_request, None);
    }

    #[test]
    fn test_other_methods_untouched() {
        let mut kw = kwargs(json!({"name": "New partner"}));
        let shaping = apply("create", &[], &mut kw);
        assert_eq!(kw, kwargs(json!({"name": "New partner"})));
        assert!(!shaping.changed());

        let mut kw = Kwargs::new();
        apply("search_count", &[], &mut kw);
        assert!(kw.is_empty());
    }

    #[test]
    fn test_positional_fields_and_limit_are_not_duplicated() {
        let args = [json!([]), json!(["email"]), json!(0), json!(5)];
        let mut kw = Kwargs::new();
        let shaping = apply("search_read", &args, &mut kw);

        assert!(kw.is_empty());
        assert!(!shaping.changed());
        assert!(shaping.limit_positional);
        assert_eq!(shaping.fields_request, Some(FieldsRequest::Positional));
    }

    #[test]
    fn test_positional_fields_without_limit_still_get_one() {
        let args = [json!([]), json!(["email"])];
        let mut kw = Kwargs::new();
        let shaping = apply("search_read", &args, &mut kw);

        assert_eq!(kw, kwargs(json!({"limit": 100})));
        assert!(!shaping.fields_injected);
        assert!(!shaping.limit_positional);
    }

    #[test]
    fn test_search_positional_limit_slot() {
        let mut kw = Kwargs::new();
        let shaping = apply("search", &[json!([]), json!(0), json!(10)], &mut kw);
        assert!(kw.is_empty());
        assert!(shaping.limit_positional);

        let mut kw = Kwargs::new();
        apply("search", &[json!([]), json!(0)], &mut kw);
        assert_eq!(kw["limit"], json!(100));
    }
}
