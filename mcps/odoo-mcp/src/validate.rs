//! Local input checks run before any backend call

use chrono::NaiveDate;
use odoo_rpc::Kwargs;
use serde_json::Value;

use crate::envelope::{ToolError, ToolResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> ToolResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        ToolError::invalid(format!("Invalid date format: {}. Use YYYY-MM-DD.", value))
    })
}

/// [`parse_date`] for optional inputs; the original text is kept for domains
pub fn parse_optional_date(value: Option<&str>) -> ToolResult<Option<&str>> {
    match value {
        Some(v) => parse_date(v).map(|_| Some(v)),
        None => Ok(None),
    }
}

/// A `from..=to` pair of dates, `from` not after `to`
pub fn parse_period(date_from: &str, date_to: &str) -> ToolResult<(NaiveDate, NaiveDate)> {
    let from = parse_date(date_from)?;
    let to = parse_date(date_to)?;
    if from > to {
        return Err(ToolError::invalid(format!(
            "date_from ({}) must not be after date_to ({})",
            date_from, date_to
        )));
    }
    Ok((from, to))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Every line must carry every key in `required` with a non-null value
pub fn require_line_keys(lines: &[Kwargs], required: &[&str]) -> ToolResult<()> {
    if lines.is_empty() {
        return Err(ToolError::invalid("At least one line is required"));
    }

    for (index, line) in lines.iter().enumerate() {
        for key in required {
            if line.get(*key).map_or(true, Value::is_null) {
                return Err(ToolError::invalid(format!(
                    "Line {} is missing required key '{}'. Each line must contain {}.",
                    index + 1,
                    key,
                    required.join(", ")
                )));
            }
        }
    }
    Ok(())
}

pub fn require_ids(ids: &[i64], what: &str) -> ToolResult<()> {
    if ids.is_empty() {
        return Err(ToolError::invalid(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Numeric line value; `false` and missing read as zero
pub fn line_f64(line: &Kwargs, key: &str) -> f64 {
    line.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(value: Value) -> Kwargs {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        let err = parse_date("2023-02-29").unwrap_err();
        assert_eq!(err.to_string(), "Invalid date format: 2023-02-29. Use YYYY-MM-DD.");
        assert!(parse_date("29/02/2024").is_err());
    }

    #[test]
    fn test_parse_period_order() {
        assert!(parse_period("2024-01-01", "2024-01-31").is_ok());
        assert!(parse_period("2024-02-01", "2024-01-31").is_err());
    }

    #[test]
    fn test_optional_date() {
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert_eq!(parse_optional_date(Some("2024-05-01")).unwrap(), Some("2024-05-01"));
        assert!(parse_optional_date(Some("May 1st")).is_err());
    }

    #[test]
    fn test_line_keys() {
        let good = vec![line(json!({"product_id": 1, "product_uom_qty": 2}))];
        assert!(require_line_keys(&good, &["product_id", "product_uom_qty"]).is_ok());

        let missing = vec![
            line(json!({"product_id": 1, "product_uom_qty": 2})),
            line(json!({"product_uom_qty": 2})),
        ];
        let err = require_line_keys(&missing, &["product_id", "product_uom_qty"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Line 2 is missing required key 'product_id'. Each line must contain product_id, product_uom_qty."
        );

        let null = vec![line(json!({"product_id": null, "product_uom_qty": 2}))];
        assert!(require_line_keys(&null, &["product_id"]).is_err());

        assert!(require_line_keys(&[], &["product_id"]).is_err());
    }
}
