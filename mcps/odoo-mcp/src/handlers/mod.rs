//! Handler implementations for Odoo MCP tools
//!
//! Organized by domain: generic, sales, purchase, inventory, accounting,
//! product_cost. Every handler takes the shared [`Gateway`] and its typed
//! parameters and returns a [`ToolResult`]; the server wraps it in the
//! envelope.

mod accounting;
mod generic;
mod inventory;
mod product_cost;
mod purchase;
mod sales;

pub use accounting::*;
pub use generic::*;
pub use inventory::*;
pub use product_cost::*;
pub use purchase::*;
pub use sales::*;

use std::collections::HashMap;

use odoo_rpc::value::{many2one_id, many2one_name};
use odoo_rpc::{Domain, Gateway, Kwargs, SearchReadOptions};
use serde_json::{json, Map, Value};

use crate::envelope::{ToolError, ToolResult};

/// Page size of the business search tools
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Label for an unset many2one in grouped results
pub(crate) const UNKNOWN: &str = "Unknown";

/// Caller-supplied raw domain; absent means "all records"
pub(crate) fn caller_domain(domain: Option<Value>) -> ToolResult<Value> {
    match domain {
        None | Some(Value::Null) => Ok(json!([])),
        Some(Value::Array(terms)) => Ok(Value::Array(terms)),
        Some(other) => Err(ToolError::invalid(format!(
            "domain must be a list of conditions, got {}",
            other
        ))),
    }
}

pub(crate) fn require_model(model: &str) -> ToolResult<()> {
    if model.trim().is_empty() {
        return Err(ToolError::invalid("model must not be empty"));
    }
    Ok(())
}

/// One page of `model` records plus the unpaged match count
pub(crate) async fn search_page(
    gateway: &Gateway,
    model: &str,
    domain: Domain,
    fields: &[&str],
    page: Page,
) -> ToolResult<(Vec<Value>, i64)> {
    let mut options = SearchReadOptions::fields(fields.iter().copied())
        .limit(page.limit)
        .offset(page.offset);
    if let Some(order) = page.order {
        options = options.order(order);
    }

    let (records, total_count) = tokio::try_join!(
        gateway.search_read(model, domain.clone(), options),
        gateway.search_count(model, domain),
    )?;
    Ok((records, total_count))
}

/// Paging inputs shared by the search tools
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Page {
    pub limit: u64,
    pub offset: u64,
    pub order: Option<String>,
}

impl Page {
    pub fn new(limit: Option<u64>, offset: Option<u64>, order: Option<String>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: offset.unwrap_or(0),
            order,
        }
    }
}

/// `{"count", "total_count", <items_key>}` reply of the search tools
pub(crate) fn page_reply(records: Vec<Value>, total_count: i64, items_key: &str) -> Value {
    let mut reply = Map::new();
    reply.insert("count".to_string(), json!(records.len()));
    reply.insert("total_count".to_string(), json!(total_count));
    reply.insert(items_key.to_string(), Value::Array(records));
    Value::Object(reply)
}

/// `(0, 0, values)` create commands for a one2many field
pub(crate) fn create_commands<F>(lines: &[Kwargs], build: F) -> Value
where
    F: Fn(&Kwargs) -> Kwargs,
{
    Value::Array(
        lines
            .iter()
            .map(|line| json!([0, 0, Value::Object(build(line))]))
            .collect(),
    )
}

/// Copy `keys` from `line` into `values` when present and not null
pub(crate) fn copy_present(line: &Kwargs, values: &mut Kwargs, keys: &[&str]) {
    for key in keys {
        if let Some(value) = line.get(*key).filter(|v| !v.is_null()) {
            values.insert(key.to_string(), value.clone());
        }
    }
}

/// Read back `fields` of a record that was just created
pub(crate) async fn read_created(
    gateway: &Gateway,
    model: &str,
    id: i64,
    fields: &[&str],
) -> ToolResult<Value> {
    gateway
        .read(model, &[id], fields)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::not_found(format!("{} {} was created but cannot be read", model, id)))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `previous` to `current`; zero without a base
pub(crate) fn percent_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Running totals per many2one target, in first-seen order
#[derive(Debug, Default)]
pub(crate) struct Tally {
    buckets: Vec<Bucket>,
    index: HashMap<i64, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bucket {
    pub id: i64,
    pub name: String,
    pub count: u64,
    pub quantity: f64,
    pub amount: f64,
}

impl Tally {
    /// Count one record against the target of `many2one` (`false` pools under id 0)
    pub fn add(&mut self, many2one: &Value, quantity: f64, amount: f64) {
        let id = many2one_id(many2one).unwrap_or(0);
        let slot = match self.index.get(&id) {
            Some(&slot) => slot,
            None => {
                self.buckets.push(Bucket {
                    id,
                    name: many2one_name(many2one).unwrap_or(UNKNOWN).to_string(),
                    count: 0,
                    quantity: 0.0,
                    amount: 0.0,
                });
                self.index.insert(id, self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };

        let bucket = &mut self.buckets[slot];
        bucket.count += 1;
        bucket.quantity += quantity;
        bucket.amount += amount;
    }

    /// Buckets by descending amount; ties keep first-seen order
    pub fn ranked(mut self) -> Vec<Bucket> {
        self.buckets.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        self.buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_domain() {
        assert_eq!(caller_domain(None).unwrap(), json!([]));
        assert_eq!(
            caller_domain(Some(json!(["|", ["a", "=", 1], ["b", "=", 2]]))).unwrap(),
            json!(["|", ["a", "=", 1], ["b", "=", 2]])
        );
        assert!(caller_domain(Some(json!("name = Acme"))).is_err());
    }

    #[test]
    fn test_tally_ranks_by_amount_and_pools_unset() {
        let mut tally = Tally::default();
        tally.add(&json!([1, "Acme"]), 1.0, 100.0);
        tally.add(&json!([2, "Globex"]), 2.0, 300.0);
        tally.add(&json!([1, "Acme"]), 3.0, 250.0);
        tally.add(&json!(false), 1.0, 10.0);

        let ranked = tally.ranked();
        assert_eq!(ranked.len(), 3);
        assert_eq!((ranked[0].id, ranked[0].amount, ranked[0].count), (1, 350.0, 2));
        assert_eq!(ranked[0].quantity, 4.0);
        assert_eq!(ranked[1].name, "Globex");
        assert_eq!((ranked[2].id, ranked[2].name.as_str()), (0, UNKNOWN));
    }

    #[test]
    fn test_percent_change_and_rounding() {
        assert_eq!(round2(percent_change(150.0, 100.0)), 50.0);
        assert_eq!(percent_change(150.0, 0.0), 0.0);
        assert_eq!(round2(33.33333), 33.33);
    }

    #[test]
    fn test_create_commands() {
        let lines = vec![json!({"product_id": 3, "qty": 2, "note": null})
            .as_object()
            .cloned()
            .unwrap()];
        let commands = create_commands(&lines, |line| {
            let mut values = Kwargs::new();
            copy_present(line, &mut values, &["product_id", "note"]);
            values
        });
        assert_eq!(commands, json!([[0, 0, {"product_id": 3}]]));
    }
}
