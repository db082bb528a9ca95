//! Purchase handler implementations

use std::collections::HashMap;

use chrono::NaiveDate;
use odoo_rpc::value::{as_f64, field_str, many2one_id, many2one_name};
use odoo_rpc::{Domain, Gateway, Kwargs, SearchReadOptions, Value};
use serde_json::json;

use crate::envelope::ToolResult;
use crate::params::{
    AnalyzeSupplierPerformanceParams, CreatePurchaseOrderParams, SearchPurchaseOrdersParams,
};
use crate::validate::{parse_optional_date, parse_period, require_line_keys, DATE_FORMAT};

use super::{copy_present, create_commands, page_reply, read_created, search_page, Page, UNKNOWN};

const ORDER_FIELDS: [&str; 10] = [
    "name",
    "partner_id",
    "date_order",
    "amount_total",
    "state",
    "invoice_status",
    "user_id",
    "order_line",
    "date_planned",
    "date_approve",
];

const CONFIRMED_STATES: [&str; 2] = ["purchase", "done"];

pub async fn search_purchase_orders(
    gateway: &Gateway,
    params: SearchPurchaseOrdersParams,
) -> ToolResult<Value> {
    let date_from = parse_optional_date(params.date_from.as_deref())?;
    let date_to = parse_optional_date(params.date_to.as_deref())?;

    let mut domain = Domain::new();
    if let Some(partner_id) = params.partner_id {
        domain.push("partner_id", "=", partner_id);
    }
    if let Some(from) = date_from {
        domain.push("date_order", ">=", from);
    }
    if let Some(to) = date_to {
        domain.push("date_order", "<=", to);
    }
    if let Some(state) = params.state.as_deref() {
        domain.push("state", "=", state);
    }

    let page = Page::new(params.limit, params.offset, params.order);
    let (orders, total_count) =
        search_page(gateway, "purchase.order", domain, &ORDER_FIELDS, page).await?;
    Ok(page_reply(orders, total_count, "orders"))
}

pub async fn create_purchase_order(
    gateway: &Gateway,
    params: CreatePurchaseOrderParams,
) -> ToolResult<Value> {
    let date_order = parse_optional_date(params.date_order.as_deref())?;
    require_line_keys(&params.order_lines, &["product_id", "product_qty"])?;

    let mut values = Kwargs::new();
    values.insert("partner_id".to_string(), json!(params.partner_id));
    if let Some(date) = date_order {
        values.insert("date_order".to_string(), json!(date));
    }
    values.insert(
        "order_line".to_string(),
        create_commands(&params.order_lines, |line| {
            let mut line_values = Kwargs::new();
            copy_present(line, &mut line_values, &["product_id", "product_qty", "price_unit"]);
            line_values
        }),
    );

    let order_id = gateway.create("purchase.order", values).await?;
    let order = read_created(gateway, "purchase.order", order_id, &["name"]).await?;

    Ok(json!({
        "order_id": order_id,
        "order_name": order.get("name").cloned().unwrap_or(Value::Null),
    }))
}

#[derive(Debug, Default)]
struct SupplierStats {
    id: i64,
    name: String,
    order_count: u64,
    total_amount: f64,
    on_time: u64,
    late: u64,
    delays: Vec<i64>,
}

impl SupplierStats {
    fn to_value(&self) -> Value {
        let deliveries = self.on_time + self.late;
        let avg_delay_days = if self.delays.is_empty() {
            0.0
        } else {
            self.delays.iter().sum::<i64>() as f64 / self.delays.len() as f64
        };
        let on_time_delivery_rate = if deliveries > 0 {
            self.on_time as f64 / deliveries as f64 * 100.0
        } else {
            0.0
        };

        json!({
            "id": self.id,
            "name": self.name,
            "order_count": self.order_count,
            "total_amount": self.total_amount,
            "on_time_delivery_count": self.on_time,
            "late_delivery_count": self.late,
            "avg_delay_days": avg_delay_days,
            "on_time_delivery_rate": on_time_delivery_rate,
        })
    }
}

/// Days between planned and effective receipt; positive means late
fn delivery_delay(order: &Value) -> Option<i64> {
    let day = |field: &str| {
        let raw = field_str(order, field)?;
        let date = raw.split(' ').next()?;
        NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
    };
    let effective = day("effective_date")?;
    let planned = day("date_planned")?;
    Some((effective - planned).num_days())
}

/// Volume and delivery punctuality per supplier
pub async fn analyze_supplier_performance(
    gateway: &Gateway,
    params: AnalyzeSupplierPerformanceParams,
) -> ToolResult<Value> {
    parse_period(&params.date_from, &params.date_to)?;

    let mut domain = Domain::new()
        .condition("date_order", ">=", params.date_from.as_str())
        .condition("date_order", "<=", params.date_to.as_str())
        .condition("state", "in", CONFIRMED_STATES.to_vec());
    if let Some(supplier_ids) = params.supplier_ids.filter(|ids| !ids.is_empty()) {
        domain.push("partner_id", "in", supplier_ids);
    }

    let orders = gateway
        .search_read(
            "purchase.order",
            domain,
            SearchReadOptions::fields([
                "name",
                "partner_id",
                "date_order",
                "amount_total",
                "date_approve",
                "date_planned",
                "effective_date",
            ]),
        )
        .await?;

    let mut suppliers: Vec<SupplierStats> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for order in &orders {
        let partner = order.get("partner_id").unwrap_or(&Value::Bool(false));
        let id = many2one_id(partner).unwrap_or(0);
        let slot = *index.entry(id).or_insert_with(|| {
            suppliers.push(SupplierStats {
                id,
                name: many2one_name(partner).unwrap_or(UNKNOWN).to_string(),
                ..Default::default()
            });
            suppliers.len() - 1
        });

        let stats = &mut suppliers[slot];
        stats.order_count += 1;
        stats.total_amount += as_f64(order, "amount_total");

        if let Some(delay) = delivery_delay(order) {
            stats.delays.push(delay);
            if delay <= 0 {
                stats.on_time += 1;
            } else {
                stats.late += 1;
            }
        }
    }

    suppliers.sort_by(|a, b| b.total_amount.total_cmp(&a.total_amount));

    Ok(json!({
        "period": {"from": params.date_from, "to": params.date_to},
        "summary": {
            "supplier_count": suppliers.len(),
            "order_count": orders.len(),
            "total_amount": orders.iter().map(|o| as_f64(o, "amount_total")).sum::<f64>(),
        },
        "suppliers": suppliers.iter().map(SupplierStats::to_value).collect::<Vec<_>>(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_delay() {
        let late = json!({"effective_date": "2024-03-10 14:00:00", "date_planned": "2024-03-07 09:00:00"});
        assert_eq!(delivery_delay(&late), Some(3));

        let early = json!({"effective_date": "2024-03-05", "date_planned": "2024-03-07 09:00:00"});
        assert_eq!(delivery_delay(&early), Some(-2));

        let pending = json!({"effective_date": false, "date_planned": "2024-03-07 09:00:00"});
        assert_eq!(delivery_delay(&pending), None);
    }

    #[test]
    fn test_supplier_rates() {
        let stats = SupplierStats {
            id: 4,
            name: "Initech".into(),
            order_count: 3,
            total_amount: 900.0,
            on_time: 1,
            late: 1,
            delays: vec![0, 4],
        };
        let value = stats.to_value();
        assert_eq!(value["avg_delay_days"], json!(2.0));
        assert_eq!(value["on_time_delivery_rate"], json!(50.0));
    }
}
