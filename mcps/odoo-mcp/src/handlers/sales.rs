//! Sales handler implementations

use chrono::Duration;
use odoo_rpc::value::{as_f64, record_id};
use odoo_rpc::{Domain, Gateway, Kwargs, SearchReadOptions, Value};
use serde_json::json;

use crate::envelope::{ToolError, ToolResult};
use crate::params::{AnalyzeSalesPerformanceParams, CreateSalesOrderParams, SearchSalesOrdersParams};
use crate::validate::{format_date, parse_optional_date, parse_period, require_line_keys};

use super::{
    copy_present, create_commands, page_reply, percent_change, read_created, round2,
    search_page, Page, Tally,
};

const ORDER_FIELDS: [&str; 8] = [
    "name",
    "partner_id",
    "date_order",
    "amount_total",
    "state",
    "invoice_status",
    "user_id",
    "order_line",
];

const CONFIRMED_STATES: [&str; 2] = ["sale", "done"];

const TOP_N: usize = 10;

/// Grouping of [`analyze_sales_performance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesGrouping {
    Product,
    Customer,
    Salesperson,
}

impl SalesGrouping {
    fn parse(value: &str) -> ToolResult<Self> {
        match value {
            "product" => Ok(Self::Product),
            "customer" => Ok(Self::Customer),
            "salesperson" => Ok(Self::Salesperson),
            other => Err(ToolError::invalid(format!(
                "Invalid group_by '{}'. Use 'product', 'customer' or 'salesperson'.",
                other
            ))),
        }
    }
}

pub async fn search_sales_orders(
    gateway: &Gateway,
    params: SearchSalesOrdersParams,
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
        search_page(gateway, "sale.order", domain, &ORDER_FIELDS, page).await?;
    Ok(page_reply(orders, total_count, "orders"))
}

pub async fn create_sales_order(
    gateway: &Gateway,
    params: CreateSalesOrderParams,
) -> ToolResult<Value> {
    let date_order = parse_optional_date(params.date_order.as_deref())?;
    require_line_keys(&params.order_lines, &["product_id", "product_uom_qty"])?;

    let mut values = Kwargs::new();
    values.insert("partner_id".to_string(), json!(params.partner_id));
    if let Some(date) = date_order {
        values.insert("date_order".to_string(), json!(date));
    }
    values.insert(
        "order_line".to_string(),
        create_commands(&params.order_lines, |line| {
            let mut line_values = Kwargs::new();
            copy_present(line, &mut line_values, &["product_id", "product_uom_qty", "price_unit"]);
            line_values
        }),
    );

    let order_id = gateway.create("sale.order", values).await?;
    let order = read_created(gateway, "sale.order", order_id, &["name"]).await?;

    Ok(json!({
        "order_id": order_id,
        "order_name": order.get("name").cloned().unwrap_or(Value::Null),
    }))
}

/// Period totals against the preceding period of equal length
pub async fn analyze_sales_performance(
    gateway: &Gateway,
    params: AnalyzeSalesPerformanceParams,
) -> ToolResult<Value> {
    let (from, to) = parse_period(&params.date_from, &params.date_to)?;
    let grouping = params.group_by.as_deref().map(SalesGrouping::parse).transpose()?;

    let prev_to = from - Duration::days(1);
    let prev_from = prev_to - (to - from);

    let confirmed = |from: String, to: String| {
        Domain::new()
            .condition("date_order", ">=", from)
            .condition("date_order", "<=", to)
            .condition("state", "in", CONFIRMED_STATES.to_vec())
    };

    let (orders, previous) = tokio::try_join!(
        gateway.search_read(
            "sale.order",
            confirmed(params.date_from.clone(), params.date_to.clone()),
            SearchReadOptions::fields(["name", "partner_id", "date_order", "amount_total", "user_id"]),
        ),
        gateway.search_read(
            "sale.order",
            confirmed(format_date(prev_from), format_date(prev_to)),
            SearchReadOptions::fields(["amount_total"]),
        ),
    )?;

    let current_total: f64 = orders.iter().map(|o| as_f64(o, "amount_total")).sum();
    let previous_total: f64 = previous.iter().map(|o| as_f64(o, "amount_total")).sum();

    let mut result = json!({
        "period": {"from": params.date_from, "to": params.date_to},
        "summary": {
            "order_count": orders.len(),
            "total_amount": current_total,
            "previous_period": {
                "from": format_date(prev_from),
                "to": format_date(prev_to),
                "order_count": previous.len(),
                "total_amount": previous_total,
            },
            "percent_change": round2(percent_change(current_total, previous_total)),
        },
    });

    let grouped = match grouping {
        Some(SalesGrouping::Product) => group_by_product(gateway, &orders).await?,
        Some(SalesGrouping::Customer) => Some(json!({
            "customers": rank_orders(&orders, "partner_id", Some(TOP_N)),
        })),
        Some(SalesGrouping::Salesperson) => Some(json!({
            "salespersons": rank_orders(&orders, "user_id", None),
        })),
        None => None,
    };
    if let Some(grouped) = grouped {
        result["grouped_data"] = grouped;
    }

    Ok(result)
}

/// Top products by subtotal across the lines of `orders`
async fn group_by_product(gateway: &Gateway, orders: &[Value]) -> ToolResult<Option<Value>> {
    let order_ids: Vec<i64> = orders.iter().filter_map(record_id).collect();
    if order_ids.is_empty() {
        return Ok(None);
    }

    let lines = gateway
        .search_read(
            "sale.order.line",
            Domain::new().condition("order_id", "in", order_ids),
            SearchReadOptions::fields(["product_id", "product_uom_qty", "price_subtotal"]),
        )
        .await?;

    let mut tally = Tally::default();
    for line in &lines {
        tally.add(
            line.get("product_id").unwrap_or(&Value::Bool(false)),
            as_f64(line, "product_uom_qty"),
            as_f64(line, "price_subtotal"),
        );
    }

    let products: Vec<Value> = tally
        .ranked()
        .into_iter()
        .take(TOP_N)
        .map(|b| json!({"id": b.id, "name": b.name, "quantity": b.quantity, "amount": b.amount}))
        .collect();
    Ok(Some(json!({ "products": products })))
}

/// Order count and amount per `field` target, largest amount first
fn rank_orders(orders: &[Value], field: &str, top: Option<usize>) -> Vec<Value> {
    let mut tally = Tally::default();
    for order in orders {
        tally.add(
            order.get(field).unwrap_or(&Value::Bool(false)),
            0.0,
            as_f64(order, "amount_total"),
        );
    }

    tally
        .ranked()
        .into_iter()
        .take(top.unwrap_or(usize::MAX))
        .map(|b| json!({"id": b.id, "name": b.name, "order_count": b.count, "amount": b.amount}))
        .collect()
}
