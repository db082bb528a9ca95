//! Inventory handler implementations

use odoo_rpc::value::{as_f64, field_str, many2one_name, record_id};
use odoo_rpc::{Domain, Gateway, Kwargs, RpcResult, SearchReadOptions, Value};
use serde_json::{json, Map};
use tracing::{debug, info};

use crate::envelope::{ToolError, ToolResult};
use crate::params::{
    AnalyzeInventoryTurnoverParams, CheckProductAvailabilityParams, CreateInventoryAdjustmentParams,
};
use crate::validate::{parse_optional_date, parse_period, require_ids, require_line_keys};

use super::copy_present;

const QUANTITY_FIELDS: [&str; 4] = [
    "qty_available",
    "virtual_available",
    "incoming_qty",
    "outgoing_qty",
];

const ADJUSTMENT_KEYS: [&str; 3] = ["product_id", "location_id", "product_qty"];

fn context(key: &str, value: impl Into<Value>) -> Kwargs {
    let mut context = Kwargs::new();
    context.insert(key.to_string(), value.into());
    context
}

/// On-hand and forecast quantities per product
///
/// A failing per-product read is reported in that product's entry and does
/// not fail the whole tool.
pub async fn check_product_availability(
    gateway: &Gateway,
    params: CheckProductAvailabilityParams,
) -> ToolResult<Value> {
    require_ids(&params.product_ids, "product_ids")?;

    let products = gateway
        .search_read(
            "product.product",
            Domain::new().condition("id", "in", params.product_ids.clone()),
            SearchReadOptions::fields(["name", "default_code", "type", "uom_id"]),
        )
        .await?;
    if products.is_empty() {
        return Err(ToolError::not_found("No products found for the given IDs"));
    }

    let name_of = |id: i64| {
        products
            .iter()
            .find(|p| record_id(p) == Some(id))
            .and_then(|p| field_str(p, "name"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Product {}", id))
    };

    let read_context = params.location_id.map(|location| context("location", location));

    let mut availability = Map::new();
    for &product_id in &params.product_ids {
        let name = name_of(product_id);
        let entry = match gateway
            .read_in_context("product.product", &[product_id], &QUANTITY_FIELDS, read_context.clone())
            .await
        {
            Ok(rows) => match rows.first() {
                Some(row) => json!({
                    "name": name,
                    "qty_available": as_f64(row, "qty_available"),
                    "virtual_available": as_f64(row, "virtual_available"),
                    "incoming_qty": as_f64(row, "incoming_qty"),
                    "outgoing_qty": as_f64(row, "outgoing_qty"),
                }),
                None => json!({"name": name, "error": "Product not found"}),
            },
            Err(err) => json!({"name": name, "error": err.to_string()}),
        };
        availability.insert(product_id.to_string(), entry);
    }

    let location = match params.location_id {
        Some(location_id) => Some(
            match gateway
                .search_read(
                    "stock.location",
                    Domain::new().condition("id", "=", location_id),
                    SearchReadOptions::fields(["name", "complete_name"]),
                )
                .await
            {
                Ok(rows) => rows.into_iter().next().unwrap_or(Value::Null),
                Err(err) => {
                    debug!(location_id, error = %err, "location lookup failed");
                    json!({"id": location_id, "name": "Unknown location"})
                }
            },
        ),
        None => None,
    };

    Ok(json!({
        "products": availability,
        "location": location,
    }))
}

/// Set counted quantities and apply them
///
/// Servers that still have `stock.inventory` get a validated inventory
/// document; newer ones get `stock.quant` counts applied directly.
pub async fn create_inventory_adjustment(
    gateway: &Gateway,
    params: CreateInventoryAdjustmentParams,
) -> ToolResult<Value> {
    let date = parse_optional_date(params.date.as_deref())?;
    require_line_keys(&params.adjustment_lines, &ADJUSTMENT_KEYS)?;

    let legacy = gateway
        .search_count("ir.model", Domain::new().condition("model", "=", "stock.inventory"))
        .await?
        > 0;

    if legacy {
        let mut values = Kwargs::new();
        values.insert("name".to_string(), json!(params.name));
        if let Some(date) = date {
            values.insert("date".to_string(), json!(date));
        }
        let inventory_id = gateway.create("stock.inventory", values).await?;

        for line in &params.adjustment_lines {
            let mut line_values = Kwargs::new();
            line_values.insert("inventory_id".to_string(), json!(inventory_id));
            copy_present(line, &mut line_values, &ADJUSTMENT_KEYS);
            gateway.create("stock.inventory.line", line_values).await?;
        }

        gateway
            .call("stock.inventory", "action_validate", vec![json!([inventory_id])], Kwargs::new())
            .await?;
        info!(inventory_id, "inventory adjustment validated");

        return Ok(json!({"inventory_id": inventory_id, "name": params.name}));
    }

    let mut quant_ids = Vec::with_capacity(params.adjustment_lines.len());
    for line in &params.adjustment_lines {
        let key = |name: &str| line.get(name).cloned().unwrap_or(Value::Null);
        let counted = key("product_qty");
        let existing = gateway
            .search_read(
                "stock.quant",
                Domain::new()
                    .condition("product_id", "=", key("product_id"))
                    .condition("location_id", "=", key("location_id")),
                SearchReadOptions::fields(["id", "quantity"]).limit(1),
            )
            .await?;

        let quant_id = match existing.first().and_then(record_id) {
            Some(quant_id) => {
                gateway
                    .write("stock.quant", &[quant_id], context("inventory_quantity", counted))
                    .await?;
                quant_id
            }
            None => {
                let mut values = Kwargs::new();
                values.insert("product_id".to_string(), key("product_id"));
                values.insert("location_id".to_string(), key("location_id"));
                values.insert("inventory_quantity".to_string(), counted);
                gateway.create("stock.quant", values).await?
            }
        };
        quant_ids.push(quant_id);
    }

    gateway
        .call("stock.quant", "action_apply_inventory", vec![json!(quant_ids)], Kwargs::new())
        .await?;
    info!(count = quant_ids.len(), "inventory counts applied");

    Ok(json!({"quant_ids": quant_ids, "name": params.name}))
}

/// `field` of one product evaluated at `date`
async fn value_at(gateway: &Gateway, product_id: i64, field: &str, date: &str) -> RpcResult<f64> {
    let rows = gateway
        .read_in_context(
            "product.product",
            &[product_id],
            &[field],
            Some(context("to_date", date)),
        )
        .await?;
    Ok(rows.first().map_or(0.0, |row| as_f64(row, field)))
}

/// Average stock value at the period bounds
///
/// Uses `stock_value` when the server has it, otherwise on-hand quantity at
/// standard price.
async fn average_inventory_value(
    gateway: &Gateway,
    product_id: i64,
    standard_price: f64,
    date_from: &str,
    date_to: &str,
) -> RpcResult<f64> {
    let valued = tokio::try_join!(
        value_at(gateway, product_id, "stock_value", date_from),
        value_at(gateway, product_id, "stock_value", date_to),
    );

    match valued {
        Ok((start, end)) => Ok((start + end) / 2.0),
        Err(err) => {
            debug!(product_id, error = %err, "stock_value unavailable, using quantities");
            let (start, end) = tokio::try_join!(
                value_at(gateway, product_id, "qty_available", date_from),
                value_at(gateway, product_id, "qty_available", date_to),
            )?;
            Ok((start + end) / 2.0 * standard_price)
        }
    }
}

/// Cost of goods delivered against average stock value
pub async fn analyze_inventory_turnover(
    gateway: &Gateway,
    params: AnalyzeInventoryTurnoverParams,
) -> ToolResult<Value> {
    let (from, to) = parse_period(&params.date_from, &params.date_to)?;
    let days_in_period = (to - from).num_days() + 1;

    let mut product_domain = Domain::new().condition("type", "=", "product");
    if let Some(ids) = params.product_ids.as_ref().filter(|ids| !ids.is_empty()) {
        product_domain.push("id", "in", ids.clone());
    }
    if let Some(category_id) = params.category_id {
        product_domain.push("categ_id", "=", category_id);
    }

    let products = gateway
        .search_read(
            "product.product",
            product_domain,
            SearchReadOptions::fields(["name", "default_code", "categ_id", "standard_price"]),
        )
        .await?;
    if products.is_empty() {
        return Err(ToolError::not_found("No products match the given criteria"));
    }

    let turnover = |cogs: f64, avg_value: f64| -> (f64, f64) {
        if avg_value <= 0.0 {
            return (0.0, 0.0);
        }
        let ratio = cogs / avg_value;
        let days = if ratio > 0.0 { days_in_period as f64 / ratio } else { 0.0 };
        (ratio, days)
    };

    let mut rows = Vec::with_capacity(products.len());
    for product in &products {
        let Some(product_id) = record_id(product) else {
            continue;
        };
        let standard_price = as_f64(product, "standard_price");

        let moves = gateway
            .search_read(
                "stock.move",
                Domain::new()
                    .condition("product_id", "=", product_id)
                    .condition("date", ">=", params.date_from.as_str())
                    .condition("date", "<=", params.date_to.as_str())
                    .condition("location_dest_id.usage", "=", "customer"),
                SearchReadOptions::fields(["product_uom_qty", "price_unit"]),
            )
            .await?;

        let cogs: f64 = moves
            .iter()
            .map(|m| {
                let price = as_f64(m, "price_unit");
                let price = if price != 0.0 { price } else { standard_price };
                as_f64(m, "product_uom_qty") * price
            })
            .sum();

        let avg_value = average_inventory_value(
            gateway,
            product_id,
            standard_price,
            &params.date_from,
            &params.date_to,
        )
        .await?;
        let (ratio, days) = turnover(cogs, avg_value);

        rows.push(json!({
            "id": product_id,
            "name": product.get("name").cloned().unwrap_or(Value::Null),
            "default_code": product.get("default_code").cloned().unwrap_or(Value::Null),
            "category": product
                .get("categ_id")
                .and_then(many2one_name)
                .unwrap_or("Uncategorized"),
            "cogs": cogs,
            "avg_inventory_value": avg_value,
            "turnover_ratio": ratio,
            "days_inventory": days,
        }));
    }

    rows.sort_by(|a, b| as_f64(b, "turnover_ratio").total_cmp(&as_f64(a, "turnover_ratio")));

    let total_cogs: f64 = rows.iter().map(|r| as_f64(r, "cogs")).sum();
    let total_avg_value: f64 = rows.iter().map(|r| as_f64(r, "avg_inventory_value")).sum();
    let (overall_ratio, overall_days) = turnover(total_cogs, total_avg_value);

    Ok(json!({
        "period": {"from": params.date_from, "to": params.date_to, "days": days_in_period},
        "summary": {
            "product_count": products.len(),
            "total_cogs": total_cogs,
            "total_avg_inventory_value": total_avg_value,
            "overall_turnover_ratio": overall_ratio,
            "overall_days_inventory": overall_days,
        },
        "products": rows,
    }))
}
