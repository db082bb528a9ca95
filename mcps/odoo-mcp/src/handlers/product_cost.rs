//! Product cost handler implementations
//!
//! Landed-cost analysis over `product.template` using the custom `x_*`
//! import cost fields (base cost in RMB, exchange rate, fees).

use odoo_rpc::value::{as_f64, field_str, many2one_name};
use odoo_rpc::{Domain, Gateway, SearchReadOptions, Value};
use serde_json::json;

use crate::envelope::{ToolError, ToolResult};
use crate::params::{AnalyzeProductCostsParams, CompareProductCostsParams, GetProductCostDetailParams};

use super::round2;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;
const MAX_COMPARE: usize = 10;
const DEFAULT_CURRENCY: &str = "PHP";
const NOT_AVAILABLE: &str = "N/A";

const COST_FIELDS: [&str; 16] = [
    "id",
    "name",
    "default_code",
    "list_price",
    "standard_price",
    "categ_id",
    "currency_id",
    "x_base_cost_rmb",
    "x_exchange_rate",
    "x_service_fee_rate",
    "x_shipping_fee",
    "x_ocean_fee",
    "x_si_fee_rate",
    "x_landed_cost",
    "x_margin",
    "x_margin_percent",
];

/// Sort key of [`analyze_product_costs`], always descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostSort {
    ProfitMargin,
    ProfitAmount,
    SalesPrice,
    Cost,
}

impl CostSort {
    fn parse(value: &str) -> ToolResult<Self> {
        match value {
            "profit_margin" => Ok(Self::ProfitMargin),
            "profit_amount" => Ok(Self::ProfitAmount),
            "sales_price" => Ok(Self::SalesPrice),
            "cost" => Ok(Self::Cost),
            other => Err(ToolError::invalid(format!(
                "Invalid sort_by '{}'. Use 'profit_margin', 'profit_amount', 'sales_price' or 'cost'.",
                other
            ))),
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::ProfitMargin => "profit_margin",
            Self::ProfitAmount => "profit_amount",
            Self::SalesPrice => "sales_price",
            Self::Cost => "landed_cost",
        }
    }
}

/// Profit and margin (percent) of a sale price over a landed cost
fn profit(list_price: f64, standard_price: f64) -> (f64, f64) {
    let amount = list_price - standard_price;
    let margin = if list_price > 0.0 {
        amount / list_price * 100.0
    } else {
        0.0
    };
    (amount, margin)
}

fn label<'a>(record: &'a Value, field: &str, fallback: &'a str) -> &'a str {
    record.get(field).and_then(many2one_name).unwrap_or(fallback)
}

fn text_or<'a>(record: &'a Value, field: &str) -> &'a str {
    field_str(record, field).unwrap_or(NOT_AVAILABLE)
}

/// Margin ranking of saleable products
pub async fn analyze_product_costs(
    gateway: &Gateway,
    params: AnalyzeProductCostsParams,
) -> ToolResult<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let sort = params
        .sort_by
        .as_deref()
        .map(CostSort::parse)
        .transpose()?
        .unwrap_or(CostSort::ProfitMargin);
    let currency = params.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);

    let mut domain = Domain::new().condition("sale_ok", "=", true);
    if let Some(category_id) = params.category_id {
        domain.push("categ_id", "=", category_id);
    }

    let templates = gateway
        .search_read(
            "product.template",
            domain,
            SearchReadOptions::fields(COST_FIELDS).limit(limit),
        )
        .await?;
    if templates.is_empty() {
        return Err(ToolError::not_found("No products match the given criteria"));
    }

    let mut products: Vec<Value> = templates
        .iter()
        .filter_map(|p| {
            let list_price = as_f64(p, "list_price");
            let standard_price = as_f64(p, "standard_price");
            let (profit_amount, profit_margin) = profit(list_price, standard_price);

            // a zero margin filter means no filter
            if let Some(min) = params.min_profit_margin.filter(|m| *m != 0.0) {
                if profit_margin / 100.0 < min {
                    return None;
                }
            }

            Some(json!({
                "id": p.get("id").cloned().unwrap_or(Value::Null),
                "name": text_or(p, "name"),
                "default_code": text_or(p, "default_code"),
                "category": label(p, "categ_id", NOT_AVAILABLE),
                "sales_price": list_price,
                "landed_cost": standard_price,
                "profit_amount": profit_amount,
                "profit_margin": round2(profit_margin),
                "currency": label(p, "currency_id", currency),
                "cost_breakdown": {
                    "base_cost_rmb": as_f64(p, "x_base_cost_rmb"),
                    "exchange_rate": as_f64(p, "x_exchange_rate"),
                    "service_fee_rate": as_f64(p, "x_service_fee_rate"),
                    "shipping_fee": as_f64(p, "x_shipping_fee"),
                    "ocean_fee": as_f64(p, "x_ocean_fee"),
                    "si_fee_rate": as_f64(p, "x_si_fee_rate"),
                },
            }))
        })
        .collect();

    let key = sort.key();
    products.sort_by(|a, b| as_f64(b, key).total_cmp(&as_f64(a, key)));
    products.truncate(limit as usize);

    let margins: Vec<f64> = products.iter().map(|p| as_f64(p, "profit_margin")).collect();
    let summary = if margins.is_empty() {
        json!({
            "total_products": 0,
            "avg_profit_margin": 0.0,
            "highest_margin": 0.0,
            "lowest_margin": 0.0,
            "total_profit": 0.0,
        })
    } else {
        json!({
            "total_products": products.len(),
            "avg_profit_margin": round2(margins.iter().sum::<f64>() / margins.len() as f64),
            "highest_margin": margins.iter().copied().fold(f64::MIN, f64::max),
            "lowest_margin": margins.iter().copied().fold(f64::MAX, f64::min),
            "total_profit": products.iter().map(|p| as_f64(p, "profit_amount")).sum::<f64>(),
        })
    };

    Ok(json!({
        "products": products,
        "summary": summary,
    }))
}

/// Full landed-cost breakdown of one product
pub async fn get_product_cost_detail(
    gateway: &Gateway,
    params: GetProductCostDetailParams,
) -> ToolResult<Value> {
    let domain = match (params.product_id, params.product_code.as_deref()) {
        (Some(id), _) => Domain::new().condition("id", "=", id),
        (None, Some(code)) if !code.is_empty() => {
            Domain::new().condition("default_code", "=", code)
        }
        _ => return Err(ToolError::invalid("Either product_id or product_code is required")),
    };

    let mut fields = COST_FIELDS.to_vec();
    fields.push("x_cost_calculated_date");

    let product = gateway
        .search_read(
            "product.template",
            domain,
            SearchReadOptions::fields(fields).limit(1),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::not_found("Product not found"))?;

    Ok(cost_detail(&product))
}

fn cost_detail(p: &Value) -> Value {
    let list_price = as_f64(p, "list_price");
    let standard_price = as_f64(p, "standard_price");
    let base_cost_rmb = as_f64(p, "x_base_cost_rmb");
    let exchange_rate = as_f64(p, "x_exchange_rate");
    let service_fee_rate = as_f64(p, "x_service_fee_rate");
    let si_fee_rate = as_f64(p, "x_si_fee_rate");
    let shipping_fee = as_f64(p, "x_shipping_fee");
    let ocean_fee = as_f64(p, "x_ocean_fee");

    let base_cost_php = base_cost_rmb * exchange_rate;
    let service_fee = base_cost_php * service_fee_rate;
    let si_fee = (base_cost_php + service_fee + shipping_fee + ocean_fee) * si_fee_rate;
    let (profit_amount, profit_margin) = profit(list_price, standard_price);

    json!({
        "product": {
            "id": p.get("id").cloned().unwrap_or(Value::Null),
            "name": p.get("name").cloned().unwrap_or(Value::Null),
            "default_code": p.get("default_code").cloned().unwrap_or(Value::Null),
            "category": label(p, "categ_id", NOT_AVAILABLE),
            "currency": label(p, "currency_id", DEFAULT_CURRENCY),
        },
        "pricing": {
            "sales_price": list_price,
            "landed_cost": standard_price,
            "profit_amount": profit_amount,
            "profit_margin_percent": round2(profit_margin),
        },
        "cost_breakdown": {
            "base_cost_rmb": base_cost_rmb,
            "exchange_rate": exchange_rate,
            "base_cost_php": round2(base_cost_php),
            "service_fee": round2(service_fee),
            "service_fee_rate_percent": service_fee_rate * 100.0,
            "shipping_fee": shipping_fee,
            "ocean_fee": ocean_fee,
            "si_fee": round2(si_fee),
            "si_fee_rate_percent": si_fee_rate * 100.0,
            "total_landed_cost": standard_price,
        },
        "metadata": {
            "cost_calculated_date": text_or(p, "x_cost_calculated_date"),
        },
    })
}

/// Side-by-side price, cost and margin of up to ten products
pub async fn compare_product_costs(
    gateway: &Gateway,
    params: CompareProductCostsParams,
) -> ToolResult<Value> {
    if params.product_codes.is_empty() {
        return Err(ToolError::invalid("product_codes must not be empty"));
    }
    if params.product_codes.len() > MAX_COMPARE {
        return Err(ToolError::invalid(format!(
            "At most {} products can be compared",
            MAX_COMPARE
        )));
    }

    let products = gateway
        .search_read(
            "product.template",
            Domain::new().condition("default_code", "in", params.product_codes),
            SearchReadOptions::fields([
                "name",
                "default_code",
                "list_price",
                "standard_price",
                "x_base_cost_rmb",
                "x_exchange_rate",
                "x_margin_percent",
            ])
            .limit(MAX_COMPARE as u64),
        )
        .await?;
    if products.is_empty() {
        return Err(ToolError::not_found("No products found"));
    }

    let comparison: Vec<Value> = products
        .iter()
        .map(|p| {
            let sales_price = as_f64(p, "list_price");
            let cost = as_f64(p, "standard_price");
            json!({
                "code": text_or(p, "default_code"),
                "name": text_or(p, "name"),
                "sales_price": sales_price,
                "cost": cost,
                "profit": sales_price - cost,
                "margin_percent": round2(as_f64(p, "x_margin_percent")),
                "base_cost_rmb": as_f64(p, "x_base_cost_rmb"),
                "exchange_rate": as_f64(p, "x_exchange_rate"),
            })
        })
        .collect();

    Ok(json!({
        "total_compared": comparison.len(),
        "comparison": comparison,
    }))
}
