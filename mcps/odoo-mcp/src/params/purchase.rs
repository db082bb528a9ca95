//! Purchase parameter types

use odoo_rpc::Kwargs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchPurchaseOrdersParams {
    #[schemars(description = "Filter by supplier ID")]
    pub partner_id: Option<i64>,
    #[schemars(description = "Orders on or after this date (YYYY-MM-DD)")]
    pub date_from: Option<String>,
    #[schemars(description = "Orders on or before this date (YYYY-MM-DD)")]
    pub date_to: Option<String>,
    #[schemars(description = "Order state, e.g. 'draft', 'purchase', 'done'")]
    pub state: Option<String>,
    #[schemars(description = "Maximum number of orders (default: 20)")]
    pub limit: Option<u64>,
    #[schemars(description = "Pagination offset (default: 0)")]
    pub offset: Option<u64>,
    #[schemars(description = "Sort order, e.g. 'date_order desc'")]
    pub order: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreatePurchaseOrderParams {
    #[schemars(description = "Supplier ID")]
    pub partner_id: i64,
    #[schemars(
        description = "Order lines, each with product_id (int), product_qty (float) and optionally price_unit (float)"
    )]
    pub order_lines: Vec<Kwargs>,
    #[schemars(description = "Order date (YYYY-MM-DD)")]
    pub date_order: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeSupplierPerformanceParams {
    #[schemars(description = "Period start (YYYY-MM-DD)")]
    pub date_from: String,
    #[schemars(description = "Period end (YYYY-MM-DD)")]
    pub date_to: String,
    #[schemars(description = "Only analyze these suppliers")]
    pub supplier_ids: Option<Vec<i64>>,
}
