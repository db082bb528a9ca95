//! Inventory parameter types

use odoo_rpc::Kwargs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CheckProductAvailabilityParams {
    #[schemars(description = "Product (variant) IDs to check")]
    pub product_ids: Vec<i64>,
    #[schemars(description = "Restrict quantities to this stock location")]
    pub location_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateInventoryAdjustmentParams {
    #[schemars(description = "Name or description of the adjustment")]
    pub name: String,
    #[schemars(
        description = "Adjustment lines, each with product_id (int), location_id (int) and product_qty (counted quantity)"
    )]
    pub adjustment_lines: Vec<Kwargs>,
    #[schemars(description = "Adjustment date (YYYY-MM-DD)")]
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeInventoryTurnoverParams {
    #[schemars(description = "Period start (YYYY-MM-DD)")]
    pub date_from: String,
    #[schemars(description = "Period end (YYYY-MM-DD)")]
    pub date_to: String,
    #[schemars(description = "Only analyze these products")]
    pub product_ids: Option<Vec<i64>>,
    #[schemars(description = "Only analyze products of this category")]
    pub category_id: Option<i64>,
}
