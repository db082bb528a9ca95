//! Product cost parameter types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeProductCostsParams {
    #[schemars(description = "Number of products to return (default: 20, max: 100)")]
    pub limit: Option<u64>,
    #[schemars(description = "Only products of this category")]
    pub category_id: Option<i64>,
    #[schemars(description = "Minimum profit margin as a fraction, e.g. 0.2 for 20%; 0 disables the filter")]
    pub min_profit_margin: Option<f64>,
    #[schemars(
        description = "Sort by 'profit_margin' (default), 'profit_amount', 'sales_price' or 'cost'"
    )]
    pub sort_by: Option<String>,
    #[schemars(description = "Currency label when the product has none (default: PHP)")]
    pub currency: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetProductCostDetailParams {
    #[schemars(description = "Product template ID (either this or product_code)")]
    pub product_id: Option<i64>,
    #[schemars(description = "Product internal reference / default_code")]
    pub product_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CompareProductCostsParams {
    #[schemars(description = "Internal references of the products to compare (max 10)")]
    pub product_codes: Vec<String>,
}
