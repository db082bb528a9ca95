//! Generic model access parameter types

use odoo_rpc::Kwargs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteMethodParams {
    #[schemars(description = "The Odoo model name (e.g. 'res.partner')")]
    pub model: String,
    #[schemars(description = "Method name to execute (e.g. 'search_read')")]
    pub method: String,
    #[schemars(description = "Positional arguments for the method")]
    pub args: Option<Vec<Value>>,
    #[schemars(
        description = "Keyword arguments for the method (e.g. {\"domain\": [], \"fields\": [\"name\"], \"limit\": 10}). search/search_read default to limit 100; search_read without fields reads a minimal field set"
    )]
    pub kwargs: Option<Kwargs>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchRecordsParams {
    #[schemars(description = "The Odoo model name")]
    pub model: String,
    #[schemars(
        description = "Search domain, e.g. [[\"name\", \"ilike\", \"acme\"]]; prefix operators '&', '|', '!' allowed"
    )]
    pub domain: Option<Value>,
    #[schemars(description = "Fields to read (default: id, name, display_name, create_date, write_date)")]
    pub fields: Option<Vec<String>>,
    #[schemars(description = "Maximum number of records (default: 100)")]
    pub limit: Option<u64>,
    #[schemars(description = "Number of records to skip")]
    pub offset: Option<u64>,
    #[schemars(description = "Sort order, e.g. 'name asc, id desc'")]
    pub order: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CountRecordsParams {
    #[schemars(description = "The Odoo model name")]
    pub model: String,
    #[schemars(description = "Search domain (default: all records)")]
    pub domain: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadRecordsParams {
    #[schemars(description = "The Odoo model name")]
    pub model: String,
    #[schemars(description = "Record IDs to read")]
    pub ids: Vec<i64>,
    #[schemars(description = "Fields to read (default: all fields)")]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateRecordParams {
    #[schemars(description = "The Odoo model name")]
    pub model: String,
    #[schemars(description = "Field values of the new record")]
    pub values: Kwargs,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateRecordsParams {
    #[schemars(description = "The Odoo model name")]
    pub model: String,
    #[schemars(description = "Record IDs to update")]
    pub ids: Vec<i64>,
    #[schemars(description = "Field values to write")]
    pub values: Kwargs,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteRecordsParams {
    #[schemars(description = "The Odoo model name")]
    pub model: String,
    #[schemars(description = "Record IDs to delete")]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchEmployeeParams {
    #[schemars(description = "Name (or part of the name) to search for")]
    pub name: String,
    #[schemars(description = "Maximum number of results (default: 20)")]
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchHolidaysParams {
    #[schemars(description = "Start date in YYYY-MM-DD format")]
    pub start_date: String,
    #[schemars(description = "End date in YYYY-MM-DD format")]
    pub end_date: String,
    #[schemars(description = "Only holidays of this employee")]
    pub employee_id: Option<i64>,
}
