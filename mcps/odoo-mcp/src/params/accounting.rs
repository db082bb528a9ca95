//! Accounting parameter types

use odoo_rpc::Kwargs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchJournalEntriesParams {
    #[schemars(description = "Entries on or after this date (YYYY-MM-DD)")]
    pub date_from: Option<String>,
    #[schemars(description = "Entries on or before this date (YYYY-MM-DD)")]
    pub date_to: Option<String>,
    #[schemars(description = "Filter by journal ID")]
    pub journal_id: Option<i64>,
    #[schemars(description = "Entry state, e.g. 'draft', 'posted'")]
    pub state: Option<String>,
    #[schemars(description = "Maximum number of entries (default: 20)")]
    pub limit: Option<u64>,
    #[schemars(description = "Pagination offset (default: 0)")]
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateJournalEntryParams {
    #[schemars(description = "Journal ID")]
    pub journal_id: i64,
    #[schemars(
        description = "Entry lines, each with account_id (int), debit and credit (float, default 0), optional name and partner_id. Debits must equal credits"
    )]
    pub lines: Vec<Kwargs>,
    #[serde(rename = "ref")]
    #[schemars(description = "Entry reference")]
    pub reference: Option<String>,
    #[schemars(description = "Accounting date (YYYY-MM-DD)")]
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeFinancialRatiosParams {
    #[schemars(description = "Period start (YYYY-MM-DD)")]
    pub date_from: String,
    #[schemars(description = "Period end (YYYY-MM-DD)")]
    pub date_to: String,
    #[schemars(
        description = "Ratio families to compute: 'liquidity', 'profitability', 'debt', 'efficiency' (default: all)"
    )]
    pub ratios: Option<Vec<String>>,
}
