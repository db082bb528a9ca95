//! Accounting handler implementations

use std::collections::HashMap;

use odoo_rpc::value::{as_f64, many2one_id, record_id};
use odoo_rpc::{Domain, Gateway, Kwargs, RpcResult, SearchReadOptions, Value};
use serde_json::json;

use crate::envelope::{ToolError, ToolResult};
use crate::params::{
    AnalyzeFinancialRatiosParams, CreateJournalEntryParams, SearchJournalEntriesParams,
};
use crate::validate::{line_f64, parse_optional_date, parse_period, require_line_keys};

use super::{copy_present, create_commands, page_reply, read_created, round2, search_page, Page};

const ENTRY_FIELDS: [&str; 8] = [
    "name",
    "ref",
    "date",
    "journal_id",
    "state",
    "amount_total",
    "amount_total_signed",
    "line_ids",
];

const LINE_FIELDS: [&str; 7] = [
    "move_id",
    "name",
    "account_id",
    "partner_id",
    "debit",
    "credit",
    "balance",
];

/// Ratio families of [`analyze_financial_ratios`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioFamily {
    Liquidity,
    Profitability,
    Debt,
    Efficiency,
}

impl RatioFamily {
    pub const ALL: [RatioFamily; 4] = [
        RatioFamily::Liquidity,
        RatioFamily::Profitability,
        RatioFamily::Debt,
        RatioFamily::Efficiency,
    ];

    fn parse(value: &str) -> ToolResult<Self> {
        match value {
            "liquidity" => Ok(Self::Liquidity),
            "profitability" => Ok(Self::Profitability),
            "debt" => Ok(Self::Debt),
            "efficiency" => Ok(Self::Efficiency),
            other => Err(ToolError::invalid(format!(
                "Unknown ratio '{}'. Use 'liquidity', 'profitability', 'debt' or 'efficiency'.",
                other
            ))),
        }
    }
}

/// Journal entries with their lines inlined as `lines`
pub async fn search_journal_entries(
    gateway: &Gateway,
    params: SearchJournalEntriesParams,
) -> ToolResult<Value> {
    let date_from = parse_optional_date(params.date_from.as_deref())?;
    let date_to = parse_optional_date(params.date_to.as_deref())?;

    let mut domain = Domain::new();
    if let Some(from) = date_from {
        domain.push("date", ">=", from);
    }
    if let Some(to) = date_to {
        domain.push("date", "<=", to);
    }
    if let Some(journal_id) = params.journal_id {
        domain.push("journal_id", "=", journal_id);
    }
    if let Some(state) = params.state.as_deref() {
        domain.push("state", "=", state);
    }

    let page = Page::new(params.limit, params.offset, None);
    let (mut entries, total_count) =
        search_page(gateway, "account.move", domain, &ENTRY_FIELDS, page).await?;

    let line_ids: Vec<i64> = entries
        .iter()
        .filter_map(|entry| entry.get("line_ids").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_i64)
        .collect();

    if !line_ids.is_empty() {
        let lines = gateway
            .search_read(
                "account.move.line",
                Domain::new().condition("id", "in", line_ids),
                SearchReadOptions::fields(LINE_FIELDS),
            )
            .await?;

        let mut by_move: HashMap<i64, Vec<Value>> = HashMap::new();
        for mut line in lines {
            let move_id = line.get("move_id").and_then(many2one_id);
            if let Some(fields) = line.as_object_mut() {
                fields.remove("move_id");
            }
            if let Some(move_id) = move_id {
                by_move.entry(move_id).or_default().push(line);
            }
        }

        for entry in &mut entries {
            let lines = record_id(entry)
                .and_then(|id| by_move.remove(&id))
                .unwrap_or_default();
            if let Some(fields) = entry.as_object_mut() {
                if fields.remove("line_ids").is_some() {
                    fields.insert("lines".to_string(), Value::Array(lines));
                }
            }
        }
    }

    Ok(page_reply(entries, total_count, "entries"))
}

pub async fn create_journal_entry(
    gateway: &Gateway,
    params: CreateJournalEntryParams,
) -> ToolResult<Value> {
    let date = parse_optional_date(params.date.as_deref())?;
    require_line_keys(&params.lines, &["account_id"])?;

    let total_debit: f64 = params.lines.iter().map(|l| line_f64(l, "debit")).sum();
    let total_credit: f64 = params.lines.iter().map(|l| line_f64(l, "credit")).sum();
    if round2(total_debit) != round2(total_credit) {
        return Err(ToolError::invalid(format!(
            "Entry is not balanced. Debit: {}, Credit: {}",
            total_debit, total_credit
        )));
    }

    let mut values = Kwargs::new();
    values.insert("journal_id".to_string(), json!(params.journal_id));
    if let Some(reference) = params.reference.filter(|r| !r.is_empty()) {
        values.insert("ref".to_string(), json!(reference));
    }
    if let Some(date) = date {
        values.insert("date".to_string(), json!(date));
    }
    values.insert(
        "line_ids".to_string(),
        create_commands(&params.lines, |line| {
            let mut line_values = Kwargs::new();
            copy_present(line, &mut line_values, &["account_id"]);
            let name = line
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .unwrap_or("/");
            line_values.insert("name".to_string(), json!(name));
            line_values.insert("debit".to_string(), json!(line_f64(line, "debit")));
            line_values.insert("credit".to_string(), json!(line_f64(line, "credit")));
            if let Some(partner) = line.get("partner_id").filter(|p| p.as_i64().unwrap_or(0) > 0) {
                line_values.insert("partner_id".to_string(), partner.clone());
            }
            line_values
        }),
    );

    let move_id = gateway.create("account.move", values).await?;
    let created = read_created(gateway, "account.move", move_id, &["name", "state"]).await?;

    Ok(json!({
        "move_id": move_id,
        "name": created.get("name").cloned().unwrap_or(Value::Null),
        "state": created.get("state").cloned().unwrap_or(Value::Null),
    }))
}

/// Posted balance of one account group over the period
async fn group_balance(
    gateway: &Gateway,
    group: &str,
    account_type: Option<&str>,
    date_from: &str,
    date_to: &str,
) -> RpcResult<f64> {
    let mut domain =
        Domain::new().condition("account_id.user_type_id.internal_group", "=", group);
    if let Some(account_type) = account_type {
        domain.push("account_id.user_type_id.type", "=", account_type);
    }
    domain.push("date", ">=", date_from);
    domain.push("date", "<=", date_to);
    domain.push("parent_state", "=", "posted");

    let lines = gateway
        .search_read(
            "account.move.line",
            domain,
            SearchReadOptions::fields(["account_id", "balance"]),
        )
        .await?;
    Ok(lines.iter().map(|line| as_f64(line, "balance")).sum())
}

/// Period balances that feed the ratios
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Balances {
    pub total_assets: f64,
    pub current_assets: f64,
    pub total_liabilities: f64,
    pub current_liabilities: f64,
    pub total_equity: f64,
    pub total_income: f64,
    pub total_expenses: f64,
}

impl Balances {
    pub fn net_income(&self) -> f64 {
        self.total_income - self.total_expenses
    }

    /// `part / whole`, zero when `whole` is zero
    fn ratio(part: f64, whole: f64) -> f64 {
        if whole != 0.0 {
            part / whole
        } else {
            0.0
        }
    }

    pub fn family(&self, family: RatioFamily) -> Value {
        let net_income = self.net_income();
        let liabilities = self.total_liabilities.abs();
        match family {
            RatioFamily::Liquidity => json!({
                "current_ratio": Self::ratio(self.current_assets, self.current_liabilities.abs()),
                "current_assets": self.current_assets,
                "current_liabilities": self.current_liabilities.abs(),
            }),
            RatioFamily::Profitability => json!({
                "return_on_assets": Self::ratio(net_income, self.total_assets) * 100.0,
                "return_on_equity": Self::ratio(net_income, self.total_equity) * 100.0,
                "net_profit_margin": Self::ratio(net_income, self.total_income) * 100.0,
                "net_income": net_income,
                "total_income": self.total_income,
            }),
            RatioFamily::Debt => json!({
                "debt_ratio": Self::ratio(liabilities, self.total_assets) * 100.0,
                "leverage_ratio": Self::ratio(liabilities, self.total_equity),
                "total_liabilities": liabilities,
                "total_equity": self.total_equity,
            }),
            RatioFamily::Efficiency => json!({
                "asset_turnover": Self::ratio(self.total_income, self.total_assets),
            }),
        }
    }
}

/// Liquidity, profitability, debt and efficiency ratios from posted lines
pub async fn analyze_financial_ratios(
    gateway: &Gateway,
    params: AnalyzeFinancialRatiosParams,
) -> ToolResult<Value> {
    parse_period(&params.date_from, &params.date_to)?;
    let families = match params.ratios.as_deref() {
        None | Some([]) => RatioFamily::ALL.to_vec(),
        Some(names) => names
            .iter()
            .map(|name| RatioFamily::parse(name))
            .collect::<ToolResult<Vec<_>>>()?,
    };

    let (from, to) = (params.date_from.as_str(), params.date_to.as_str());
    let (
        total_assets,
        current_assets,
        total_liabilities,
        current_liabilities,
        total_equity,
        total_income,
        total_expenses,
    ) = tokio::try_join!(
        group_balance(gateway, "asset", None, from, to),
        group_balance(gateway, "asset", Some("liquidity"), from, to),
        group_balance(gateway, "liability", None, from, to),
        group_balance(gateway, "liability", Some("payable"), from, to),
        group_balance(gateway, "equity", None, from, to),
        group_balance(gateway, "income", None, from, to),
        group_balance(gateway, "expense", None, from, to),
    )?;

    let balances = Balances {
        total_assets,
        current_assets,
        total_liabilities,
        current_liabilities,
        total_equity,
        total_income,
        total_expenses,
    };

    let mut ratios = serde_json::Map::new();
    for family in families {
        let key = match family {
            RatioFamily::Liquidity => "liquidity",
            RatioFamily::Profitability => "profitability",
            RatioFamily::Debt => "debt",
            RatioFamily::Efficiency => "efficiency",
        };
        ratios.insert(key.to_string(), balances.family(family));
    }

    Ok(json!({
        "period": {"from": params.date_from, "to": params.date_to},
        "summary": {
            "total_assets": balances.total_assets,
            "total_liabilities": balances.total_liabilities.abs(),
            "total_equity": balances.total_equity,
            "total_income": balances.total_income,
            "total_expenses": balances.total_expenses.abs(),
            "net_income": balances.net_income(),
        },
        "ratios": ratios,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_family_parse() {
        assert_eq!(RatioFamily::parse("debt").unwrap(), RatioFamily::Debt);
        assert!(RatioFamily::parse("solvency").is_err());
    }

    #[test]
    fn test_ratios_with_zero_denominators() {
        let balances = Balances::default();
        assert_eq!(balances.family(RatioFamily::Liquidity)["current_ratio"], json!(0.0));
        assert_eq!(balances.family(RatioFamily::Efficiency)["asset_turnover"], json!(0.0));
    }

    #[test]
    fn test_ratio_values() {
        let balances = Balances {
            total_assets: 1000.0,
            current_assets: 400.0,
            total_liabilities: -500.0,
            current_liabilities: -200.0,
            total_equity: 250.0,
            total_income: 300.0,
            total_expenses: 200.0,
        };
        let liquidity = balances.family(RatioFamily::Liquidity);
        assert_eq!(liquidity["current_ratio"], json!(2.0));
        assert_eq!(liquidity["current_liabilities"], json!(200.0));

        let profitability = balances.family(RatioFamily::Profitability);
        assert_eq!(profitability["return_on_assets"], json!(10.0));
        assert_eq!(profitability["return_on_equity"], json!(40.0));

        let debt = balances.family(RatioFamily::Debt);
        assert_eq!(debt["debt_ratio"], json!(50.0));
        assert_eq!(debt["leverage_ratio"], json!(2.0));
    }
}
