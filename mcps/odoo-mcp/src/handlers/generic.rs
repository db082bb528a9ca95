//! Generic model access handlers

use chrono::Duration;
use odoo_rpc::{Domain, Gateway, Kwargs, RpcError, SearchReadOptions};
use serde_json::{json, Value};

use crate::envelope::{ToolError, ToolResult};
use crate::params::{
    CountRecordsParams, CreateRecordParams, DeleteRecordsParams, ExecuteMethodParams,
    ReadRecordsParams, SearchEmployeeParams, SearchHolidaysParams, SearchRecordsParams,
    UpdateRecordsParams,
};
use crate::validate::{format_date, parse_date, require_ids};

use super::{caller_domain, require_model};

const EMPLOYEE_SEARCH_LIMIT: u64 = 20;

const HOLIDAY_FIELDS: [&str; 6] = [
    "display_name",
    "start_datetime",
    "stop_datetime",
    "employee_id",
    "name",
    "state",
];

/// Run any method on any model, with the bulk-read safety defaults
pub async fn execute_method(gateway: &Gateway, params: ExecuteMethodParams) -> ToolResult<Value> {
    require_model(&params.model)?;
    if params.method.trim().is_empty() {
        return Err(ToolError::invalid("method must not be empty"));
    }

    let reply = gateway
        .dispatch(
            &params.model,
            &params.method,
            params.args.unwrap_or_default(),
            params.kwargs.unwrap_or_default(),
        )
        .await?;
    Ok(reply)
}

/// `search_read` through the generic path; `{count, records}`
pub async fn search_records(gateway: &Gateway, params: SearchRecordsParams) -> ToolResult<Value> {
    require_model(&params.model)?;

    let mut kwargs = Kwargs::new();
    kwargs.insert("domain".to_string(), caller_domain(params.domain)?);
    if let Some(fields) = params.fields {
        kwargs.insert("fields".to_string(), json!(fields));
    }
    if let Some(limit) = params.limit {
        kwargs.insert("limit".to_string(), json!(limit));
    }
    if let Some(offset) = params.offset {
        kwargs.insert("offset".to_string(), json!(offset));
    }
    if let Some(order) = params.order {
        kwargs.insert("order".to_string(), json!(order));
    }

    let records = match gateway
        .dispatch(&params.model, "search_read", Vec::new(), kwargs)
        .await?
    {
        Value::Array(records) => records,
        other => {
            return Err(RpcError::Protocol(format!(
                "{}.search_read returned {} instead of a list",
                params.model, other
            ))
            .into())
        }
    };

    Ok(json!({
        "count": records.len(),
        "records": records,
    }))
}

pub async fn count_records(gateway: &Gateway, params: CountRecordsParams) -> ToolResult<Value> {
    require_model(&params.model)?;
    let count = gateway
        .search_count(&params.model, caller_domain(params.domain)?)
        .await?;
    Ok(json!(count))
}

pub async fn read_records(gateway: &Gateway, params: ReadRecordsParams) -> ToolResult<Value> {
    require_model(&params.model)?;
    require_ids(&params.ids, "ids")?;

    let fields = params.fields.unwrap_or_default();
    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    let records = gateway.read(&params.model, &params.ids, &fields).await?;
    Ok(Value::Array(records))
}

pub async fn create_record(gateway: &Gateway, params: CreateRecordParams) -> ToolResult<Value> {
    require_model(&params.model)?;
    if params.values.is_empty() {
        return Err(ToolError::invalid("values must not be empty"));
    }

    let id = gateway.create(&params.model, params.values).await?;
    Ok(json!({ "id": id }))
}

pub async fn update_records(gateway: &Gateway, params: UpdateRecordsParams) -> ToolResult<Value> {
    require_model(&params.model)?;
    require_ids(&params.ids, "ids")?;
    if params.values.is_empty() {
        return Err(ToolError::invalid("values must not be empty"));
    }

    let updated = gateway.write(&params.model, &params.ids, params.values).await?;
    Ok(json!({ "updated": updated }))
}

pub async fn delete_records(gateway: &Gateway, params: DeleteRecordsParams) -> ToolResult<Value> {
    require_model(&params.model)?;
    require_ids(&params.ids, "ids")?;

    let deleted = gateway.unlink(&params.model, &params.ids).await?;
    Ok(json!({ "deleted": deleted }))
}

/// Employees whose name matches, as `[{id, name}]`
pub async fn search_employee(gateway: &Gateway, params: SearchEmployeeParams) -> ToolResult<Value> {
    let limit = params.limit.unwrap_or(EMPLOYEE_SEARCH_LIMIT);
    let matches = gateway
        .name_search("hr.employee", &params.name, limit)
        .await?;

    Ok(Value::Array(
        matches
            .into_iter()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect(),
    ))
}

/// Time off overlapping `[start_date, end_date]`
///
/// The calendar report stores UTC datetimes; the window is widened to the
/// evening before `start_date` so leaves starting at local midnight match.
pub async fn search_holidays(gateway: &Gateway, params: SearchHolidaysParams) -> ToolResult<Value> {
    let start = parse_date(&params.start_date)?;
    let end = parse_date(&params.end_date)?;
    let window_start = format_date(start - Duration::days(1));

    let mut domain = Domain::new()
        .and()
        .condition("start_datetime", "<=", format!("{} 22:59:59", format_date(end)))
        .condition("stop_datetime", ">=", format!("{} 23:00:00", window_start));
    if let Some(employee_id) = params.employee_id {
        domain.push("employee_id", "=", employee_id);
    }

    let holidays = gateway
        .search_read(
            "hr.leave.report.calendar",
            domain,
            SearchReadOptions::fields(HOLIDAY_FIELDS),
        )
        .await?;
    Ok(Value::Array(holidays))
}
