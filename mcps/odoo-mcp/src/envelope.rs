//! Tool reply envelope
//!
//! Every tool answers `{"success": true, "result": ...}` or
//! `{"success": false, "error": "..."}`. Handlers return [`ToolResult`];
//! the conversion to an envelope happens once, in the server.

use odoo_rpc::RpcError;
use rmcp::{
    model::{CallToolResult, Content},
    ErrorData as McpError,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single tool invocation
#[derive(Debug, Error)]
pub enum ToolError {
    /// Input rejected before contacting the backend
    #[error("{0}")]
    InvalidInput(String),

    /// A referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ToolError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ToolError::NotFound(message.into())
    }
}

/// `{success, result | error}`; exactly one of `result`/`error` is set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ToolEnvelope {
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Envelope for a handler outcome, logging failures
    pub fn from_result(tool: &str, outcome: ToolResult<Value>) -> Self {
        match outcome {
            Ok(result) => Self::ok(result),
            Err(err) => {
                match &err {
                    ToolError::Rpc(RpcError::Protocol(_)) => {
                        tracing::error!(tool, error = %err, "tool failed on an unreadable reply")
                    }
                    ToolError::Rpc(rpc) => {
                        tracing::warn!(tool, kind = rpc.kind(), error = %err, "tool failed")
                    }
                    _ => tracing::warn!(tool, error = %err, "tool rejected input"),
                }
                Self::err(err.to_string())
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!(self)
    }

    /// Pretty JSON text content for the MCP reply
    pub fn into_call_result(self) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(&self)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let envelope = ToolEnvelope::ok(json!({"id": 7}));
        assert_eq!(envelope.to_value(), json!({"success": true, "result": {"id": 7}}));
        assert!(envelope.error().is_none());
    }

    #[test]
    fn test_success_with_null_result_keeps_key() {
        let envelope = ToolEnvelope::ok(Value::Null);
        assert_eq!(envelope.to_value(), json!({"success": true, "result": null}));
    }

    #[test]
    fn test_failure_shape() {
        let envelope = ToolEnvelope::err("boom");
        assert_eq!(envelope.to_value(), json!({"success": false, "error": "boom"}));
        assert!(envelope.result().is_none());
    }

    #[test]
    fn test_remote_message_passes_through_verbatim() {
        let outcome: ToolResult<Value> = Err(RpcError::remote("Invalid field 'nmae'").into());
        let envelope = ToolEnvelope::from_result("search_records", outcome);
        assert!(!envelope.is_success());
        assert_eq!(envelope.error(), Some("Invalid field 'nmae'"));
    }

    #[test]
    fn test_every_error_kind_becomes_an_envelope() {
        let errors = vec![
            ToolError::invalid("Invalid date format: 2024-13-01. Use YYYY-MM-DD."),
            ToolError::not_found("Product not found"),
            RpcError::Connectivity("connection refused".into()).into(),
            RpcError::Authentication("Access Denied".into()).into(),
            RpcError::Protocol("garbage".into()).into(),
        ];
        for err in errors {
            let message = err.to_string();
            let envelope = ToolEnvelope::from_result("any", Err(err));
            assert_eq!(envelope.error(), Some(message.as_str()));
        }
    }

    #[test]
    fn test_call_result_carries_json_text() {
        let result = ToolEnvelope::ok(json!([1, 2])).into_call_result().unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(result.content.len(), 1);
    }
}
