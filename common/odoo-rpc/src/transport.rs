//! Backend transports
//!
//! [`RpcTransport`] is the single seam between the gateway and the network.
//! Production uses [`JsonRpcTransport`] (Odoo's `/jsonrpc` endpoint); tests
//! plug in the in-memory stub.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::error::{RpcError, RpcResult};

/// Exception names that mean "your login is not (or no longer) valid"
const AUTH_EXCEPTIONS: [&str; 3] = ["AccessDenied", "SessionExpiredException", "SessionExpired"];

/// JSON-RPC error code Odoo uses for an expired session
const SESSION_EXPIRED_CODE: i64 = 100;

const SNIPPET_LEN: usize = 200;

/// Trait for backend transports
///
/// One invocation is exactly one request on the wire. Implementations must
/// not retry.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Human-readable endpoint, for logs
    fn endpoint(&self) -> &str;

    /// Invoke `service.method(*args)` on the backend
    ///
    /// `service` is `common` for login and `object` for model methods.
    async fn call(&self, service: &str, method: &str, args: Vec<Value>) -> RpcResult<Value>;
}

/// JSON-RPC over HTTP(S)
pub struct JsonRpcTransport {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    /// Build a transport for the server at `url`
    ///
    /// `timeout` bounds every request; it is the only timeout in the system.
    pub fn new(url: &str, timeout: Duration, verify_ssl: bool) -> RpcResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("odoo-rpc/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .map_err(|e| RpcError::Connectivity(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/jsonrpc", url.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl RpcTransport for JsonRpcTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self, args), fields(endpoint = %self.endpoint))]
    async fn call(&self, service: &str, method: &str, args: Vec<Value>) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": service,
                "method": method,
                "args": args,
            },
            "id": id,
        });

        debug!(id, "sending request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Connectivity(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &text));
        }

        let body = response.bytes().await?;
        parse_reply(&body)
    }
}

/// Map a non-2xx HTTP status to a fault
pub(crate) fn classify_status(status: u16, body: &str) -> RpcError {
    let detail = format!("HTTP {} from backend: {}", status, snippet(body));
    if status >= 500 {
        RpcError::Connectivity(detail)
    } else {
        RpcError::Protocol(detail)
    }
}

/// Interpret a JSON-RPC reply body
pub(crate) fn parse_reply(body: &[u8]) -> RpcResult<Value> {
    let reply: Value = serde_json::from_slice(body).map_err(|e| {
        RpcError::Protocol(format!(
            "reply is not valid JSON ({}): {}",
            e,
            snippet(&String::from_utf8_lossy(body))
        ))
    })?;

    let Value::Object(mut reply) = reply else {
        return Err(RpcError::Protocol("reply is not a JSON object".to_string()));
    };

    if let Some(error) = reply.remove("error").filter(|e| !e.is_null()) {
        return Err(classify_fault(&error));
    }

    reply
        .remove("result")
        .ok_or_else(|| RpcError::Protocol("reply carries neither result nor error".to_string()))
}

/// Map a JSON-RPC `error` object to a fault
pub(crate) fn classify_fault(error: &Value) -> RpcError {
    if !error.is_object() {
        return RpcError::Protocol(format!("malformed error object: {}", error));
    }

    let code = error.get("code").and_then(Value::as_i64);
    let data = error.get("data");
    let exception = data
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = data
        .and_then(|d| d.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .or_else(|| error.get("message").and_then(Value::as_str))
        .unwrap_or("unknown backend error")
        .to_string();

    let is_auth = code == Some(SESSION_EXPIRED_CODE)
        || exception
            .as_deref()
            .is_some_and(|name| AUTH_EXCEPTIONS.iter().any(|a| name.ends_with(a)));

    if is_auth {
        RpcError::Authentication(message)
    } else {
        RpcError::RemoteMethod { exception, message }
    }
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(SNIPPET_LEN).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result() {
        let body = br#"{"jsonrpc": "2.0", "id": 1, "result": [{"id": 1, "name": "Acme"}]}"#;
        let value = parse_reply(body).unwrap();
        assert_eq!(value, json!([{"id": 1, "name": "Acme"}]));
    }

    #[test]
    fn test_parse_null_and_false_results() {
        assert_eq!(parse_reply(br#"{"id": 1, "result": null}"#).unwrap(), Value::Null);
        assert_eq!(parse_reply(br#"{"id": 1, "result": false}"#).unwrap(), json!(false));
    }

    #[test]
    fn test_application_fault_keeps_message_verbatim() {
        let body = br#"{"id": 1, "error": {"code": 200, "message": "Odoo Server Error",
            "data": {"name": "builtins.ValueError", "message": "Invalid field 'nmae' on model 'res.partner'"}}}"#;
        match parse_reply(body) {
            Err(RpcError::RemoteMethod { exception, message }) => {
                assert_eq!(exception.as_deref(), Some("builtins.ValueError"));
                assert_eq!(message, "Invalid field 'nmae' on model 'res.partner'");
            }
            other => panic!("expected remote method fault, got {:?}", other),
        }
    }

    #[test]
    fn test_access_denied_is_authentication() {
        let body = br#"{"id": 1, "error": {"code": 200, "message": "Odoo Server Error",
            "data": {"name": "odoo.exceptions.AccessDenied", "message": "Access Denied"}}}"#;
        assert_eq!(
            parse_reply(body),
            Err(RpcError::Authentication("Access Denied".to_string()))
        );
    }

    #[test]
    fn test_session_expired_code_is_authentication() {
        let body = br#"{"id": 1, "error": {"code": 100, "message": "Odoo Session Expired"}}"#;
        assert!(parse_reply(body).unwrap_err().is_authentication());
    }

    #[test]
    fn test_access_error_is_not_authentication() {
        let body = br#"{"id": 1, "error": {"code": 200, "message": "Odoo Server Error",
            "data": {"name": "odoo.exceptions.AccessError", "message": "You are not allowed to access 'Journal Entry'"}}}"#;
        assert!(matches!(parse_reply(body), Err(RpcError::RemoteMethod { .. })));
    }

    #[test]
    fn test_malformed_replies_are_protocol_errors() {
        assert!(matches!(parse_reply(b"<html>502</html>"), Err(RpcError::Protocol(_))));
        assert!(matches!(parse_reply(b"[1, 2]"), Err(RpcError::Protocol(_))));
        assert!(matches!(parse_reply(br#"{"id": 1}"#), Err(RpcError::Protocol(_))));
        assert!(matches!(
            parse_reply(br#"{"id": 1, "error": "boom"}"#),
            Err(RpcError::Protocol(_))
        ));
    }

    #[test]
    fn test_http_status_classification() {
        assert!(matches!(classify_status(502, "Bad Gateway"), RpcError::Connectivity(_)));
        assert!(matches!(classify_status(404, "Not Found"), RpcError::Protocol(_)));
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(snippet(&long).chars().count(), SNIPPET_LEN + 3);
        assert_eq!(snippet("short"), "short");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connectivity_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let transport =
            JsonRpcTransport::new("http://127.0.0.1:9", Duration::from_secs(2), true).unwrap();
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9/jsonrpc");
        let err = transport
            .call("common", "version", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Connectivity(_)), "got {:?}", err);
    }
}
