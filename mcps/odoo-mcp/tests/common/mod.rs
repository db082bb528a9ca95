//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use odoo_mcp::OdooMcpServer;
use odoo_rpc::stub::StubTransport;
use odoo_rpc::{Credentials, Gateway};
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub fn gateway(stub: &Arc<StubTransport>) -> Gateway {
    Gateway::new(
        stub.clone(),
        Credentials::new("http://odoo.test", "prod", "admin", "secret"),
    )
}

pub fn server(stub: &Arc<StubTransport>) -> OdooMcpServer {
    OdooMcpServer::new(Arc::new(gateway(stub)))
}

/// Tool parameters as a client would send them
pub fn params<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("valid tool parameters")
}

/// The envelope carried in the text content of a tool reply
pub fn envelope(result: CallToolResult) -> Value {
    let reply = serde_json::to_value(&result).expect("serializable tool result");
    let text = reply["content"][0]["text"]
        .as_str()
        .expect("text content")
        .to_string();
    serde_json::from_str(&text).expect("envelope is JSON")
}

/// Positional domain of a recorded request, as compact JSON text
pub fn domain_text(request: &odoo_rpc::stub::RecordedRequest) -> String {
    request
        .positional()
        .first()
        .map(Value::to_string)
        .unwrap_or_default()
}
