//! In-memory transport for tests
//!
//! Records every outbound request and answers from a table of canned
//! replies keyed by `(model, method)`, falling back to an optional handler.
//!
//! ```rust,ignore
//! let stub = Arc::new(
//!     StubTransport::new()
//!         .with_reply("res.partner", "search_read", Ok(json!([{"id": 1}])))
//! );
//! let gateway = Gateway::new(stub.clone(), credentials);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{RpcError, RpcResult};
use crate::transport::RpcTransport;
use crate::value::Kwargs;

/// uid handed out by the default login reply
pub const STUB_UID: i64 = 2;

type Handler = Box<dyn Fn(&RecordedRequest) -> RpcResult<Value> + Send + Sync>;

/// One request as it would have gone over the wire
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub service: String,
    pub method: String,
    pub args: Vec<Value>,
}

impl RecordedRequest {
    fn is_execute(&self) -> bool {
        self.service == "object" && self.method == "execute_kw"
    }

    /// Model of an `execute_kw` request
    pub fn model(&self) -> Option<&str> {
        self.is_execute().then(|| self.args.get(3)?.as_str()).flatten()
    }

    /// Model method of an `execute_kw` request
    pub fn model_method(&self) -> Option<&str> {
        self.is_execute().then(|| self.args.get(4)?.as_str()).flatten()
    }

    /// Positional arguments of an `execute_kw` request
    pub fn positional(&self) -> &[Value] {
        self.args
            .get(5)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keyword arguments of an `execute_kw` request
    pub fn kwargs(&self) -> Kwargs {
        self.args
            .get(6)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

/// Scripted backend
pub struct StubTransport {
    login: Mutex<RpcResult<Value>>,
    replies: Mutex<HashMap<(String, String), RpcResult<Value>>>,
    handler: Option<Handler>,
    injected: Mutex<VecDeque<RpcError>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StubTransport {
    /// Stub that accepts any login as uid [`STUB_UID`] and knows no methods
    pub fn new() -> Self {
        Self {
            login: Mutex::new(Ok(json!(STUB_UID))),
            replies: Mutex::new(HashMap::new()),
            handler: None,
            injected: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply to `common.login`
    pub fn with_login(self, reply: RpcResult<Value>) -> Self {
        *self.login.lock().unwrap() = reply;
        self
    }

    /// Canned reply for `model.method`
    pub fn with_reply(self, model: &str, method: &str, reply: RpcResult<Value>) -> Self {
        self.set_reply(model, method, reply);
        self
    }

    /// Fallback for model calls without a canned reply
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Replace a canned reply after construction
    pub fn set_reply(&self, model: &str, method: &str, reply: RpcResult<Value>) {
        self.replies
            .lock()
            .unwrap()
            .insert((model.to_string(), method.to_string()), reply);
    }

    /// Make the next model call fail with `error`, once
    pub fn inject_fault(&self, error: RpcError) {
        self.injected.lock().unwrap().push_back(error);
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Model calls only (logins filtered out)
    pub fn model_calls(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(RecordedRequest::is_execute)
            .collect()
    }

    pub fn login_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.service == "common" && r.method == "login")
            .count()
    }

    fn answer(&self, request: &RecordedRequest) -> RpcResult<Value> {
        if request.service == "common" && request.method == "login" {
            return self.login.lock().unwrap().clone();
        }

        if !request.is_execute() {
            return Err(RpcError::remote(format!(
                "stub does not implement {}.{}",
                request.service, request.method
            )));
        }

        if let Some(error) = self.injected.lock().unwrap().pop_front() {
            return Err(error);
        }

        let model = request.model().unwrap_or_default().to_string();
        let method = request.model_method().unwrap_or_default().to_string();

        if let Some(reply) = self.replies.lock().unwrap().get(&(model.clone(), method.clone())) {
            return reply.clone();
        }

        match &self.handler {
            Some(handler) => handler(request),
            None => Err(RpcError::remote(format!(
                "Object {} doesn't exist or method {} is not available",
                model, method
            ))),
        }
    }
}

#[async_trait]
impl RpcTransport for StubTransport {
    fn endpoint(&self) -> &str {
        "stub://odoo/jsonrpc"
    }

    async fn call(&self, service: &str, method: &str, args: Vec<Value>) -> RpcResult<Value> {
        let request = RecordedRequest {
            service: service.to_string(),
            method: method.to_string(),
            args,
        };
        self.requests.lock().unwrap().push(request.clone());
        self.answer(&request)
    }
}
