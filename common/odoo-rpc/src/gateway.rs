//! RPC gateway
//!
//! The single call surface every tool goes through. `call` sends exactly one
//! `execute_kw` per invocation; `dispatch` is the generic entry point for
//! caller-chosen methods and applies the safety defaults first; the typed
//! helpers (`search_read`, `create`, ...) are thin wrappers over `call`.
//!
//! Nothing here retries. An authentication fault invalidates the session so
//! that the *next* call logs in again, and is then returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{RpcError, RpcResult};
use crate::session::{Credentials, Session, SessionManager};
use crate::shaping;
use crate::transport::{JsonRpcTransport, RpcTransport};
use crate::value::Kwargs;

/// Optional parameters of [`Gateway::search_read`]
///
/// `None` is left off the wire entirely so the backend applies its own
/// default. `fields: Some(vec![])` is sent as an explicit empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchReadOptions {
    pub fields: Option<Vec<String>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub order: Option<String>,
    pub context: Option<Kwargs>,
}

impl SearchReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that read the given fields
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn context(mut self, context: Kwargs) -> Self {
        self.context = Some(context);
        self
    }

    fn into_kwargs(self) -> Kwargs {
        let mut kwargs = Kwargs::new();
        if let Some(fields) = self.fields {
            kwargs.insert("fields".to_string(), Value::from(fields));
        }
        if let Some(limit) = self.limit {
            kwargs.insert("limit".to_string(), Value::from(limit));
        }
        if let Some(offset) = self.offset {
            kwargs.insert("offset".to_string(), Value::from(offset));
        }
        if let Some(order) = self.order {
            kwargs.insert("order".to_string(), Value::from(order));
        }
        if let Some(context) = self.context {
            kwargs.insert("context".to_string(), Value::Object(context));
        }
        kwargs
    }
}

/// Generic call surface over one backend
pub struct Gateway {
    transport: Arc<dyn RpcTransport>,
    sessions: SessionManager,
}

impl Gateway {
    pub fn new(transport: Arc<dyn RpcTransport>, credentials: Credentials) -> Self {
        Self {
            sessions: SessionManager::new(Arc::clone(&transport), credentials),
            transport,
        }
    }

    /// Gateway over the JSON-RPC endpoint of `credentials.url`
    pub fn connect(credentials: Credentials, timeout: Duration, verify_ssl: bool) -> RpcResult<Self> {
        let transport = JsonRpcTransport::new(&credentials.url, timeout, verify_ssl)?;
        Ok(Self::new(Arc::new(transport), credentials))
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Invoke `model.method(*args, **kwargs)` exactly as given
    #[instrument(skip(self, args, kwargs))]
    pub async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> RpcResult<Value> {
        let session = self.sessions.ensure_session().await?;

        let payload = vec![
            Value::from(session.database.as_str()),
            Value::from(session.uid),
            Value::from(session.token()),
            Value::from(model),
            Value::from(method),
            Value::Array(args),
            Value::Object(kwargs),
        ];

        match self.transport.call("object", "execute_kw", payload).await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.after_fault(&session, &err).await;
                Err(err)
            }
        }
    }

    /// Generic entry point for caller-chosen methods
    ///
    /// Same as [`call`](Self::call) after the safety defaults of
    /// [`shaping`](crate::shaping) have been applied to `kwargs`.
    pub async fn dispatch(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        mut kwargs: Kwargs,
    ) -> RpcResult<Value> {
        let shaping = shaping::apply(method, &args, &mut kwargs);
        if shaping.changed() {
            debug!(
                model,
                method,
                limit_injected = shaping.limit_injected,
                fields_injected = shaping.fields_injected,
                fields_request = ?shaping.fields_request,
                "applied safety defaults"
            );
        }
        self.call(model, method, args, kwargs).await
    }

    /// Search and read in one round trip
    pub async fn search_read(
        &self,
        model: &str,
        domain: impl Into<Value>,
        options: SearchReadOptions,
    ) -> RpcResult<Vec<Value>> {
        let reply = self
            .call(model, "search_read", vec![domain.into()], options.into_kwargs())
            .await?;
        expect_list(reply, model, "search_read")
    }

    /// Number of records matching `domain`
    pub async fn search_count(&self, model: &str, domain: impl Into<Value>) -> RpcResult<i64> {
        let reply = self
            .call(model, "search_count", vec![domain.into()], Kwargs::new())
            .await?;
        reply.as_i64().ok_or_else(|| {
            RpcError::Protocol(format!("{}.search_count returned {}", model, reply))
        })
    }

    /// Read `fields` of the records `ids`
    pub async fn read(&self, model: &str, ids: &[i64], fields: &[&str]) -> RpcResult<Vec<Value>> {
        self.read_in_context(model, ids, fields, None).await
    }

    /// [`read`](Self::read) with an evaluation context (location, date, ...)
    pub async fn read_in_context(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
        context: Option<Kwargs>,
    ) -> RpcResult<Vec<Value>> {
        let mut kwargs = Kwargs::new();
        if !fields.is_empty() {
            kwargs.insert("fields".to_string(), Value::from(fields.to_vec()));
        }
        if let Some(context) = context {
            kwargs.insert("context".to_string(), Value::Object(context));
        }
        let reply = self
            .call(model, "read", vec![Value::from(ids.to_vec())], kwargs)
            .await?;
        expect_list(reply, model, "read")
    }

    /// Create one record, returning its id
    pub async fn create(&self, model: &str, values: Kwargs) -> RpcResult<i64> {
        let reply = self
            .call(model, "create", vec![Value::Object(values)], Kwargs::new())
            .await?;
        // Newer servers answer a single create with a one-element id list.
        reply
            .as_i64()
            .or_else(|| match reply.as_array().map(Vec::as_slice) {
                Some([id]) => id.as_i64(),
                _ => None,
            })
            .ok_or_else(|| RpcError::Protocol(format!("{}.create returned {}", model, reply)))
    }

    /// Update `ids` with `values`
    pub async fn write(&self, model: &str, ids: &[i64], values: Kwargs) -> RpcResult<bool> {
        let reply = self
            .call(
                model,
                "write",
                vec![Value::from(ids.to_vec()), Value::Object(values)],
                Kwargs::new(),
            )
            .await?;
        Ok(reply.as_bool().unwrap_or(false))
    }

    /// Delete `ids`
    pub async fn unlink(&self, model: &str, ids: &[i64]) -> RpcResult<bool> {
        let reply = self
            .call(model, "unlink", vec![Value::from(ids.to_vec())], Kwargs::new())
            .await?;
        Ok(reply.as_bool().unwrap_or(false))
    }

    /// Fuzzy lookup by display name, as `(id, name)` pairs
    pub async fn name_search(
        &self,
        model: &str,
        name: &str,
        limit: u64,
    ) -> RpcResult<Vec<(i64, String)>> {
        let mut kwargs = Kwargs::new();
        kwargs.insert("name".to_string(), Value::from(name));
        kwargs.insert("limit".to_string(), Value::from(limit));

        let reply = self.call(model, "name_search", Vec::new(), kwargs).await?;
        expect_list(reply, model, "name_search")?
            .into_iter()
            .map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([id, name]) => match (id.as_i64(), name.as_str()) {
                    (Some(id), Some(name)) => Ok((id, name.to_string())),
                    _ => Err(RpcError::Protocol(format!("malformed name_search pair: {:?}", pair))),
                },
                _ => Err(RpcError::Protocol(format!("malformed name_search pair: {:?}", pair))),
            })
            .collect()
    }

    async fn after_fault(&self, session: &Session, err: &RpcError) {
        if err.is_authentication() {
            self.sessions.invalidate(session).await;
        }
        warn!(kind = err.kind(), error = %err, "backend call failed");
    }
}

fn expect_list(reply: Value, model: &str, method: &str) -> RpcResult<Vec<Value>> {
    match reply {
        Value::Array(items) => Ok(items),
        other => Err(RpcError::Protocol(format!(
            "{}.{} returned {} instead of a list",
            model, method, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::stub::{StubTransport, STUB_UID};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn gateway(stub: &Arc<StubTransport>) -> Gateway {
        Gateway::new(
            stub.clone(),
            Credentials::new("http://odoo.test", "prod", "admin", "secret"),
        )
    }

    fn kwargs(value: Value) -> Kwargs {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_call_sends_one_request_and_returns_reply_verbatim() {
        let reply = json!({"nested": [1, {"deep": true}]});
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "custom", Ok(reply.clone())));
        let gw = gateway(&stub);

        let result = gw
            .call("res.partner", "custom", vec![json!([1, 2])], kwargs(json!({"flag": true})))
            .await
            .unwrap();

        assert_eq!(result, reply);
        let calls = stub.model_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args[0], json!("prod"));
        assert_eq!(calls[0].args[1], json!(STUB_UID));
        assert_eq!(calls[0].positional(), &[json!([1, 2])]);
        assert_eq!(calls[0].kwargs(), kwargs(json!({"flag": true})));
    }

    #[tokio::test]
    async fn test_session_established_once_across_calls() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "search_count", Ok(json!(3))));
        let gw = gateway(&stub);

        for _ in 0..5 {
            gw.search_count("res.partner", Domain::new()).await.unwrap();
        }

        assert_eq!(stub.login_count(), 1);
        assert_eq!(stub.model_calls().len(), 5);
    }

    #[tokio::test]
    async fn test_dispatch_injects_defaults() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "search_read", Ok(json!([]))));
        let gw = gateway(&stub);

        assert_ok!(
            gw.dispatch(
                "res.partner",
                "search_read",
                Vec::new(),
                kwargs(json!({"domain": [["name", "=", "Acme"]]})),
            )
            .await
        );

        let sent = stub.model_calls()[0].kwargs();
        assert_eq!(sent["limit"], json!(100));
        assert_eq!(
            sent["fields"],
            json!(["id", "name", "display_name", "create_date", "write_date"])
        );
        assert_eq!(sent["domain"], json!([["name", "=", "Acme"]]));
    }

    #[tokio::test]
    async fn test_dispatch_respects_positional_fields_and_limit() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "search_read", Ok(json!([]))));
        let gw = gateway(&stub);

        assert_ok!(
            gw.dispatch(
                "res.partner",
                "search_read",
                vec![json!([]), json!(["email"]), json!(0), json!(5)],
                Kwargs::new(),
            )
            .await
        );

        let sent = &stub.model_calls()[0];
        assert_eq!(sent.positional(), &[json!([]), json!(["email"]), json!(0), json!(5)]);
        assert!(sent.kwargs().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_keeps_caller_limit() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "search", Ok(json!([1]))));
        let gw = gateway(&stub);

        assert_ok!(
            gw.dispatch("res.partner", "search", vec![json!([])], kwargs(json!({"limit": 7})))
                .await
        );

        assert_eq!(stub.model_calls()[0].kwargs()["limit"], json!(7));
    }

    #[tokio::test]
    async fn test_dispatch_respects_positional_search_limit() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "search", Ok(json!([1]))));
        let gw = gateway(&stub);

        assert_ok!(
            gw.dispatch("res.partner", "search", vec![json!([]), json!(0), json!(3)], Kwargs::new())
                .await
        );

        assert!(stub.model_calls()[0].kwargs().get("limit").is_none());
    }

    #[tokio::test]
    async fn test_typed_helpers_are_not_shaped() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "search_read", Ok(json!([]))));
        let gw = gateway(&stub);

        gw.search_read("res.partner", Domain::new(), SearchReadOptions::new())
            .await
            .unwrap();
        gw.search_read(
            "res.partner",
            Domain::new(),
            SearchReadOptions {
                fields: Some(Vec::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let calls = stub.model_calls();
        assert!(calls[0].kwargs().is_empty());
        assert_eq!(calls[1].kwargs(), kwargs(json!({"fields": []})));
    }

    #[tokio::test]
    async fn test_search_read_sends_only_given_options() {
        let stub = Arc::new(StubTransport::new().with_reply("sale.order", "search_read", Ok(json!([]))));
        let gw = gateway(&stub);

        gw.search_read(
            "sale.order",
            Domain::new().condition("state", "=", "sale"),
            SearchReadOptions::fields(["name"]).limit(20).offset(0).order("date_order desc"),
        )
        .await
        .unwrap();

        let call = &stub.model_calls()[0];
        assert_eq!(call.positional(), &[json!([["state", "=", "sale"]])]);
        assert_eq!(
            call.kwargs(),
            kwargs(json!({"fields": ["name"], "limit": 20, "offset": 0, "order": "date_order desc"}))
        );
    }

    #[tokio::test]
    async fn test_remote_fault_is_not_retried() {
        let stub = Arc::new(StubTransport::new().with_reply(
            "res.partner",
            "search_read",
            Err(RpcError::remote("Invalid field 'nmae' on model 'res.partner'")),
        ));
        let gw = gateway(&stub);

        let err = assert_err!(
            gw.search_read("res.partner", Domain::new(), SearchReadOptions::new())
                .await
        );

        assert_eq!(err.to_string(), "Invalid field 'nmae' on model 'res.partner'");
        assert_eq!(stub.model_calls().len(), 1);
        assert!(gw.sessions().current().await.is_some());
    }

    #[tokio::test]
    async fn test_authentication_fault_triggers_exactly_one_relogin() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "search_count", Ok(json!(1))));
        let gw = gateway(&stub);

        gw.search_count("res.partner", Domain::new()).await.unwrap();
        stub.inject_fault(RpcError::Authentication("Session expired".into()));

        let err = assert_err!(gw.search_count("res.partner", Domain::new()).await);
        assert!(err.is_authentication());
        assert_eq!(stub.login_count(), 1, "failed call must not re-login or replay");
        assert!(gw.sessions().current().await.is_none());

        gw.search_count("res.partner", Domain::new()).await.unwrap();
        gw.search_count("res.partner", Domain::new()).await.unwrap();
        assert_eq!(stub.login_count(), 2);
    }

    #[tokio::test]
    async fn test_non_list_search_read_is_protocol_error() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "search_read", Ok(json!({"oops": 1}))));
        let gw = gateway(&stub);

        let err = gw
            .search_read("res.partner", Domain::new(), SearchReadOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_create_accepts_id_or_single_id_list() {
        let stub = Arc::new(StubTransport::new().with_reply("res.partner", "create", Ok(json!(42))));
        let gw = gateway(&stub);
        assert_eq!(gw.create("res.partner", kwargs(json!({"name": "Acme"}))).await.unwrap(), 42);

        stub.set_reply("res.partner", "create", Ok(json!([43])));
        assert_eq!(gw.create("res.partner", kwargs(json!({"name": "Acme"}))).await.unwrap(), 43);
        assert_eq!(stub.model_calls()[0].positional(), &[json!({"name": "Acme"})]);
    }

    #[tokio::test]
    async fn test_name_search_pairs() {
        let stub = Arc::new(StubTransport::new().with_reply(
            "hr.employee",
            "name_search",
            Ok(json!([[1, "Ada Lovelace"], [4, "Ada Byron"]])),
        ));
        let gw = gateway(&stub);

        let pairs = gw.name_search("hr.employee", "Ada", 20).await.unwrap();
        assert_eq!(pairs, vec![(1, "Ada Lovelace".to_string()), (4, "Ada Byron".to_string())]);
        assert_eq!(stub.model_calls()[0].kwargs(), kwargs(json!({"name": "Ada", "limit": 20})));
    }

    #[tokio::test]
    async fn test_read_in_context_passes_context() {
        let stub = Arc::new(StubTransport::new().with_reply(
            "product.product",
            "read",
            Ok(json!([{"id": 5, "qty_available": 12.0}])),
        ));
        let gw = gateway(&stub);

        let records = gw
            .read_in_context(
                "product.product",
                &[5],
                &["qty_available"],
                Some(kwargs(json!({"location": 8}))),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        let call = &stub.model_calls()[0];
        assert_eq!(call.positional(), &[json!([5])]);
        assert_eq!(
            call.kwargs(),
            kwargs(json!({"fields": ["qty_available"], "context": {"location": 8}}))
        );
    }
}
