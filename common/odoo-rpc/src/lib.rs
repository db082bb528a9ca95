//! Odoo RPC - generic gateway to an Odoo backend
//!
//! This crate owns everything between a typed tool and the wire:
//!
//! - **Session**: one lazily established, shared login per process, replaced
//!   wholesale when the backend reports it as expired or rejected
//! - **Gateway**: `call`/`dispatch` for any `model.method(*args, **kwargs)`
//!   plus typed helpers (`search_read`, `create`, ...)
//! - **Shaping**: safety defaults that keep generic reads bounded
//! - **Errors**: the [`RpcError`] fault taxonomy every caller sees
//! - **Transport**: the [`RpcTransport`] seam and its JSON-RPC implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use odoo_rpc::{Credentials, Domain, Gateway, SearchReadOptions};
//!
//! let gateway = Gateway::connect(credentials, Duration::from_secs(60), false)?;
//!
//! let partners = gateway
//!     .search_read(
//!         "res.partner",
//!         Domain::new().condition("is_company", "=", true),
//!         SearchReadOptions::fields(["name", "email"]).limit(10),
//!     )
//!     .await?;
//! ```

pub mod domain;
pub mod error;
pub mod gateway;
pub mod session;
pub mod shaping;
pub mod transport;
pub mod value;

#[cfg(any(test, feature = "stub"))]
pub mod stub;

pub use domain::{Domain, Term};
pub use error::{RpcError, RpcResult};
pub use gateway::{Gateway, SearchReadOptions};
pub use session::{Credentials, Session, SessionManager};
pub use shaping::{FieldsRequest, Shaping, DEFAULT_FIELDS, DEFAULT_LIMIT};
pub use transport::{JsonRpcTransport, RpcTransport};
pub use value::{Kwargs, Value};
