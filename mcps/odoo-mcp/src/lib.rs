//! Odoo MCP - an Odoo ERP behind the Model Context Protocol
//!
//! Tools come in two layers:
//!
//! - **Generic**: any `model.method` call plus search/count/read/create/
//!   update/delete on any model
//! - **Business**: sales, purchase, inventory, accounting and product cost
//!   tools that validate their input and shape replies for a client
//!
//! Every tool replies with a [`ToolEnvelope`]. All calls go through one
//! shared [`odoo_rpc::Gateway`], so a process holds a single backend login.
//!
//! # Example
//!
//! ```rust,ignore
//! use odoo_mcp::{Config, OdooMcpServer};
//!
//! let config = Config::load(None)?;
//! let gateway = Gateway::connect(config.odoo.credentials(), config.odoo.timeout(), false)?;
//! let server = OdooMcpServer::new(Arc::new(gateway));
//! ```

pub mod config;
pub mod envelope;
pub mod handlers;
pub mod logging;
pub mod params;
pub mod serve;
pub mod server;
pub mod validate;

pub use config::Config;
pub use envelope::{ToolEnvelope, ToolError, ToolResult};
pub use params::*;
pub use server::OdooMcpServer;
