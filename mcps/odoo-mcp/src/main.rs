//! Odoo MCP Server
//!
//! Exposes an Odoo ERP to MCP clients over stdio or streamable HTTP.
//!
//! # Configuration
//! Set `ODOO_URL`, `ODOO_DB`, `ODOO_USERNAME` and `ODOO_PASSWORD`, or
//! configure them in `~/.config/odoo-mcp/config.toml`. Command line flags
//! win over both.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use odoo_mcp::config::{Config, TransportMode};
use odoo_mcp::logging::init_tracing;
use odoo_mcp::serve::{serve_http, serve_stdio};
use odoo_mcp::OdooMcpServer;
use odoo_rpc::Gateway;

#[derive(Parser)]
#[command(name = "odoo-mcp")]
#[command(about = "MCP server for Odoo ERP")]
struct Cli {
    /// Config file (TOML, or JSON with a .json extension)
    #[arg(short, long, env = "ODOO_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Transport to serve on
    #[arg(short, long, value_enum)]
    transport: Option<TransportMode>,

    /// Listen host for the HTTP transport
    #[arg(long)]
    host: Option<String>,

    /// Listen port for the HTTP transport
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(transport) = cli.transport {
        config.server.transport = transport;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;

    init_tracing(&config.server.log_level)?;

    tracing::info!("Starting Odoo MCP Server");
    match &config.source {
        Some(path) => tracing::info!("Loaded config from: {}", path.display()),
        None => tracing::info!("No config file found, using environment only"),
    }
    tracing::debug!(config = %config.redacted(), "effective configuration");

    let gateway = Gateway::connect(
        config.odoo.credentials(),
        config.odoo.timeout(),
        config.odoo.verify_ssl,
    )
    .context("failed to set up Odoo client")?;
    tracing::info!(
        "Odoo endpoint: {} (database {})",
        gateway.endpoint(),
        config.odoo.database
    );

    let server = OdooMcpServer::new(Arc::new(gateway));

    match config.server.transport {
        TransportMode::Stdio => serve_stdio(server).await?,
        TransportMode::Http => serve_http(server, &config.server.host, config.server.port).await?,
    }

    tracing::info!("Server shutting down");
    Ok(())
}
