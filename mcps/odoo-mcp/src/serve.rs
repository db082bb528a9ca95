//! Transports the server can be exposed over

use std::net::SocketAddr;

use anyhow::{Context, Result};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use rmcp::{transport::stdio, ServiceExt};

use crate::server::OdooMcpServer;

/// Path the streamable HTTP endpoint is mounted at
pub const MCP_PATH: &str = "/mcp";

/// Serve one client over stdin/stdout until it disconnects
pub async fn serve_stdio(server: OdooMcpServer) -> Result<()> {
    let service = server.serve(stdio()).await?;

    tracing::info!("Server running on stdio, waiting for requests...");
    service.waiting().await?;

    Ok(())
}

/// Serve any number of clients over streamable HTTP until ctrl-c
///
/// Every HTTP session gets its own handler clone; all of them share the
/// server's gateway and therefore one backend login.
pub async fn serve_http(server: OdooMcpServer, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", host, port))?;

    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let app = axum::Router::new().nest_service(MCP_PATH, service);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}{}", addr, MCP_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for ctrl-c: {}", e);
            }
        })
        .await?;

    Ok(())
}
