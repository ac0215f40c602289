use crate::api::{AppState, build_router};
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use tracing::info;

/// Binds the HTTP API and serves it until the process is stopped.
pub async fn serve(config: &AppConfig, port_override: Option<u16>) -> Result<()> {
    let state = AppState::from_config(config)?;
    let router = build_router(state);

    let port = port_override.unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Could not bind to {addr}"))?;
    info!("Dashboard API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router).await.context("Server error")
}
