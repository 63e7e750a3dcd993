//! Render proxy server binary.
//!
//! Configuration is environment-driven (see `config`); the only endpoints are
//! `GET /render?url=...` and `GET /health`.

use anyhow::{Context, Result};
use render_proxy::{app, default_rules, AppState, ChromiumLauncher, Config};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    if config.allowed_domains.is_empty() {
        // Not fatal - the service runs, but fail-closed means it denies all.
        info!("ALLOWED_DOMAINS is empty, every render request will be denied");
    }

    let state = Arc::new(AppState {
        allowed_domains: config.allowed_domains.clone(),
        rules: default_rules(),
        settings: config.engine_settings(),
        launcher: Box::new(ChromiumLauncher),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(port = config.port, "server running");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;

    Ok(())
}
