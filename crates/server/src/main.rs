//! mcproxy - Minecraft reverse proxy
//!
//! Usage: `mcproxy [config.json]` (defaults to `mcproxy.json` in the working
//! directory). `RUST_LOG` overrides the configured log level.

use anyhow::Context;
use mcproxy_access::AccessRegistry;
use mcproxy_config::{ProxyConfig, DEFAULT_CONFIG_PATH};
use mcproxy_network::{NetworkConfig, ProxyServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Loaded before logging is up: the log level lives in the config
    let config = ProxyConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log_level in configuration")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 mcproxy starting up...");
    info!("📂 Configuration loaded from {}", path);
    config.display();

    let lists = AccessRegistry::from_sources(&config.lists, &config.list_files)
        .context("Failed to load access lists")?;

    let server = ProxyServer::bind(
        NetworkConfig::from(&config),
        config.services.clone(),
        Arc::new(lists),
    )
    .await?;

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down");
        shutdown.cancel();
    });

    info!("📡 Ready to accept connections");

    if let Err(e) = server.run().await {
        error!("💥 Proxy error: {}", e);
        return Err(e.into());
    }

    info!("👋 mcproxy stopped");
    Ok(())
}
