//! D365 Customer Lookup custom handler
//!
//! Entry point for the Functions custom handler binary.
//! Serves the HTTP trigger on `FUNCTIONS_CUSTOMHANDLER_PORT`.

use anyhow::Context;
use d365_customer_lookup::auth::credential_from_config;
use d365_customer_lookup::config::Config;
use d365_customer_lookup::function::{create_router, CustomerLookupHandler};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting D365 customer lookup handler...");

    // Load configuration
    let config = Config::from_env().context("failed to load configuration")?;

    tracing::info!(
        "Configured for {} with scope {}",
        config.base_url,
        config.scope
    );

    // Initialize authentication
    let (kind, credential) = credential_from_config(&config, |key| std::env::var(key).ok());
    tracing::info!(credential = ?kind, "Credential selected");

    let handler = Arc::new(CustomerLookupHandler::new(&config, credential));
    let app = create_router(handler);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Handler stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
