//! Weather Proxy - A caching reverse proxy for the Open-Meteo API

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weather_proxy::{api::create_router, spawn_cleanup_task, AppState, Config};

/// Main entry point for the weather proxy.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Build the upstream client, cache and forwarder
/// 4. Start the optional background TTL cleanup task
/// 5. Serve the Axum router on the configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // RUST_LOG wins over LOG_LEVEL
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "weather_proxy={level},tower_http={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting weather proxy");
    info!(
        "Configuration loaded: upstream={}, timeout={:?}, cache_ttl={}s, cache_error_ttl={}s, cache_maxsize={}, retries={}, port={}",
        config.base_url,
        config.request_timeout,
        config.cache_ttl,
        config.cache_error_ttl,
        config.cache_max_entries,
        config.retry_attempts,
        config.server_port
    );

    let state = AppState::from_config(&config).context("failed to initialize forwarder")?;

    let cleanup_handle = spawn_cleanup_task(state.forwarder.cache(), config.cleanup_interval);
    if cleanup_handle.is_some() {
        info!("Background cleanup task started");
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
