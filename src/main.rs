//! Tile Cache - A request-interception cache layer
//!
//! Runs the cache behind a small HTTP proxy endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_cache::api::create_router;
use tile_cache::cache::CacheStorage;
use tile_cache::{AppState, Config, FetchOrchestrator, GenerationManager, HttpNetwork};

/// Main entry point for the tile cache proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open cache storage and activate the generation (precache, purge older
///    generations)
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tile_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tile Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: generation={}, max_items={}, precache_urls={}, port={}",
        config.generation_label(),
        config.max_items,
        config.precache_urls.len(),
        config.server_port
    );

    let network = Arc::new(
        HttpNetwork::new(Duration::from_secs(config.fetch_timeout))
            .context("failed to build network client")?,
    );

    let storage = match &config.cache_dir {
        Some(dir) => CacheStorage::on_disk(dir)
            .await
            .with_context(|| format!("failed to open cache directory {}", dir.display()))?,
        None => {
            info!("CACHE_DIR is empty, keeping the cache in memory only");
            CacheStorage::new()
        }
    };
    let storage = Arc::new(storage);
    let generations = Arc::new(GenerationManager::new(storage, &config));
    let report = generations
        .activate(network.as_ref())
        .await
        .context("cache activation failed")?;
    for failure in &report.failures {
        warn!("Precache skipped {}: {}", failure.url, failure.reason);
    }

    let orchestrator = FetchOrchestrator::from_config(&config, generations.subscribe(), network);
    let app = create_router(AppState::new(orchestrator, generations));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
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
}
