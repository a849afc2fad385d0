//! tunedex-sd (Search & Discovery) - Main entry point
//!
//! Serves the music catalog search API: fuzzy matching over chunk-loaded
//! datasets, raw catalog paging, play-session tracking, and an SSE event
//! stream.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunedex_common::config::{resolve_config, ConfigOverrides};
use tunedex_common::events::EventBus;
use tunedex_sd::catalog::{select_source, Catalog, ChunkStore};
use tunedex_sd::tracker::TrackerRegistry;
use tunedex_sd::{build_router, db, AppState};

/// Command-line arguments for tunedex-sd
#[derive(Parser, Debug)]
#[command(name = "tunedex-sd")]
#[command(about = "Search & Discovery microservice for tunedex")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Base URL serving catalog data (selects HTTP fetching)
    #[arg(long)]
    data_url: Option<String>,

    /// Local folder holding catalog data (selects filesystem reads)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Play-history database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Seconds between play-tracking heartbeats
    #[arg(long)]
    heartbeat_secs: Option<u64>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunedex_sd=debug,tunedex_common=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting tunedex Search & Discovery v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse command-line arguments, then resolve against env, config
    // file, and defaults
    let args = Args::parse();
    let config = resolve_config(&ConfigOverrides {
        port: args.port,
        data_url: args.data_url,
        data_dir: args.data_dir,
        database_path: args.database,
        heartbeat_secs: args.heartbeat_secs,
        config_path: args.config,
    })
    .context("Failed to resolve configuration")?;

    let pool = db::connect(&config.database_path)
        .await
        .context("Failed to open play-history database")?;

    let source = select_source(&config.data).context("Failed to create data source")?;
    info!("Catalog data source: {}", source.describe());

    let bus = EventBus::new(256);
    let catalog = Arc::new(Catalog::new(ChunkStore::new(source), bus.clone()));
    let trackers = Arc::new(TrackerRegistry::new(
        pool.clone(),
        bus.clone(),
        Duration::from_secs(config.heartbeat_secs),
    ));

    let state = AppState::new(catalog, trackers, pool, bus);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
