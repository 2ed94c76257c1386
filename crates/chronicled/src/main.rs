//! # chronicled
//!
//! Chronicle server binary — loads configuration, opens the event store,
//! and serves the HTTP API until interrupted.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chronicle_server::{load_config, router, AppState};
use chronicle_store::{ConnectionConfig, EventStore};

/// Chronicle change-event tracking server.
#[derive(Parser, Debug)]
#[command(name = "chronicled", about = "Chronicle change-event tracking server")]
struct Cli {
    /// Host to bind (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` event database (overrides config).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db_path) = cli.db_path {
        config.storage.db_path = db_path.display().to_string();
    }

    ensure_parent_dir(Path::new(&config.storage.db_path))?;
    let store = EventStore::open(
        &config.storage.db_path,
        &ConnectionConfig {
            pool_size: config.storage.pool_size,
            busy_timeout_ms: config.storage.busy_timeout_ms,
        },
    )
    .context("Failed to open event store")?;
    tracing::info!(db_path = %config.storage.db_path, "event store ready");

    let app = router(AppState::new(Arc::new(store)));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "chronicle listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve when ctrl-c arrives.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
