//! tunedex - media catalog indexer and query service
//!
//! `tunedex --scan` ingests the music directory into the catalog and exits.
//! Without `--scan` it serves the catalog and the files over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunedex::services::{FileScanner, IngestWorkerPool, PathNormalizer};
use tunedex::{build_router, AppState, Catalog};
use tunedex_common::config::{CliOverrides, Settings, TomlConfig};

/// Command-line arguments for tunedex
#[derive(Parser, Debug)]
#[command(name = "tunedex")]
#[command(about = "Media catalog indexer and query service")]
#[command(version)]
struct Args {
    /// Scan the music directory into the catalog, then exit
    #[arg(long)]
    scan: bool,

    /// Directory to scan and serve
    #[arg(short, long, env = "TUNEDEX_MUSIC_DIR")]
    music_dir: Option<PathBuf>,

    /// SQLite catalog file
    #[arg(short, long, env = "TUNEDEX_DATABASE")]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "TUNEDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "TUNEDEX_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TUNEDEX_PORT")]
    port: Option<u16>,

    /// Files processed in parallel during a scan
    #[arg(long, env = "TUNEDEX_CONCURRENCY")]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (toml_config, config_source) = TomlConfig::discover(args.config.as_deref())?;
    let settings = Settings::resolve(
        CliOverrides {
            music_dir: args.music_dir,
            database: args.database,
            host: args.host,
            port: args.port,
            concurrency: args.concurrency,
        },
        toml_config,
    )?;

    // Initialize tracing (RUST_LOG wins over the configured level)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting tunedex v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();
    info!("Music directory: {}", settings.music_dir.display());
    info!("Database path: {}", settings.database.display());

    let catalog = Catalog::open(&settings.database)
        .await
        .context("Failed to open catalog")?;
    info!("✓ Catalog ready ({})", catalog_summary(&catalog).await);

    if args.scan {
        run_scan(&settings, catalog).await
    } else {
        serve(&settings, catalog).await
    }
}

/// Record count for the startup log; a failed count is reported, never fatal
async fn catalog_summary(catalog: &Catalog) -> String {
    match catalog.count().await {
        Ok(count) => format!("{} records", count),
        Err(e) => {
            warn!("Could not count catalog records: {}", e);
            "record count unavailable".to_string()
        }
    }
}

/// Ingest the music directory, exiting when the scan finishes or is interrupted
async fn run_scan(settings: &Settings, catalog: Catalog) -> Result<()> {
    let normalizer = PathNormalizer::new(&settings.music_dir, &settings.static_prefix);
    let mut pool = IngestWorkerPool::new(catalog, normalizer)
        .with_scanner(FileScanner::new().follow_links(settings.follow_links));
    if let Some(concurrency) = settings.concurrency {
        pool = pool.with_concurrency(concurrency);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, finishing in-flight files");
            on_interrupt.cancel();
        }
    });

    let report = pool.scan(cancel).await.context("Scan failed")?;

    if report.cancelled {
        warn!(
            "Scan interrupted: {} of {} discovered files ingested",
            report.ingested, report.discovered
        );
    } else {
        info!(
            "✓ Scan complete: {} ingested ({} without tags), {} skipped, {} failed",
            report.ingested, report.untagged, report.skipped, report.failed
        );
    }

    Ok(())
}

/// Serve the catalog API and the static files until shutdown
async fn serve(settings: &Settings, catalog: Catalog) -> Result<()> {
    let normalizer = PathNormalizer::new(&settings.music_dir, &settings.static_prefix);
    let app = build_router(
        AppState::new(catalog),
        &settings.music_dir,
        normalizer.prefix(),
    );

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", settings.host, settings.port))?;

    info!("Listening on http://{}", listener.local_addr()?);

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
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_summary_counts_records() {
        let catalog = Catalog::in_memory().await.unwrap();
        assert_eq!(catalog_summary(&catalog).await, "0 records");
    }

    #[tokio::test]
    async fn test_catalog_summary_survives_storage_failure() {
        let catalog = Catalog::in_memory().await.unwrap();
        catalog.pool().close().await;
        assert_eq!(catalog_summary(&catalog).await, "record count unavailable");
    }
}
