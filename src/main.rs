//! torrentd daemon entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torrentd::config::{EngineConfig, SettingsStore};
use torrentd::engine::StubEngine;
use torrentd::lifecycle::signals::{self, ReloadSignal};
use torrentd::lifecycle::{boot, BootOptions, Daemon, Shutdown};
use torrentd::storage::MIN_FREE_SPACE;

/// Self-hosted torrent daemon.
#[derive(Parser)]
#[command(name = "torrentd", version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "torrentd.toml")]
    config: PathBuf,

    /// Proxy URL applied when the configuration does not set one
    #[arg(long, env = "PROXY_URL")]
    proxy_url: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

enum Tick {
    Shutdown,
    Reload,
    Torrent(Option<PathBuf>),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "torrentd=debug" } else { "torrentd=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("torrentd v{} starting", env!("CARGO_PKG_VERSION"));

    // The piece/peer engine is out of tree; the stub records what the
    // lifecycle pushes into it.
    let engine = Arc::new(StubEngine::new());
    let mut daemon = boot(
        BootOptions {
            config_path: cli.config.clone(),
            proxy_url: cli.proxy_url.clone(),
            min_free_bytes: MIN_FREE_SPACE,
        },
        engine,
    )
    .await?;

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            signals::shutdown_signal().await;
            tracing::info!("shutdown signal received");
            shutdown.trigger();
        });
    }

    let mut reload = ReloadSignal::new()?;
    let mut shutdown_rx = shutdown.subscribe();

    loop {
        let tick = tokio::select! {
            _ = shutdown_rx.recv() => Tick::Shutdown,
            _ = reload.recv() => Tick::Reload,
            event = daemon.torrents.recv() => Tick::Torrent(event),
        };

        match tick {
            Tick::Shutdown => break,
            Tick::Reload => reload_config(&cli.config, &mut daemon).await,
            Tick::Torrent(Some(path)) => {
                tracing::info!(path = ?path, "torrent file queued for the engine");
            }
            Tick::Torrent(None) => {
                tracing::warn!("watch directory watcher stopped");
                break;
            }
        }
    }

    daemon.shutdown().await;
    tracing::info!("shutdown complete");
    Ok(())
}

/// SIGHUP: re-read the settings file and reconcile it as a candidate.
/// Any failure keeps the current configuration.
async fn reload_config(path: &Path, daemon: &mut Daemon) {
    let candidate: Result<EngineConfig, _> =
        SettingsStore::load_or_default(path).and_then(|store| store.to_config());
    match candidate {
        Ok(candidate) => match daemon.apply(candidate).await {
            Ok(actions) => tracing::info!(?actions, "configuration reloaded"),
            Err(err) => {
                tracing::error!(%err, "reload rejected, keeping current configuration");
            }
        },
        Err(err) => {
            tracing::error!(%err, "failed to re-read config file, keeping current configuration");
        }
    }
}
