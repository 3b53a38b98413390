//! Startup orchestration and action application.
//!
//! # Responsibilities
//! - Bring the daemon from a settings file to a running state
//! - Apply the action set produced by reconciliation
//!
//! # Design Decisions
//! - Subsystems initialize in dependency order, not concurrently
//! - Directory fixes discovered at boot are persisted back to the file
//! - The disk preflight runs once here; it is not part of hot reload

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use toml::Value;

use crate::config::diff::{Action, ActionSet};
use crate::config::manager::{ConfigManager, ReconcileError};
use crate::config::schema::EngineConfig;
use crate::config::store::{SettingsStore, StoreError};
use crate::engine::{EngineError, TransferEngine};
use crate::storage::{check_disk_space, normalize_config_dirs, StorageError, MIN_FREE_SPACE};
use crate::watch::{self, WatchHandle};

/// Boot parameters supplied by the binary.
pub struct BootOptions {
    /// Settings file path.
    pub config_path: PathBuf,
    /// Proxy URL applied when the settings do not define one.
    pub proxy_url: Option<String>,
    /// Free bytes required on the download volume.
    pub min_free_bytes: u64,
}

impl Default for BootOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("torrentd.toml"),
            proxy_url: None,
            min_free_bytes: MIN_FREE_SPACE,
        }
    }
}

/// Fatal startup error.
#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("watch directory watcher: {0}")]
    Watch(#[from] notify::Error),
    #[error("creating configured directories: {0}")]
    Io(#[from] std::io::Error),
}

/// Error applying a reconciled configuration.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("restarting watch directory watcher: {0}")]
    Watch(#[from] notify::Error),
    #[error("creating watch directory: {0}")]
    Io(#[from] std::io::Error),
}

/// A booted daemon: active configuration plus the subsystems the action
/// set drives.
pub struct Daemon {
    manager: Arc<ConfigManager>,
    engine: Arc<dyn TransferEngine>,
    watch: Option<WatchHandle>,
    /// Paths of `.torrent` files dropped into the watch directory.
    pub torrents: mpsc::UnboundedReceiver<PathBuf>,
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("watch", &self.watch.is_some())
            .finish_non_exhaustive()
    }
}

/// Bring the daemon up from the settings file.
///
/// Order follows the dependency chain: settings → directories → disk
/// preflight → engine → watcher. Any failure aborts the boot.
pub async fn boot(
    opts: BootOptions,
    engine: Arc<dyn TransferEngine>,
) -> Result<Daemon, BootError> {
    let mut store = SettingsStore::load_or_default(&opts.config_path)?;
    let mut config = store.to_config()?;

    if config.proxy_url.is_empty() {
        if let Some(proxy) = opts.proxy_url.as_deref() {
            config.proxy_url = proxy.to_string();
            store.set("proxy_url", Value::String(proxy.to_string()));
        }
    }

    let dirs_changed = normalize_config_dirs(&mut config)?;
    if dirs_changed {
        store.set(
            "download_directory",
            Value::String(config.download_directory.clone()),
        );
        store.set(
            "watch_directory",
            Value::String(config.watch_directory.clone()),
        );
    }

    std::fs::create_dir_all(&config.download_directory)?;
    std::fs::create_dir_all(&config.watch_directory)?;

    let available = check_disk_space(Path::new(&config.download_directory), opts.min_free_bytes)?;
    tracing::debug!(available, "download volume preflight passed");

    // downgrade any bogus throttle strings before the engine sees them
    let _ = config.upload_limiter();
    let _ = config.download_limiter();

    engine.configure(&config)?;

    if !store.file_exists() || dirs_changed {
        store.flush()?;
        tracing::info!(path = ?store.config_file_used(), "config file written");
    }
    tracing::info!(path = ?store.config_file_used(), "configuration loaded");

    let (watch, torrents) = watch::spawn(Path::new(&config.watch_directory))?;

    Ok(Daemon {
        manager: Arc::new(ConfigManager::new(store, config)),
        engine,
        watch: Some(watch),
        torrents,
    })
}

impl Daemon {
    /// The reconciliation orchestrator, for read access and direct
    /// reconcile calls.
    pub fn manager(&self) -> Arc<ConfigManager> {
        Arc::clone(&self.manager)
    }

    /// Directory currently being watched, if the watcher is running.
    pub fn watch_dir(&self) -> Option<&Path> {
        self.watch.as_ref().map(WatchHandle::dir)
    }

    /// Reconcile a candidate configuration and apply the resulting actions.
    ///
    /// On reconcile failure nothing changes. Once the candidate is active,
    /// the engine is reconfigured and the watcher restarted as required;
    /// a tracker refetch is announced for the outer layer to perform.
    pub async fn apply(&mut self, candidate: EngineConfig) -> Result<ActionSet, ApplyError> {
        let actions = self.manager.reconcile(candidate).await?;
        let active = self.manager.active();

        if actions.contains(Action::NeedEngineReconfig) {
            self.engine.configure(&active)?;
            tracing::info!("engine reconfigured");
        }

        if actions.contains(Action::NeedRestartWatch) {
            // drop the old watch before registering the new one
            self.watch = None;
            std::fs::create_dir_all(&active.watch_directory)?;
            let (watch, torrents) = watch::spawn(Path::new(&active.watch_directory))?;
            self.watch = Some(watch);
            self.torrents = torrents;
            tracing::info!(dir = %active.watch_directory, "watch directory watcher restarted");
        }

        if actions.contains(Action::NeedUpdateTracker) {
            tracing::info!(url = %active.tracker_list_url, "tracker list changed, refetch required");
        }

        Ok(actions)
    }

    /// Flush settings on the way out. Errors are logged, not returned;
    /// shutdown proceeds regardless.
    pub async fn shutdown(&self) {
        if let Err(err) = self.manager.flush().await {
            tracing::error!(%err, "failed to flush settings on shutdown");
        }
    }
}
