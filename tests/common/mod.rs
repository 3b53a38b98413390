//! Shared utilities for integration testing.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use torrentd::engine::StubEngine;
use torrentd::lifecycle::{boot, BootOptions, Daemon};

/// Write a settings file whose directories are confined to `dir`.
pub fn write_settings(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("torrentd.toml");
    let content = format!(
        "download_directory = \"{}\"\nwatch_directory = \"{}\"\n",
        dir.path().join("downloads").display(),
        dir.path().join("torrents").display(),
    );
    std::fs::write(&path, content).unwrap();
    path
}

/// Boot options confined to `dir`, with the disk preflight effectively off.
pub fn options_in(dir: &TempDir) -> BootOptions {
    BootOptions {
        config_path: write_settings(dir),
        proxy_url: None,
        min_free_bytes: 0,
    }
}

/// Boot a daemon confined to `dir`, returning the engine stub with it.
#[allow(dead_code)]
pub async fn boot_in(dir: &TempDir) -> (Daemon, Arc<StubEngine>) {
    let engine = Arc::new(StubEngine::new());
    let daemon = boot(options_in(dir), engine.clone()).await.unwrap();
    (daemon, engine)
}
