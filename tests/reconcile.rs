//! End-to-end reconciliation tests: boot, hot changes, watcher restart,
//! forbidden changes, persistence.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use torrentd::config::{Action, EngineConfig, ReconcileError, SettingsStore};
use torrentd::engine::StubEngine;
use torrentd::lifecycle::{boot, ApplyError, BootError, BootOptions};
use torrentd::storage::StorageError;

mod common;

fn candidate_of(daemon: &torrentd::lifecycle::Daemon) -> EngineConfig {
    (*daemon.manager().active()).clone()
}

#[tokio::test]
async fn test_boot_prepares_directories_and_configures_engine() {
    let dir = TempDir::new().unwrap();
    let (daemon, engine) = common::boot_in(&dir).await;

    assert!(dir.path().join("downloads").is_dir());
    assert!(dir.path().join("torrents").is_dir());

    let applied = engine.last_applied().expect("engine configured at boot");
    assert_eq!(applied, *daemon.manager().active());
    assert_eq!(
        daemon.watch_dir().unwrap(),
        dir.path().join("torrents").as_path()
    );
}

#[tokio::test]
async fn test_boot_fails_on_insufficient_disk_space() {
    let dir = TempDir::new().unwrap();
    let mut opts = common::options_in(&dir);
    opts.min_free_bytes = u64::MAX;

    let err = boot(opts, Arc::new(StubEngine::new())).await.unwrap_err();
    assert!(matches!(
        err,
        BootError::Storage(StorageError::InsufficientSpace { .. })
    ));
}

#[tokio::test]
async fn test_hot_change_reconfigures_engine_and_persists() {
    let dir = TempDir::new().unwrap();
    let (mut daemon, engine) = common::boot_in(&dir).await;

    let mut candidate = candidate_of(&daemon);
    candidate.incoming_port = 51413;
    candidate.download_rate = "low".to_string();

    let actions = daemon.apply(candidate).await.unwrap();
    assert!(actions.contains(Action::NeedEngineReconfig));
    assert!(!actions.contains(Action::NeedRestartWatch));

    let applied = engine.last_applied().unwrap();
    assert_eq!(applied.incoming_port, 51413);
    assert_eq!(applied.download_rate, "low");

    let content = fs::read_to_string(dir.path().join("torrentd.toml")).unwrap();
    assert!(content.contains("incoming_port = 51413"), "{content}");
    assert!(content.contains("download_rate = \"low\""), "{content}");
}

#[tokio::test]
async fn test_watch_directory_change_restarts_watcher() {
    let dir = TempDir::new().unwrap();
    let (mut daemon, _engine) = common::boot_in(&dir).await;

    let new_watch = dir.path().join("incoming");
    let mut candidate = candidate_of(&daemon);
    candidate.watch_directory = new_watch.display().to_string();

    let actions = daemon.apply(candidate).await.unwrap();
    assert!(actions.contains(Action::NeedRestartWatch));
    assert_eq!(daemon.watch_dir().unwrap(), new_watch.as_path());

    // the restarted watcher reports drops into the new directory
    fs::write(new_watch.join("drop.torrent"), b"d8:announce0:e").unwrap();
    let received = tokio::time::timeout(Duration::from_secs(10), daemon.torrents.recv())
        .await
        .expect("watcher event within timeout")
        .expect("channel open");
    assert_eq!(received.file_name().unwrap(), "drop.torrent");
}

#[tokio::test]
async fn test_forbidden_change_is_rejected_whole() {
    let dir = TempDir::new().unwrap();
    let (mut daemon, engine) = common::boot_in(&dir).await;
    let before = candidate_of(&daemon);

    let mut candidate = before.clone();
    candidate.done_cmd = "/usr/bin/notify".to_string();
    candidate.incoming_port = 51413;

    let err = daemon.apply(candidate).await.unwrap_err();
    assert!(matches!(
        err,
        ApplyError::Reconcile(ReconcileError::ForbiddenChange)
    ));

    // nothing changed: not in memory, not on disk, not in the engine
    assert_eq!(*daemon.manager().active(), before);
    assert_eq!(engine.last_applied().unwrap(), before);
    let persisted = SettingsStore::load_or_default(&dir.path().join("torrentd.toml"))
        .unwrap()
        .to_config()
        .unwrap();
    assert_eq!(persisted.incoming_port, before.incoming_port);
    assert!(persisted.done_cmd.is_empty());
}

#[tokio::test]
async fn test_tracker_list_change_requests_refetch_only() {
    let dir = TempDir::new().unwrap();
    let (mut daemon, _engine) = common::boot_in(&dir).await;

    let mut candidate = candidate_of(&daemon);
    candidate.tracker_list_url = "https://example.com/trackers.txt".to_string();

    let actions = daemon.apply(candidate).await.unwrap();
    assert!(actions.contains(Action::NeedUpdateTracker));
    assert_eq!(actions.iter().count(), 1);
}

#[tokio::test]
async fn test_edited_file_reload_flows_through_apply() {
    let dir = TempDir::new().unwrap();
    let (mut daemon, engine) = common::boot_in(&dir).await;
    let path = dir.path().join("torrentd.toml");

    // simulate an operator edit followed by SIGHUP
    let mut persisted = SettingsStore::load_or_default(&path).unwrap();
    persisted.set("incoming_port", toml::Value::Integer(60000));
    persisted.flush().unwrap();

    let candidate = SettingsStore::load_or_default(&path)
        .unwrap()
        .to_config()
        .unwrap();
    let actions = daemon.apply(candidate).await.unwrap();
    assert!(actions.contains(Action::NeedEngineReconfig));
    assert_eq!(engine.last_applied().unwrap().incoming_port, 60000);
}

#[tokio::test]
async fn test_boot_normalizes_messy_directories_into_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("torrentd.toml");
    // redundant components, as a hand-written config might carry
    fs::write(
        &path,
        format!(
            "download_directory = \"{base}/./downloads\"\nwatch_directory = \"{base}/sub/../torrents\"\n",
            base = dir.path().display(),
        ),
    )
    .unwrap();

    let opts = BootOptions {
        config_path: path.clone(),
        proxy_url: None,
        min_free_bytes: 0,
    };
    let daemon = boot(opts, Arc::new(StubEngine::new())).await.unwrap();

    let active = daemon.manager().active();
    assert_eq!(
        Path::new(&active.download_directory),
        dir.path().join("downloads").as_path()
    );
    assert_eq!(
        Path::new(&active.watch_directory),
        dir.path().join("torrents").as_path()
    );

    // the fixed paths were persisted back to the file
    let persisted = SettingsStore::load_or_default(&path).unwrap().to_config().unwrap();
    assert_eq!(persisted.download_directory, active.download_directory);
    assert_eq!(persisted.watch_directory, active.watch_directory);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_boot_applies_cli_proxy_when_unset() {
    let dir = TempDir::new().unwrap();
    let mut opts = common::options_in(&dir);
    opts.proxy_url = Some("socks5://127.0.0.1:1080".to_string());

    let engine = Arc::new(StubEngine::new());
    let daemon = boot(opts, engine.clone()).await.unwrap();
    assert_eq!(daemon.manager().active().proxy_url, "socks5://127.0.0.1:1080");
}
