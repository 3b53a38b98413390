//! Watch-directory monitoring.
//!
//! Watches the configured directory for dropped `.torrent` files and
//! forwards their paths to the lifecycle. This is the subsystem the
//! `NeedRestartWatch` action restarts: the old handle is dropped and a new
//! watcher is spawned on the new directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A running watch on one directory. Dropping the handle stops the watch.
pub struct WatchHandle {
    // kept alive for its side effect; dropping unregisters the watch
    _watcher: RecommendedWatcher,
    dir: PathBuf,
}

impl WatchHandle {
    /// Directory this handle is watching.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Start watching `dir` for new `.torrent` files.
///
/// Returns the handle and a receiver of created torrent-file paths.
pub fn spawn(dir: &Path) -> Result<(WatchHandle, mpsc::UnboundedReceiver<PathBuf>), notify::Error> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.kind.is_create() {
                    for path in event.paths {
                        if is_torrent_file(&path) {
                            tracing::info!(path = ?path, "torrent file detected");
                            let _ = tx.send(path);
                        }
                    }
                }
            }
            Err(e) => tracing::error!("watch error: {:?}", e),
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    tracing::info!(dir = ?dir, "watch directory watcher started");

    Ok((WatchHandle { _watcher: watcher, dir: dir.to_path_buf() }, rx))
}

fn is_torrent_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("torrent"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_torrent_file_filter() {
        assert!(is_torrent_file(Path::new("/tmp/ubuntu.torrent")));
        assert!(is_torrent_file(Path::new("/tmp/UBUNTU.TORRENT")));
        assert!(!is_torrent_file(Path::new("/tmp/ubuntu.iso")));
        assert!(!is_torrent_file(Path::new("/tmp/torrent")));
        assert!(!is_torrent_file(Path::new("/tmp/notes.txt")));
    }

    #[tokio::test]
    async fn test_watch_on_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(spawn(&dir.path().join("missing")).is_err());
    }

    #[tokio::test]
    async fn test_created_torrent_files_are_reported() {
        let dir = TempDir::new().unwrap();
        let (_handle, mut rx) = spawn(dir.path()).unwrap();

        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        fs::write(dir.path().join("ubuntu.torrent"), b"d8:announce0:e").unwrap();

        let received = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("watcher event within timeout")
            .expect("channel open");
        assert_eq!(received.file_name().unwrap(), "ubuntu.torrent");
    }
}
