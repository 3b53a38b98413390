//! Filesystem concerns: directory canonicalization and disk preflight.
//!
//! # Responsibilities
//! - Resolve configured directories to absolute, cleaned paths
//! - Report whether normalization changed a path (callers persist the fix)
//! - Verify free space on the download volume before the engine starts
//!
//! # Design Decisions
//! - Normalization is lexical (no symlink resolution, no disk I/O beyond
//!   reading the working directory)
//! - An unresolvable working directory is an error, never a silent default
//! - The disk check runs once at startup and is fatal; it is not part of
//!   hot reconfiguration

use std::env;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::config::schema::EngineConfig;

/// Minimum free bytes required on the download volume at startup.
pub const MIN_FREE_SPACE: u64 = 100 * 1024 * 1024;

/// Errors from path normalization and the disk preflight.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The path could not be resolved to an absolute form.
    #[error("invalid path {path}: {source}")]
    PathResolution {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The volume could not be queried for free space.
    #[error("disk stat failed for {path}: {source}")]
    DiskStat {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Free space on the volume is below the required minimum.
    #[error("not enough disk space on {path}: {available} bytes available, {required} required")]
    InsufficientSpace {
        path: String,
        available: u64,
        required: u64,
    },
}

/// Resolve a configured directory to an absolute, cleaned form.
///
/// An empty path is a no-op. `changed` is true iff the canonical form
/// differs textually from the input.
pub fn normalize_dir(path: &str) -> Result<(String, bool), StorageError> {
    if path.is_empty() {
        return Ok((String::new(), false));
    }
    let raw = Path::new(path);
    let absolute = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        let cwd = env::current_dir().map_err(|source| StorageError::PathResolution {
            path: path.to_string(),
            source,
        })?;
        cwd.join(raw)
    };
    let canonical = clean(&absolute).to_string_lossy().into_owned();
    let changed = canonical != path;
    Ok((canonical, changed))
}

/// Canonicalize the directory fields of a configuration in place.
///
/// Returns whether any field changed, so the caller can persist the fix.
pub fn normalize_config_dirs(config: &mut EngineConfig) -> Result<bool, StorageError> {
    let mut changed = false;

    let (download, download_changed) = normalize_dir(&config.download_directory)?;
    if download_changed {
        config.download_directory = download;
        changed = true;
    }

    let (watch, watch_changed) = normalize_dir(&config.watch_directory)?;
    if watch_changed {
        config.watch_directory = watch;
        changed = true;
    }

    Ok(changed)
}

/// Query available free space on the volume holding `path`.
///
/// Fails with [`StorageError::InsufficientSpace`] when below `required`.
pub fn check_disk_space(path: &Path, required: u64) -> Result<u64, StorageError> {
    let available = fs2::available_space(path).map_err(|source| StorageError::DiskStat {
        path: path.display().to_string(),
        source,
    })?;
    if available < required {
        return Err(StorageError::InsufficientSpace {
            path: path.display().to_string(),
            available,
            required,
        });
    }
    Ok(available)
}

/// Lexically clean a path: drop `.` components, resolve `..` against the
/// accumulated prefix. Callers pass absolute paths, so `..` never escapes
/// the root.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
