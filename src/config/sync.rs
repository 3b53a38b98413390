//! Persistence of configuration deltas.
//!
//! # Responsibilities
//! - Stage a `set` for every field that differs between two snapshots
//! - Record one change-log line per field (field, old value, new value)
//! - Flush the store to its backing file in a single durable write
//!
//! # Design Decisions
//! - Only changed keys are staged; an identical pair touches neither the
//!   store nor the file
//! - The durable write happens before the caller advances its in-memory
//!   active snapshot (write-ahead); on failure the caller retries with the
//!   previous snapshot still active

use crate::config::diff::FIELDS;
use crate::config::schema::EngineConfig;
use crate::config::store::{SettingsStore, StoreError};

/// Stage every differing field into the store, log the change, and flush.
///
/// Returns the staged field names in settings-file order. A flush failure
/// propagates; the caller must not advance its active configuration.
pub fn sync_store(
    old: &EngineConfig,
    new: &EngineConfig,
    store: &mut SettingsStore,
) -> Result<Vec<&'static str>, StoreError> {
    let mut staged = Vec::new();
    for field in FIELDS {
        let old_value = field.value(old);
        let new_value = field.value(new);
        if old_value != new_value {
            tracing::info!(field = field.name, old = %old_value, new = %new_value, "config updated");
            store.set(field.name, new_value);
            staged.push(field.name);
        }
    }
    if !staged.is_empty() {
        store.flush()?;
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::diff::{classify, Action};
    use std::fs;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SettingsStore {
        SettingsStore::load_or_default(&dir.path().join("torrentd.toml")).unwrap()
    }

    #[test]
    fn test_identical_snapshots_stage_nothing() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let config = EngineConfig::default();

        let staged = sync_store(&config, &config.clone(), &mut store).unwrap();
        assert!(staged.is_empty());
        // no flush: the file was never created
        assert!(!store.file_exists());
    }

    #[test]
    fn test_stages_exactly_the_changed_fields() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let mut old = EngineConfig::default();
        old.watch_directory = "/a".to_string();
        old.download_rate = String::new();
        let mut new = old.clone();
        new.watch_directory = "/b".to_string();
        new.download_rate = "low".to_string();

        let staged = sync_store(&old, &new, &mut store).unwrap();
        assert_eq!(staged, vec!["watch_directory", "download_rate"]);

        let actions = classify(&old, &new);
        assert!(actions.contains(Action::NeedRestartWatch));
        assert!(actions.contains(Action::NeedEngineReconfig));
        assert_eq!(actions.iter().count(), 2);
    }

    #[test]
    fn test_changes_reach_the_backing_file() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let old = EngineConfig::default();
        let mut new = old.clone();
        new.incoming_port = 51413;

        sync_store(&old, &new, &mut store).unwrap();

        let content = fs::read_to_string(store.config_file_used()).unwrap();
        assert!(content.contains("incoming_port = 51413"), "{content}");

        let reloaded = SettingsStore::load_or_default(store.config_file_used()).unwrap();
        assert_eq!(reloaded.to_config().unwrap().incoming_port, 51413);
    }

    #[test]
    fn test_flush_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let mut store =
            SettingsStore::load_or_default(&dir.path().join("gone").join("torrentd.toml"))
                .unwrap();

        let old = EngineConfig::default();
        let mut new = old.clone();
        new.incoming_port = 51413;

        assert!(matches!(
            sync_store(&old, &new, &mut store),
            Err(StoreError::Io(_))
        ));
    }
}
