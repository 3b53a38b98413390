//! Durable settings store backed by a TOML file.
//!
//! # Responsibilities
//! - Load the settings file, falling back to defaults when absent
//! - Expose key-level get/set staging for the sync pass
//! - Write the full table back to disk in one flush
//!
//! # Design Decisions
//! - The store is an injected handle, not process-wide state; the daemon
//!   owns exactly one and serializes writers around it
//! - Keys are the snake_case field names of `EngineConfig`, keeping the
//!   file hand-editable

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::value::Table;
use toml::Value;

use crate::config::schema::EngineConfig;

/// Error type for settings persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("settings encode: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// File-backed key-value store holding the persisted configuration.
pub struct SettingsStore {
    path: PathBuf,
    table: Table,
}

impl SettingsStore {
    /// Load the settings file at `path`, or start from defaults when the
    /// file does not exist. A malformed file is an error, not a reset.
    pub fn load_or_default(path: &Path) -> Result<Self, StoreError> {
        let table = if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            default_table()?
        };
        Ok(Self { path: path.to_path_buf(), table })
    }

    /// Value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.table.get(key)
    }

    /// Stage `value` under `key`. Nothing reaches disk until
    /// [`flush`](Self::flush).
    pub fn set(&mut self, key: &str, value: Value) {
        self.table.insert(key.to_string(), value);
    }

    /// Path of the backing file.
    pub fn config_file_used(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists on disk.
    pub fn file_exists(&self) -> bool {
        self.path.exists()
    }

    /// Serialize the table to `path` as TOML.
    pub fn write_as(&self, path: &Path) -> Result<(), StoreError> {
        let rendered = toml::to_string_pretty(&self.table)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    /// Durably write the table to the backing file.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.write_as(&self.path)
    }

    /// Deserialize the table into a configuration snapshot. Missing keys
    /// take their schema defaults.
    pub fn to_config(&self) -> Result<EngineConfig, StoreError> {
        let config = Value::Table(self.table.clone()).try_into()?;
        Ok(config)
    }
}

fn default_table() -> Result<Table, StoreError> {
    match Value::try_from(EngineConfig::default())? {
        Value::Table(table) => Ok(table),
        // EngineConfig is a struct; it always serializes to a table
        _ => Ok(Table::new()),
    }
}
