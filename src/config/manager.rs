//! Reconciliation orchestrator.
//!
//! # Data Flow
//! ```text
//! candidate EngineConfig (admin request, SIGHUP reload, ...)
//!     → sanitize (normalize directories, downgrade bad rate strings)
//!     → classify against the active snapshot
//!     → persist the delta (durable write first)
//!     → swap the candidate in as active
//!     → ActionSet returned to the lifecycle
//! ```
//!
//! # Design Decisions
//! - Reads are lock-free (`ArcSwap`); writers serialize on the store mutex,
//!   so at most one reconciliation is in flight
//! - A forbidden change is rejected before anything is persisted
//! - A persistence failure leaves the previous snapshot fully active and
//!   reports the action set that would have applied, so callers can retry

use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::config::diff::{classify, Action, ActionSet};
use crate::config::schema::EngineConfig;
use crate::config::store::{SettingsStore, StoreError};
use crate::config::sync::sync_store;
use crate::storage::{normalize_config_dirs, StorageError};

/// Error from [`ConfigManager::reconcile`].
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The candidate changes a field that cannot change at runtime.
    #[error("changing done_cmd while running is not supported")]
    ForbiddenChange,
    /// A configured directory could not be resolved.
    #[error(transparent)]
    Path(#[from] StorageError),
    /// The durable write failed; the previous configuration stays active.
    #[error("failed to persist configuration: {source}")]
    Persist {
        source: StoreError,
        /// Actions the change would have required, for retry reporting.
        would_apply: ActionSet,
    },
}

/// Holds the active configuration and drives reconciliation.
pub struct ConfigManager {
    active: ArcSwap<EngineConfig>,
    store: Mutex<SettingsStore>,
}

impl ConfigManager {
    /// Wrap an already-booted configuration and its settings store.
    pub fn new(store: SettingsStore, initial: EngineConfig) -> Self {
        Self {
            active: ArcSwap::from_pointee(initial),
            store: Mutex::new(store),
        }
    }

    /// The active configuration snapshot. Never blocks behind a
    /// reconciliation in flight.
    pub fn active(&self) -> Arc<EngineConfig> {
        self.active.load_full()
    }

    /// Reconcile a candidate configuration against the active snapshot.
    ///
    /// On success the candidate becomes active and the returned set tells
    /// the lifecycle what to apply. On any error the previous configuration
    /// remains active and fully intact.
    pub async fn reconcile(
        &self,
        mut candidate: EngineConfig,
    ) -> Result<ActionSet, ReconcileError> {
        let mut store = self.store.lock().await;

        normalize_config_dirs(&mut candidate)?;
        sanitize_rates(&mut candidate);
        warn_on_odd_urls(&candidate);

        let current = self.active.load_full();
        let actions = classify(&current, &candidate);
        if actions.contains(Action::ForbidRuntimeChange) {
            return Err(ReconcileError::ForbiddenChange);
        }

        if let Err(source) = sync_store(&current, &candidate, &mut store) {
            return Err(ReconcileError::Persist { source, would_apply: actions });
        }

        self.active.store(Arc::new(candidate));
        Ok(actions)
    }

    /// Flush the settings store to disk (shutdown path).
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.store.lock().await.flush()
    }
}

/// Downgrade unparseable throttle strings before the diff, so the cleared
/// value is what gets classified and persisted.
fn sanitize_rates(candidate: &mut EngineConfig) {
    let _ = candidate.upload_limiter();
    let _ = candidate.download_limiter();
}

/// Operators sometimes paste half a URL; the engine treats these fields as
/// opaque, so a bad value only costs a warning here.
fn warn_on_odd_urls(candidate: &EngineConfig) {
    for (field, value) in [
        ("proxy_url", &candidate.proxy_url),
        ("tracker_list_url", &candidate.tracker_list_url),
    ] {
        if !value.is_empty() && Url::parse(value).is_err() {
            tracing::warn!(field, value = %value, "does not look like a valid URL");
        }
    }
}
