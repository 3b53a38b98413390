//! Transfer-engine seam.
//!
//! The piece/peer engine lives behind this trait; the daemon core only
//! pushes configuration into it. Rate limiter descriptors are derived from
//! the config via the fail-soft accessors before a snapshot reaches
//! `configure`.

use std::sync::Mutex;

use thiserror::Error;

use crate::config::schema::EngineConfig;

/// Error surfaced by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine rejected configuration: {0}")]
    Rejected(String),
}

/// The transfer engine as seen by the daemon lifecycle.
///
/// `configure` is called once at boot and again whenever reconciliation
/// reports `NeedEngineReconfig`.
pub trait TransferEngine: Send + Sync {
    fn configure(&self, config: &EngineConfig) -> Result<(), EngineError>;
}

/// Engine stand-in that records the last applied configuration.
///
/// Used by tests and as the default binary wiring while the real engine
/// implementation lives out of tree.
#[derive(Default)]
pub struct StubEngine {
    applied: Mutex<Option<EngineConfig>>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration most recently pushed via `configure`, if any.
    pub fn last_applied(&self) -> Option<EngineConfig> {
        self.applied.lock().expect("stub engine mutex poisoned").clone()
    }
}

impl TransferEngine for StubEngine {
    fn configure(&self, config: &EngineConfig) -> Result<(), EngineError> {
        tracing::debug!(port = config.incoming_port, "stub engine configured");
        *self.applied.lock().expect("stub engine mutex poisoned") = Some(config.clone());
        Ok(())
    }
}
