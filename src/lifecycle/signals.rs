//! OS signal handling.
//!
//! # Responsibilities
//! - Translate SIGINT/SIGTERM into a graceful shutdown
//! - Translate SIGHUP into a configuration reload
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers a config reload, not shutdown

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Completes when SIGINT or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

/// SIGHUP deliveries, surfaced as reload requests.
pub struct ReloadSignal {
    #[cfg(unix)]
    inner: tokio::signal::unix::Signal,
}

impl ReloadSignal {
    /// Register the SIGHUP handler.
    pub fn new() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self { inner: signal(SignalKind::hangup())? })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Completes on the next SIGHUP. Never completes on platforms without
    /// SIGHUP.
    pub async fn recv(&mut self) {
        #[cfg(unix)]
        {
            self.inner.recv().await;
        }
        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await;
        }
    }
}
