//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load settings → normalize directories → disk preflight →
//!     configure engine → persist fixes → start watcher → Daemon
//!
//! Reconfiguration (startup.rs, Daemon::apply):
//!     candidate → ConfigManager::reconcile → ActionSet →
//!     engine reconfigure / watcher restart / tracker refetch
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → flush settings → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//!     SIGHUP → config reload, not shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal; unresolved paths and a full
//!   disk abort before the daemon serves anything
//! - A rejected runtime change leaves the running daemon untouched

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{boot, ApplyError, BootError, BootOptions, Daemon};
