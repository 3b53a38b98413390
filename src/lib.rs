//! torrentd — configuration-reconciliation core of a torrent daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                   TORRENTD                      │
//!                    │                                                 │
//!   admin change     │  ┌─────────┐   ┌──────────┐   ┌─────────────┐  │
//!   ────────────────▶│  │ config/ │──▶│ config/  │──▶│  config/    │  │
//!   (candidate cfg)  │  │ manager │   │  diff    │   │   sync      │  │
//!                    │  └────┬────┘   └──────────┘   └──────┬──────┘  │
//!                    │       │ swap active                  │ flush   │
//!                    │       ▼                              ▼         │
//!                    │  Arc<EngineConfig>          settings file      │
//!                    │                                                 │
//!   ActionSet        │  ┌────────────────────────────────────────────┐│
//!   ────────────────▶│  │               lifecycle                    ││
//!   (applied here)   │  │  engine reconfigure │ watcher restart │    ││
//!                    │  │        tracker refetch │ shutdown          ││
//!                    │  └────────────────────────────────────────────┘│
//!                    │                                                 │
//!                    │  ┌─────────┐ ┌─────────┐ ┌────────┐ ┌───────┐  │
//!                    │  │  rate   │ │ storage │ │ watch  │ │engine │  │
//!                    │  │ buckets │ │ paths + │ │ dir    │ │ seam  │  │
//!                    │  │         │ │  disk   │ │watcher │ │       │  │
//!                    │  └─────────┘ └─────────┘ └────────┘ └───────┘  │
//!                    └────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod rate;
pub mod storage;

// Runtime collaborators
pub mod engine;
pub mod watch;

// Cross-cutting concerns
pub mod lifecycle;

pub use config::{classify, Action, ActionSet, ConfigManager, EngineConfig, SettingsStore};
pub use lifecycle::{boot, BootOptions, Daemon, Shutdown};
pub use rate::{parse_rate, RateLimit, RateLimiter};
