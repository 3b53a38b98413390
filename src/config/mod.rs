//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → store.rs (load-or-default, key-value staging, flush)
//!     → schema.rs (EngineConfig snapshot, serde defaults)
//!     → manager.rs (active snapshot, serialized reconciliation)
//!
//! On a proposed change:
//!     candidate snapshot
//!     → diff.rs classify (declared field table → ActionSet)
//!     → sync.rs (stage changed keys, change log, single flush)
//!     → atomic swap of Arc<EngineConfig>
//!     → lifecycle applies the ActionSet
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable once classified; reconciliation always
//!   compares two distinct snapshots
//! - One declared field table drives classification and persistence
//! - The durable write precedes the in-memory swap

pub mod diff;
pub mod manager;
pub mod schema;
pub mod store;
pub mod sync;

pub use diff::{classify, Action, ActionSet};
pub use manager::{ConfigManager, ReconcileError};
pub use schema::EngineConfig;
pub use store::{SettingsStore, StoreError};
pub use sync::sync_store;
