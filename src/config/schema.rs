//! Configuration schema definitions.
//!
//! This module defines the flat engine configuration record. All fields
//! derive Serde traits for the TOML settings file; missing keys fall back
//! to the defaults below.

use serde::{Deserialize, Serialize};

use crate::rate::{parse_rate, RateLimit};

/// Tracker list fetched when the operator has not configured one.
pub const DEFAULT_TRACKER_LIST_URL: &str =
    "https://raw.githubusercontent.com/ngosang/trackerslist/master/trackers_best.txt";

/// Engine configuration for the torrent daemon.
///
/// A snapshot is immutable once classified; reconciliation compares two
/// distinct snapshots and installs a new active one.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Start torrents as soon as they are added.
    pub auto_start: bool,

    /// Verbose logging inside the transfer engine.
    pub engine_debug: bool,

    /// Suppress the transfer engine's own log output.
    pub mute_engine_log: bool,

    /// Prefer obfuscated peer connections.
    pub obfs_preferred: bool,

    /// Require obfuscation, refusing plaintext peers.
    pub obfs_require_preferred: bool,

    /// Disable all tracker announces.
    pub disable_trackers: bool,

    /// Disable IPv6 peer connections.
    pub disable_ipv6: bool,

    /// Directory completed and in-progress downloads are written to.
    pub download_directory: String,

    /// Directory scanned for dropped `.torrent` files.
    pub watch_directory: String,

    /// Allow uploading to peers.
    pub enable_upload: bool,

    /// Keep seeding after a download completes.
    pub enable_seeding: bool,

    /// TCP port for incoming peer connections.
    pub incoming_port: i32,

    /// Command executed when a torrent completes. Cannot change at runtime.
    pub done_cmd: String,

    /// Stop seeding once the upload/download ratio reaches this value.
    pub seed_ratio: f32,

    /// Upload throttle string (`"low"`, `"10MB"`, `"unlimited"`, ...).
    pub upload_rate: String,

    /// Download throttle string, same forms as `upload_rate`.
    pub download_rate: String,

    /// URL of the tracker list merged into announces.
    pub tracker_list_url: String,

    /// Add the tracker list to every torrent, not just trackerless ones.
    pub always_add_trackers: bool,

    /// Proxy URL for outgoing engine traffic.
    pub proxy_url: String,

    /// RSS feed polled for new torrents.
    pub rss_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            engine_debug: false,
            mute_engine_log: false,
            obfs_preferred: true,
            obfs_require_preferred: false,
            disable_trackers: false,
            disable_ipv6: false,
            download_directory: "./downloads".to_string(),
            watch_directory: "./torrents".to_string(),
            enable_upload: true,
            enable_seeding: false,
            incoming_port: 50007,
            done_cmd: String::new(),
            seed_ratio: 0.0,
            upload_rate: String::new(),
            download_rate: String::new(),
            tracker_list_url: DEFAULT_TRACKER_LIST_URL.to_string(),
            always_add_trackers: false,
            proxy_url: String::new(),
            rss_url: String::new(),
        }
    }
}

impl EngineConfig {
    /// Upload throttle descriptor.
    ///
    /// Fail-soft: an unrecognized rate string is cleared and logged, and
    /// the transfer runs unlimited. Operator-typed throttle text must never
    /// take the daemon down.
    pub fn upload_limiter(&mut self) -> RateLimit {
        match parse_rate(&self.upload_rate) {
            Ok(limit) => limit,
            Err(err) => {
                tracing::warn!(rate = %self.upload_rate, %err, "upload rate unrecognized, set as unlimited");
                self.upload_rate.clear();
                RateLimit::Unlimited
            }
        }
    }

    /// Download throttle descriptor, same fail-soft contract as
    /// [`upload_limiter`](Self::upload_limiter).
    pub fn download_limiter(&mut self) -> RateLimit {
        match parse_rate(&self.download_rate) {
            Ok(limit) => limit,
            Err(err) => {
                tracing::warn!(rate = %self.download_rate, %err, "download rate unrecognized, set as unlimited");
                self.download_rate.clear();
                RateLimit::Unlimited
            }
        }
    }
}
