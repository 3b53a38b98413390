//! Configuration diff classification.
//!
//! # Responsibilities
//! - Declare every configuration field once, with its accessor and its
//!   runtime-change classification
//! - Classify the difference between two snapshots into the set of actions
//!   the lifecycle must take
//!
//! # Design Decisions
//! - One declared field table drives both classification and persistence;
//!   there is no reflection and no second field list to drift
//! - Classification is a pure function over two snapshots and never fails

use std::fmt;

use toml::Value;

use crate::config::schema::EngineConfig;

/// An action required to move the daemon to a new configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The changed field cannot be altered while the daemon runs.
    ForbidRuntimeChange,
    /// New settings must be pushed into the active transfer engine.
    NeedEngineReconfig,
    /// The watch-directory watcher must be restarted.
    NeedRestartWatch,
    /// The tracker list must be re-fetched.
    NeedUpdateTracker,
}

impl Action {
    const ALL: [Action; 4] = [
        Action::ForbidRuntimeChange,
        Action::NeedEngineReconfig,
        Action::NeedRestartWatch,
        Action::NeedUpdateTracker,
    ];

    const fn bit(self) -> u8 {
        match self {
            Action::ForbidRuntimeChange => 1 << 0,
            Action::NeedEngineReconfig => 1 << 1,
            Action::NeedRestartWatch => 1 << 2,
            Action::NeedUpdateTracker => 1 << 3,
        }
    }
}

/// A composable set of [`Action`] values.
///
/// The empty set means the two snapshots are observationally equivalent
/// with respect to every classified field.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionSet {
    bits: u8,
}

impl ActionSet {
    pub const EMPTY: ActionSet = ActionSet { bits: 0 };

    pub fn insert(&mut self, action: Action) {
        self.bits |= action.bit();
    }

    pub fn contains(self, action: Action) -> bool {
        self.bits & action.bit() != 0
    }

    pub fn union(self, other: ActionSet) -> ActionSet {
        ActionSet { bits: self.bits | other.bits }
    }

    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(move |action| self.contains(*action))
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        let mut set = ActionSet::EMPTY;
        for action in iter {
            set.insert(action);
        }
        set
    }
}

impl fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Runtime-change classification of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    /// Changing this field while running is not supported.
    Forbidden,
    /// Changing this field requires restarting the directory watcher.
    RestartWatch,
    /// Changing this field requires re-fetching the tracker list.
    UpdateTracker,
    /// Changing this field requires pushing new settings into the engine.
    Engine,
    /// Changing this field has no runtime effect.
    Cosmetic,
}

impl Group {
    fn action(self) -> Option<Action> {
        match self {
            Group::Forbidden => Some(Action::ForbidRuntimeChange),
            Group::RestartWatch => Some(Action::NeedRestartWatch),
            Group::UpdateTracker => Some(Action::NeedUpdateTracker),
            Group::Engine => Some(Action::NeedEngineReconfig),
            Group::Cosmetic => None,
        }
    }
}

/// One configuration field: settings-file key, accessor, classification.
pub struct FieldSpec {
    pub name: &'static str,
    group: Group,
    get: fn(&EngineConfig) -> Value,
}

impl FieldSpec {
    /// Field value as stored in the settings file.
    pub fn value(&self, config: &EngineConfig) -> Value {
        (self.get)(config)
    }
}

/// Every configuration field, in settings-file order.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "auto_start",
        group: Group::Cosmetic,
        get: |c| Value::Boolean(c.auto_start),
    },
    FieldSpec {
        name: "engine_debug",
        group: Group::Engine,
        get: |c| Value::Boolean(c.engine_debug),
    },
    FieldSpec {
        name: "mute_engine_log",
        group: Group::Cosmetic,
        get: |c| Value::Boolean(c.mute_engine_log),
    },
    FieldSpec {
        name: "obfs_preferred",
        group: Group::Engine,
        get: |c| Value::Boolean(c.obfs_preferred),
    },
    FieldSpec {
        name: "obfs_require_preferred",
        group: Group::Engine,
        get: |c| Value::Boolean(c.obfs_require_preferred),
    },
    FieldSpec {
        name: "disable_trackers",
        group: Group::Engine,
        get: |c| Value::Boolean(c.disable_trackers),
    },
    FieldSpec {
        name: "disable_ipv6",
        group: Group::Engine,
        get: |c| Value::Boolean(c.disable_ipv6),
    },
    FieldSpec {
        name: "download_directory",
        group: Group::Engine,
        get: |c| Value::String(c.download_directory.clone()),
    },
    FieldSpec {
        name: "watch_directory",
        group: Group::RestartWatch,
        get: |c| Value::String(c.watch_directory.clone()),
    },
    FieldSpec {
        name: "enable_upload",
        group: Group::Engine,
        get: |c| Value::Boolean(c.enable_upload),
    },
    FieldSpec {
        name: "enable_seeding",
        group: Group::Engine,
        get: |c| Value::Boolean(c.enable_seeding),
    },
    FieldSpec {
        name: "incoming_port",
        group: Group::Engine,
        get: |c| Value::Integer(i64::from(c.incoming_port)),
    },
    FieldSpec {
        name: "done_cmd",
        group: Group::Forbidden,
        get: |c| Value::String(c.done_cmd.clone()),
    },
    FieldSpec {
        name: "seed_ratio",
        group: Group::Cosmetic,
        get: |c| Value::Float(f64::from(c.seed_ratio)),
    },
    FieldSpec {
        name: "upload_rate",
        group: Group::Engine,
        get: |c| Value::String(c.upload_rate.clone()),
    },
    FieldSpec {
        name: "download_rate",
        group: Group::Engine,
        get: |c| Value::String(c.download_rate.clone()),
    },
    FieldSpec {
        name: "tracker_list_url",
        group: Group::UpdateTracker,
        get: |c| Value::String(c.tracker_list_url.clone()),
    },
    FieldSpec {
        name: "always_add_trackers",
        group: Group::Cosmetic,
        get: |c| Value::Boolean(c.always_add_trackers),
    },
    FieldSpec {
        name: "proxy_url",
        group: Group::Engine,
        get: |c| Value::String(c.proxy_url.clone()),
    },
    FieldSpec {
        name: "rss_url",
        group: Group::Cosmetic,
        get: |c| Value::String(c.rss_url.clone()),
    },
];

/// Classify the difference between two configuration snapshots.
///
/// Flags are independent and additive: the result is the union over every
/// differing field's classification. Pure; never fails.
pub fn classify(old: &EngineConfig, new: &EngineConfig) -> ActionSet {
    let mut actions = ActionSet::EMPTY;
    for field in FIELDS {
        if field.value(old) != field.value(new) {
            if let Some(action) = field.group.action() {
                actions.insert(action);
            }
        }
    }
    actions
}
