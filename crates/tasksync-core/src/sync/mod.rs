//! Two-store synchronization engine.
//!
//! A run fetches projects, labels and tasks from a source store and
//! reconciles them into a target store in that order, using last-write-wins
//! on `updated_at`. Skipped task updates are recorded as conflicts.

mod conflicts;
mod policy;
mod pull;
mod push;
mod result;
mod service;
mod state;


use std::fmt;

use serde::{Deserialize, Serialize};

pub use conflicts::{Newer, SyncConflictTracker, CONFLICTS_FILE_NAME};
pub use policy::{should_update, ConflictStrategy, UpdateReason};
pub use pull::SyncPullService;
pub use push::SyncPushService;
pub use result::{EntityCounts, ItemError, ItemOutcome, SyncResult};
pub use service::{SyncRequest, SyncService, Syncable};
pub use state::{SyncState, STATE_FILE_NAME};

/// Direction of a run relative to the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Remote into local
    Pull,
    /// Local into remote
    Push,
}

impl SyncDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
        }
    }

    /// The receiving side keeps its own newer edits unless told otherwise
    pub const fn default_strategy(self) -> ConflictStrategy {
        match self {
            Self::Pull => ConflictStrategy::RemoteWins,
            Self::Push => ConflictStrategy::LocalWins,
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pull" => Ok(Self::Pull),
            "push" => Ok(Self::Push),
            other => Err(format!("unknown sync direction `{other}` (expected pull or push)")),
        }
    }
}
