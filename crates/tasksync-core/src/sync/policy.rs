//! Last-write-wins decision rule.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conflicts::{Newer, SyncConflictTracker};

/// Which side prevails when timestamps differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    LocalWins,
    RemoteWins,
}

impl ConflictStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalWins => "local_wins",
            Self::RemoteWins => "remote_wins",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "local_wins" => Ok(Self::LocalWins),
            "remote_wins" => Ok(Self::RemoteWins),
            other => Err(format!(
                "unknown conflict strategy `{other}` (expected local-wins or remote-wins)"
            )),
        }
    }
}

/// Why `should_update` decided the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    Equal,
    LocalNewer,
    RemoteNewer,
}

impl UpdateReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::LocalNewer => "local_newer",
            Self::RemoteNewer => "remote_newer",
        }
    }
}

/// Decide whether the local copy should be overwritten.
///
/// Equal timestamps never update. Under `RemoteWins` the update happens only
/// when the remote side is strictly newer; under `LocalWins` only when the
/// local side is.
pub fn should_update(
    local: Option<DateTime<Utc>>,
    remote: Option<DateTime<Utc>>,
    strategy: ConflictStrategy,
) -> (bool, UpdateReason) {
    match (SyncConflictTracker::compare_timestamps(local, remote), strategy) {
        (Newer::Equal, _) => (false, UpdateReason::Equal),
        (Newer::Remote, ConflictStrategy::RemoteWins) => (true, UpdateReason::RemoteNewer),
        (Newer::Local, ConflictStrategy::RemoteWins) => (false, UpdateReason::LocalNewer),
        (Newer::Local, ConflictStrategy::LocalWins) => (true, UpdateReason::LocalNewer),
        (Newer::Remote, ConflictStrategy::LocalWins) => (false, UpdateReason::RemoteNewer),
    }
}
