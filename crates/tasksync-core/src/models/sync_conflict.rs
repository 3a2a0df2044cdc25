//! Sync conflict model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ResourceType;

/// How a detected conflict was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Pull kept the target's strictly newer local edit
    SkippedLocalNewer,
    /// Push kept the target's strictly newer remote edit
    SkippedRemoteNewer,
}

impl ConflictResolution {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SkippedLocalNewer => "skipped_local_newer",
            Self::SkippedRemoteNewer => "skipped_remote_newer",
        }
    }
}

/// Recorded sync conflict, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConflict {
    /// Kind of entity involved
    pub resource_type: ResourceType,
    /// Id of the entity involved
    pub resource_id: String,
    /// Local-side snapshot at detection time
    pub local_data: serde_json::Value,
    /// Remote-side snapshot at detection time
    pub remote_data: serde_json::Value,
    /// Resolution applied
    pub resolution: ConflictResolution,
    /// Detection timestamp
    pub detected_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_conflict_serializes_flat_record() {
        let conflict = SyncConflict {
            resource_type: ResourceType::Task,
            resource_id: "abc".to_string(),
            local_data: serde_json::json!({ "content": "local" }),
            remote_data: serde_json::json!({ "content": "remote" }),
            resolution: ConflictResolution::SkippedLocalNewer,
            detected_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_value(&conflict).unwrap();
        assert_eq!(json["resource_type"], "task");
        assert_eq!(json["resolution"], "skipped_local_newer");
        assert_eq!(json["detected_at"], "2024-05-01T12:00:00Z");
    }
}
