//! Conflict tracking for a sync run and the durable conflict log.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::models::SyncConflict;

/// File name used inside the state directory
pub const CONFLICTS_FILE_NAME: &str = "sync-conflicts.json";

/// Which side of a comparison carries the newer timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newer {
    Local,
    Remote,
    Equal,
}

/// Conflicts detected during the current run, flushed to the log on `save`
#[derive(Debug)]
pub struct SyncConflictTracker {
    path: PathBuf,
    conflicts: Vec<SyncConflict>,
}

impl SyncConflictTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conflicts: Vec::new(),
        }
    }

    /// Track conflicts logged to `sync-conflicts.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CONFLICTS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_conflict(&mut self, conflict: SyncConflict) {
        self.conflicts.push(conflict);
    }

    pub fn get_conflicts(&self) -> &[SyncConflict] {
        &self.conflicts
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn count(&self) -> usize {
        self.conflicts.len()
    }

    pub fn clear(&mut self) {
        self.conflicts.clear();
    }

    /// Append tracked conflicts to the log file, keeping earlier entries.
    ///
    /// A corrupted log is replaced rather than treated as an error.
    pub fn save(&self) -> Result<()> {
        if self.conflicts.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut entries = read_raw_log(&self.path)?;
        for conflict in &self.conflicts {
            entries.push(serde_json::to_value(conflict)?);
        }

        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        tracing::debug!(
            "Appended {} conflict(s) to {}",
            self.conflicts.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Every conflict persisted so far, oldest first
    pub fn read_log(&self) -> Result<Vec<SyncConflict>> {
        Ok(read_raw_log(&self.path)?
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(conflict) => Some(conflict),
                Err(error) => {
                    tracing::warn!("Skipping unreadable conflict record: {error}");
                    None
                }
            })
            .collect())
    }

    /// Decide which timestamp is newer; a missing side always loses
    pub fn compare_timestamps(
        local: Option<DateTime<Utc>>,
        remote: Option<DateTime<Utc>>,
    ) -> Newer {
        match (local, remote) {
            (None, None) => Newer::Equal,
            (None, Some(_)) => Newer::Remote,
            (Some(_), None) => Newer::Local,
            (Some(local), Some(remote)) if local > remote => Newer::Local,
            (Some(local), Some(remote)) if remote > local => Newer::Remote,
            (Some(_), Some(_)) => Newer::Equal,
        }
    }
}

fn read_raw_log(path: &Path) -> Result<Vec<Value>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(_) | Err(_) => {
            tracing::warn!("Ignoring corrupted conflict log {}", path.display());
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConflictResolution, ResourceType};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    fn conflict(id: &str) -> SyncConflict {
        SyncConflict {
            resource_type: ResourceType::Task,
            resource_id: id.to_string(),
            local_data: json!({ "content": "local" }),
            remote_data: json!({ "content": "remote" }),
            resolution: ConflictResolution::SkippedLocalNewer,
            detected_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn compare_timestamps_handles_missing_sides() {
        let now = Utc::now();
        let later = now + Duration::seconds(1);

        assert_eq!(SyncConflictTracker::compare_timestamps(None, None), Newer::Equal);
        assert_eq!(SyncConflictTracker::compare_timestamps(None, Some(now)), Newer::Remote);
        assert_eq!(SyncConflictTracker::compare_timestamps(Some(now), None), Newer::Local);
        assert_eq!(
            SyncConflictTracker::compare_timestamps(Some(later), Some(now)),
            Newer::Local
        );
        assert_eq!(
            SyncConflictTracker::compare_timestamps(Some(now), Some(later)),
            Newer::Remote
        );
        assert_eq!(
            SyncConflictTracker::compare_timestamps(Some(now), Some(now)),
            Newer::Equal
        );
    }

    #[test]
    fn tracker_counts_and_clears() {
        let mut tracker = SyncConflictTracker::new("unused.json");
        assert!(!tracker.has_conflicts());

        tracker.add_conflict(conflict("a"));
        tracker.add_conflict(conflict("b"));
        assert_eq!(tracker.count(), 2);
        assert_eq!(tracker.get_conflicts()[1].resource_id, "b");

        tracker.clear();
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn save_appends_to_existing_log() {
        let dir = tempdir().unwrap();
        let mut tracker = SyncConflictTracker::in_dir(dir.path());

        tracker.add_conflict(conflict("first"));
        tracker.save().unwrap();
        tracker.clear();
        tracker.add_conflict(conflict("second"));
        tracker.save().unwrap();

        let ids: Vec<_> = tracker
            .read_log()
            .unwrap()
            .into_iter()
            .map(|c| c.resource_id)
            .collect();
        assert_eq!(ids, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn save_without_conflicts_writes_nothing() {
        let dir = tempdir().unwrap();
        let tracker = SyncConflictTracker::in_dir(dir.path());
        tracker.save().unwrap();
        assert!(!tracker.path().exists());
    }

    #[test]
    fn corrupted_log_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFLICTS_FILE_NAME);
        std::fs::write(&path, "{\"oops\": true}").unwrap();

        let mut tracker = SyncConflictTracker::new(&path);
        assert!(tracker.read_log().unwrap().is_empty());

        tracker.add_conflict(conflict("fresh"));
        tracker.save().unwrap();
        assert_eq!(tracker.read_log().unwrap().len(), 1);
    }
}
