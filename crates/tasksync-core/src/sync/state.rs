//! Persisted last-sync timestamps, keyed by (source, target, direction).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use super::SyncDirection;
use crate::clock::Clock;
use crate::error::Result;
use crate::util::parse_timestamp;

/// File name used inside the state directory
pub const STATE_FILE_NAME: &str = "sync-state.json";

/// Last successful sync time per context key
pub struct SyncState {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    last_sync: BTreeMap<String, Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncState")
            .field("path", &self.path)
            .field("last_sync", &self.last_sync)
            .finish_non_exhaustive()
    }
}

impl SyncState {
    /// Load state from `path`; a missing or corrupted file yields empty state
    pub fn load(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();
        let last_sync = read_state_file(&path);
        Self {
            path,
            clock,
            last_sync,
        }
    }

    /// Load `sync-state.json` from `dir`
    pub fn in_dir(dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        Self::load(dir.as_ref().join(STATE_FILE_NAME), clock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build the key `"{source} -> {target} ({direction})"`
    pub fn make_context_key(source: &str, target: &str, direction: SyncDirection) -> String {
        format!("{source} -> {target} ({direction})")
    }

    pub fn get_last_sync(&self, key: &str) -> Option<DateTime<Utc>> {
        self.last_sync.get(key).copied().flatten()
    }

    /// Record a sync time for `key` (defaults to the clock's now) and persist
    pub fn set_last_sync(
        &mut self,
        key: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>> {
        let timestamp = timestamp.unwrap_or_else(|| self.clock.now());
        self.last_sync.insert(key.to_string(), Some(timestamp));
        self.save()?;
        Ok(timestamp)
    }

    /// Forget `key`; returns whether it was present
    pub fn clear_last_sync(&mut self, key: &str) -> Result<bool> {
        if self.last_sync.remove(key).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn get_all_sync_times(&self) -> &BTreeMap<String, Option<DateTime<Utc>>> {
        &self.last_sync
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let entries: Map<String, Value> = self
            .last_sync
            .iter()
            .map(|(key, value)| {
                let value = value.map_or(Value::Null, |ts| {
                    Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                });
                (key.clone(), value)
            })
            .collect();

        let document = json!({ "last_sync": entries });
        std::fs::write(&self.path, serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }
}

fn read_state_file(path: &Path) -> BTreeMap<String, Option<DateTime<Utc>>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(error) => {
            tracing::warn!("Could not read sync state {}: {error}", path.display());
            return BTreeMap::new();
        }
    };

    let document: Value = match serde_json::from_str(&raw) {
        Ok(document) => document,
        Err(error) => {
            tracing::warn!("Ignoring corrupted sync state {}: {error}", path.display());
            return BTreeMap::new();
        }
    };

    let Some(entries) = document.get("last_sync").and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    entries
        .iter()
        .map(|(key, value)| {
            let timestamp = value.as_str().and_then(|raw| {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    tracing::warn!("Ignoring unreadable sync time for {key}: {raw}");
                }
                parsed
            });
            (key.clone(), timestamp)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn context_key_format() {
        assert_eq!(
            SyncState::make_context_key("remote", "local", SyncDirection::Pull),
            "remote -> local (pull)"
        );
        assert_eq!(
            SyncState::make_context_key("local", "remote", SyncDirection::Push),
            "local -> remote (push)"
        );
    }

    #[test]
    fn set_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let clock = clock();
        let key = "remote -> local (pull)";

        let mut state = SyncState::in_dir(dir.path(), clock.clone());
        assert!(state.get_last_sync(key).is_none());
        let stamped = state.set_last_sync(key, None).unwrap();
        assert_eq!(stamped, clock.now());

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(state.path()).unwrap()).unwrap();
        assert_eq!(raw["last_sync"][key], "2024-06-01T09:00:00Z");

        let reloaded = SyncState::in_dir(dir.path(), clock);
        assert_eq!(reloaded.get_last_sync(key), Some(stamped));
    }

    #[test]
    fn clear_removes_only_that_key() {
        let dir = tempdir().unwrap();
        let mut state = SyncState::in_dir(dir.path(), clock());
        state.set_last_sync("a -> b (pull)", None).unwrap();
        state.set_last_sync("a -> b (push)", None).unwrap();

        assert!(state.clear_last_sync("a -> b (pull)").unwrap());
        assert!(!state.clear_last_sync("a -> b (pull)").unwrap());

        let keys: Vec<_> = state.get_all_sync_times().keys().cloned().collect();
        assert_eq!(keys, vec!["a -> b (push)".to_string()]);
    }

    #[test]
    fn corrupted_file_is_treated_as_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(STATE_FILE_NAME), "{ not json").unwrap();

        let mut state = SyncState::in_dir(dir.path(), clock());
        assert!(state.get_all_sync_times().is_empty());

        // Writing afterwards replaces the corrupted document
        state.set_last_sync("x -> y (pull)", None).unwrap();
        assert!(SyncState::in_dir(dir.path(), clock())
            .get_last_sync("x -> y (pull)")
            .is_some());
    }

    #[test]
    fn legacy_naive_timestamps_read_as_utc() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(STATE_FILE_NAME),
            r#"{"last_sync": {"old": "2024-01-02T03:04:05.123456", "never": null}}"#,
        )
        .unwrap();

        let state = SyncState::in_dir(dir.path(), clock());
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(state.get_last_sync("old"), Some(expected));
        assert_eq!(state.get_last_sync("never"), None);
        assert!(state.get_all_sync_times().contains_key("never"));
    }
}
