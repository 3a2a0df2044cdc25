use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tasksync_core::models::SyncConflict;
use tasksync_core::sync::EntityCounts;
use tasksync_core::{
    Clock, HttpStore, LocalStore, RepositorySet, SyncConflictTracker, SyncResult, SyncState,
    SystemClock,
};

use crate::config_profiles::{default_config_path, default_db_path, CliContextsConfig};
use crate::config_profiles::{StorageContext, API_TOKEN_ENV, DEFAULT_LOCAL_CONTEXT};
use crate::error::CliError;

/// Everything a command needs to know about where things live
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: CliContextsConfig,
    pub state_dir: PathBuf,
    pub local_name: String,
    pub remote_name: String,
}

/// A storage context with its defaults filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedStore {
    Local(PathBuf),
    Remote {
        base_url: String,
        token: Option<String>,
    },
}

impl CommandContext {
    pub fn load(
        config_path: Option<&Path>,
        state_dir: Option<&Path>,
        local: Option<&str>,
        remote: Option<&str>,
    ) -> Result<Self, CliError> {
        let config_path = config_path.map_or_else(default_config_path, Path::to_path_buf);
        let config = CliContextsConfig::load_from_path(&config_path).map_err(CliError::Config)?;
        let state_dir = state_dir.map_or_else(
            || {
                config_path
                    .parent()
                    .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
            },
            Path::to_path_buf,
        );

        Ok(Self {
            local_name: config.local_context_name(local),
            remote_name: config.remote_context_name(remote),
            config,
            state_dir,
        })
    }

    pub fn clock() -> Arc<dyn Clock> {
        Arc::new(SystemClock)
    }

    pub fn state(&self) -> SyncState {
        SyncState::in_dir(&self.state_dir, Self::clock())
    }

    pub fn tracker(&self) -> SyncConflictTracker {
        SyncConflictTracker::in_dir(&self.state_dir)
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedStore, CliError> {
        resolve_store(
            &self.config,
            name,
            std::env::var(API_TOKEN_ENV).ok().as_deref(),
        )
    }

    pub async fn open(&self, name: &str) -> Result<RepositorySet, CliError> {
        match self.resolve(name)? {
            ResolvedStore::Local(path) => {
                tracing::debug!("Opening local context {name} at {}", path.display());
                Ok(LocalStore::open(&path).await?.repositories())
            }
            ResolvedStore::Remote { base_url, token } => {
                tracing::debug!("Using remote context {name} at {base_url}");
                Ok(HttpStore::new(base_url, token)?.repositories())
            }
        }
    }
}

/// Looks a context up by name. The default local name works without any
/// config entry and lands in the user data directory.
pub fn resolve_store(
    config: &CliContextsConfig,
    name: &str,
    env_token: Option<&str>,
) -> Result<ResolvedStore, CliError> {
    match config.context(name) {
        Some(StorageContext::Local { db_path }) => Ok(ResolvedStore::Local(
            db_path.clone().unwrap_or_else(default_db_path),
        )),
        Some(StorageContext::Remote { base_url, token }) => {
            let base_url = base_url
                .clone()
                .ok_or_else(|| CliError::MissingBaseUrl(name.to_string()))?;
            let token = token.clone().or_else(|| {
                env_token
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            });
            Ok(ResolvedStore::Remote { base_url, token })
        }
        None if name == DEFAULT_LOCAL_CONTEXT => Ok(ResolvedStore::Local(default_db_path())),
        None => Err(CliError::UnknownContext(name.to_string())),
    }
}

pub fn format_sync_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn count_row(name: &str, counts: &EntityCounts) -> String {
    format!(
        "{name:<10} {:>8} {:>6} {:>8} {:>10} {:>10}",
        counts.fetched, counts.new, counts.updated, counts.unchanged, counts.conflicts
    )
}

pub fn format_result_lines(source: &str, target: &str, result: &SyncResult) -> Vec<String> {
    let mut header = format!("{} {source} -> {target}", result.direction);
    if result.dry_run {
        header.push_str(" (dry run)");
    }

    let mut lines = vec![
        header,
        format!(
            "{:<10} {:>8} {:>6} {:>8} {:>10} {:>10}",
            "entity", "fetched", "new", "updated", "unchanged", "conflicts"
        ),
        count_row("projects", &result.projects),
        count_row("labels", &result.labels),
        count_row("tasks", &result.tasks),
        format!("Conflicts: {}", result.total_conflicts()),
    ];

    if !result.item_errors.is_empty() {
        lines.push(format!("Item errors: {}", result.item_errors.len()));
        for item in &result.item_errors {
            lines.push(format!(
                "  {} {}: {}",
                item.resource_type, item.resource_id, item.message
            ));
        }
    }

    if result.success {
        lines.push(format!("Completed in {:.2}s", result.duration));
    } else {
        lines.push(format!(
            "Failed after {:.2}s: {}",
            result.duration,
            result.error.as_deref().unwrap_or("unknown error")
        ));
    }
    lines
}

pub fn format_sync_time_lines(times: &BTreeMap<String, Option<DateTime<Utc>>>) -> Vec<String> {
    let width = times.keys().map(String::len).max().unwrap_or(0);
    times
        .iter()
        .map(|(key, value)| {
            let when = value
                .as_ref()
                .map_or_else(|| "never".to_string(), format_sync_timestamp);
            format!("{key:<width$}  {when}")
        })
        .collect()
}

pub fn format_conflict_lines(conflicts: &[SyncConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {} {}  {}",
                format_sync_timestamp(&conflict.detected_at),
                conflict.resource_type,
                conflict.resource_id,
                conflict.resolution.as_str()
            )
        })
        .collect()
}
