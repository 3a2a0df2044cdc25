//! Embedded store backed by a local libSQL database

mod connection;
mod context_repository;
mod label_repository;
mod migrations;
mod project_repository;
mod task_repository;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use libsql::{Row, Value};

use crate::error::{Error, Result};
use crate::repository::RepositorySet;
use crate::util::{format_timestamp, parse_timestamp};

pub use connection::Database;
pub use context_repository::LibSqlContextRepository;
pub use label_repository::LibSqlLabelRepository;
pub use project_repository::LibSqlProjectRepository;
pub use task_repository::LibSqlTaskRepository;

/// The embedded store: one database, one repository per entity type
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
}

impl LocalStore {
    /// Open (or create) the store at `path`
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::from_database(Database::open(path).await?))
    }

    /// Open a throwaway in-memory store
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory().await?))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn tasks(&self) -> LibSqlTaskRepository {
        LibSqlTaskRepository::new(Arc::clone(&self.db))
    }

    pub fn projects(&self) -> LibSqlProjectRepository {
        LibSqlProjectRepository::new(Arc::clone(&self.db))
    }

    pub fn labels(&self) -> LibSqlLabelRepository {
        LibSqlLabelRepository::new(Arc::clone(&self.db))
    }

    pub fn contexts(&self) -> LibSqlContextRepository {
        LibSqlContextRepository::new(Arc::clone(&self.db))
    }

    /// Bundle the repositories for injection into the sync engine
    pub fn repositories(&self) -> RepositorySet {
        RepositorySet {
            tasks: Arc::new(self.tasks()),
            projects: Arc::new(self.projects()),
            labels: Arc::new(self.labels()),
            contexts: Arc::new(self.contexts()),
        }
    }
}

/// Next `updated_at` for a local mutation, strictly after `previous`.
fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn timestamp_value(value: Option<&DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |value| Value::Text(format_timestamp(value)))
}

fn text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |value| Value::Text(value.to_string()))
}

fn bool_value(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

fn like_pattern(search: &str) -> String {
    format!("%{}%", search.trim().to_lowercase())
}

fn opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(Error::Database(format!(
            "expected text in column {idx}, found {other:?}"
        ))),
    }
}

fn text(row: &Row, idx: i32) -> Result<String> {
    opt_text(row, idx)?.ok_or_else(|| Error::Database(format!("column {idx} is NULL")))
}

fn flag(row: &Row, idx: i32) -> Result<bool> {
    Ok(row.get::<i64>(idx)? != 0)
}

fn opt_timestamp(row: &Row, idx: i32) -> Result<Option<DateTime<Utc>>> {
    opt_text(row, idx)?
        .map(|raw| {
            parse_timestamp(&raw)
                .ok_or_else(|| Error::Database(format!("invalid timestamp in column {idx}: {raw}")))
        })
        .transpose()
}

fn timestamp(row: &Row, idx: i32) -> Result<DateTime<Utc>> {
    opt_timestamp(row, idx)?.ok_or_else(|| Error::Database(format!("column {idx} is NULL")))
}

fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Database(format!("invalid id in database: {raw}")))
}

fn require_text(value: &str, field: &str) -> Result<String> {
    crate::util::normalize_text_option(Some(value.to_string()))
        .ok_or_else(|| Error::InvalidInput(format!("{field} must not be empty")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_updated_at_is_strictly_later() {
        let future = Utc::now() + Duration::hours(1);
        assert!(next_updated_at(future) > future);

        let past = Utc::now() - Duration::hours(1);
        assert!(next_updated_at(past) > past);
    }
}
