//! Data models for tasksync

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a UUID-backed identifier newtype.
///
/// Ids are stable across stores: a synced entity keeps the id it was created
/// with, so the sync engine can look it up on either side.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create a new unique ID using UUID v7
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Wrap an existing UUID
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Get the string representation of this ID
            #[must_use]
            pub fn as_str(&self) -> String {
                self.0.to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

pub(crate) use entity_id;

mod context;
mod label;
mod project;
mod sync_conflict;
mod task;

pub use context::{
    validate_geofence, Context, ContextCreate, ContextFilters, ContextId, ContextUpdate,
    DEFAULT_RADIUS_METERS,
};
pub use label::{Label, LabelCreate, LabelFilters, LabelId, LabelUpdate};
pub use project::{Project, ProjectCreate, ProjectFilters, ProjectId, ProjectUpdate, INBOX_NAME};
pub use sync_conflict::{ConflictResolution, SyncConflict};
pub use task::{Task, TaskCreate, TaskFilters, TaskId, TaskStatus, TaskUpdate, DEFAULT_PRIORITY};

/// Kind of entity a record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Task,
    Project,
    Label,
    Context,
}

impl ResourceType {
    /// Lowercase name as it appears in persisted records
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
            Self::Label => "label",
            Self::Context => "context",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
