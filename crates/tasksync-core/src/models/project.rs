//! Project model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id;

/// Display name of the built-in Inbox project
pub const INBOX_NAME: &str = "Inbox";

entity_id!(
    /// A unique identifier for a project
    ProjectId
);

impl ProjectId {
    /// Fixed id of the Inbox project (the nil UUID), shared by every store
    pub const INBOX: Self = Self::from_uuid(uuid::Uuid::nil());

    /// Whether this is the Inbox project
    pub fn is_inbox(&self) -> bool {
        *self == Self::INBOX
    }
}

/// A project grouping tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: ProjectId,
    /// Project name
    pub name: String,
    /// Optional hex color for display
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_archived: bool,
    /// Parent workspace reference
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Whether this is the protected Inbox project
    pub fn is_inbox(&self) -> bool {
        self.id.is_inbox()
    }
}

/// Data for creating a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ProjectId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub is_favorite: bool,
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectCreate {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial project update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectUpdate {
    /// Check the patch against the Inbox immutability rule.
    ///
    /// The Inbox may be recolored, but never renamed or archived.
    pub fn violates_inbox_rule(&self) -> bool {
        let renames = self.name.as_deref().is_some_and(|name| name != INBOX_NAME);
        renames || self.is_archived == Some(true)
    }
}

/// Filters for listing projects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilters {
    pub is_archived: Option<bool>,
    pub is_favorite: Option<bool>,
    pub workspace_id: Option<String>,
    /// Case-insensitive substring match on name
    pub search: Option<String>,
}
