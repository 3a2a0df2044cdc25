//! Task model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{entity_id, ContextId, LabelId, ProjectId};

/// Lowest task priority, used when none is given
pub const DEFAULT_PRIORITY: u8 = 4;

entity_id!(
    /// A unique identifier for a task, using UUID v7 (time-sortable)
    TaskId
);

/// A task in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, identical in every store holding this task
    pub id: TaskId,
    /// Main task text
    pub content: String,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Priority level (1 = highest, 4 = lowest)
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Owning project
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Attached labels
    #[serde(default, alias = "labels")]
    pub label_ids: Vec<LabelId>,
    /// Attached location contexts
    #[serde(default, alias = "contexts")]
    pub context_ids: Vec<ContextId>,
    /// Due date
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Completion flag
    #[serde(default)]
    pub is_completed: bool,
    /// When the task was completed
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp; strictly increases on every mutation
    pub updated_at: DateTime<Utc>,
    /// Soft delete marker
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

const fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl Task {
    /// Whether the task has been soft-deleted
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data for creating a task.
///
/// `id` and the timestamps are optional: stores generate them when absent,
/// and the sync engine supplies them to replicate an entity verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    pub label_ids: Vec<LabelId>,
    pub context_ids: Vec<ContextId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskCreate {
    /// Create payload with only the content set
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Partial task update; `None` leaves a field untouched.
///
/// Nullable fields use a nested option so a patch can clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<ProjectId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<LabelId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_ids: Option<Vec<ContextId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    /// Explicit timestamp for replicated writes; stores stamp "now" otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Completion status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Completed,
    #[default]
    All,
}

impl TaskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::All => "all",
        }
    }
}

/// Filters for listing tasks. The default matches every live task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub status: TaskStatus,
    pub project_id: Option<ProjectId>,
    pub priority: Option<u8>,
    pub label_id: Option<LabelId>,
    /// Case-insensitive substring match on content
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_parse() {
        let id = TaskId::new();
        let parsed: TaskId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_task_deserialize_defaults() {
        let task: Task = serde_json::from_str(
            r#"{
                "id": "0190a0b0-0000-7000-8000-000000000001",
                "content": "Buy milk",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z",
                "labels": ["0190a0b0-0000-7000-8000-0000000000aa"]
            }"#,
        )
        .unwrap();

        assert_eq!(task.priority, DEFAULT_PRIORITY);
        assert_eq!(task.label_ids.len(), 1);
        assert!(!task.is_completed);
        assert!(!task.is_deleted());
    }

    #[test]
    fn test_update_serializes_cleared_fields_as_null() {
        let update = TaskUpdate {
            due_date: Some(None),
            ..TaskUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "due_date": null }));
    }
}
