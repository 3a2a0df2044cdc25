//! Label model

use serde::{Deserialize, Serialize};

use super::entity_id;

entity_id!(
    /// A unique identifier for a label
    LabelId
);

/// A label attached to tasks (e.g. "@work")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Data for creating a label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<LabelId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl LabelCreate {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial label update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,
}

/// Filters for listing labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFilters {
    /// Case-insensitive substring match on name
    pub search: Option<String>,
}
