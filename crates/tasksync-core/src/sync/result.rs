//! Outcome of a sync run.

use serde::Serialize;

use super::SyncDirection;
use crate::models::ResourceType;

/// What happened to one source item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Created,
    Updated,
    Unchanged,
    /// Left alone because the target holds a strictly newer edit
    SkippedConflict,
}

/// Per-entity-type counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub fetched: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub conflicts: usize,
}

impl EntityCounts {
    pub(crate) fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Created => self.new += 1,
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::Unchanged => self.unchanged += 1,
            ItemOutcome::SkippedConflict => self.conflicts += 1,
        }
    }
}

/// A single item that failed to reconcile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub message: String,
}

/// Aggregate result returned by a pull or push
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResult {
    pub direction: SyncDirection,
    pub dry_run: bool,
    pub projects: EntityCounts,
    pub labels: EntityCounts,
    pub tasks: EntityCounts,
    pub item_errors: Vec<ItemError>,
    pub success: bool,
    pub error: Option<String>,
    /// Wall time in seconds
    pub duration: f64,
}

impl SyncResult {
    pub(crate) fn new(direction: SyncDirection, dry_run: bool) -> Self {
        Self {
            direction,
            dry_run,
            projects: EntityCounts::default(),
            labels: EntityCounts::default(),
            tasks: EntityCounts::default(),
            item_errors: Vec::new(),
            success: false,
            error: None,
            duration: 0.0,
        }
    }

    /// Items written to the target across all entity types
    pub const fn total_changes(&self) -> usize {
        self.projects.new
            + self.projects.updated
            + self.labels.new
            + self.labels.updated
            + self.tasks.new
            + self.tasks.updated
    }

    pub const fn total_conflicts(&self) -> usize {
        self.projects.conflicts + self.labels.conflicts + self.tasks.conflicts
    }
}
