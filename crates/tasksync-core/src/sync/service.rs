//! Reconciliation shared by pull and push.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::conflicts::SyncConflictTracker;
use super::policy::{should_update, ConflictStrategy, UpdateReason};
use super::result::{EntityCounts, ItemError, ItemOutcome, SyncResult};
use super::state::SyncState;
use super::SyncDirection;
use crate::clock::Clock;
use crate::error::Result;
use crate::models::{
    ConflictResolution, Label, LabelCreate, LabelUpdate, Project, ProjectCreate, ProjectUpdate,
    ResourceType, SyncConflict, Task, TaskCreate, TaskUpdate,
};
use crate::repository::{Entity, Repository, RepositorySet};

/// An entity the engine knows how to replicate
pub trait Syncable: Entity {
    /// Whether skipped updates of this type are recorded as conflicts
    const TRACKS_CONFLICTS: bool;

    /// Timestamp consulted by the last-write-wins rule
    fn updated_at(&self) -> Option<DateTime<Utc>>;

    /// Payload that recreates this entity verbatim in another store
    fn to_create(&self) -> Self::Create;

    /// Payload that overwrites a copy in another store, or `None` when the
    /// type is create-only
    fn to_update(&self) -> Option<Self::Update>;
}

impl Syncable for Project {
    const TRACKS_CONFLICTS: bool = false;

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }

    fn to_create(&self) -> ProjectCreate {
        ProjectCreate {
            id: Some(self.id),
            name: self.name.clone(),
            color: self.color.clone(),
            is_favorite: self.is_favorite,
            is_archived: self.is_archived,
            workspace_id: self.workspace_id.clone(),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }

    fn to_update(&self) -> Option<ProjectUpdate> {
        Some(ProjectUpdate {
            name: Some(self.name.clone()),
            color: Some(self.color.clone()),
            is_favorite: Some(self.is_favorite),
            is_archived: Some(self.is_archived),
            workspace_id: Some(self.workspace_id.clone()),
            updated_at: Some(self.updated_at),
        })
    }
}

/// Labels carry no timestamp, so an existing label always compares equal
impl Syncable for Label {
    const TRACKS_CONFLICTS: bool = false;

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn to_create(&self) -> LabelCreate {
        LabelCreate {
            id: Some(self.id),
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }

    fn to_update(&self) -> Option<LabelUpdate> {
        None
    }
}

impl Syncable for Task {
    const TRACKS_CONFLICTS: bool = true;

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }

    fn to_create(&self) -> TaskCreate {
        TaskCreate {
            id: Some(self.id),
            content: self.content.clone(),
            description: self.description.clone(),
            priority: Some(self.priority),
            project_id: self.project_id,
            label_ids: self.label_ids.clone(),
            context_ids: self.context_ids.clone(),
            due_date: self.due_date,
            is_completed: self.is_completed,
            completed_at: self.completed_at,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }

    fn to_update(&self) -> Option<TaskUpdate> {
        Some(TaskUpdate {
            content: Some(self.content.clone()),
            description: Some(self.description.clone()),
            priority: Some(self.priority),
            project_id: Some(self.project_id),
            label_ids: Some(self.label_ids.clone()),
            context_ids: Some(self.context_ids.clone()),
            due_date: Some(self.due_date),
            is_completed: Some(self.is_completed),
            completed_at: Some(self.completed_at),
            updated_at: Some(self.updated_at),
        })
    }
}

/// Parameters of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub source_context: String,
    pub target_context: String,
    /// Fetch and count only; write nothing
    pub dry_run: bool,
    /// Ignore the recorded last-sync time
    pub full_sync: bool,
    /// Overrides the direction's default strategy
    pub strategy: Option<ConflictStrategy>,
}

impl SyncRequest {
    pub fn new(source_context: impl Into<String>, target_context: impl Into<String>) -> Self {
        Self {
            source_context: source_context.into(),
            target_context: target_context.into(),
            dry_run: false,
            full_sync: false,
            strategy: None,
        }
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn full_sync(mut self, full_sync: bool) -> Self {
        self.full_sync = full_sync;
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// Everything fetched from the source before any write
struct Snapshot {
    projects: Vec<Project>,
    labels: Vec<Label>,
    tasks: Vec<Task>,
}

/// Reconciles a source store into a target store
pub struct SyncService {
    source: RepositorySet,
    target: RepositorySet,
    state: SyncState,
    tracker: SyncConflictTracker,
    clock: Arc<dyn Clock>,
}

impl SyncService {
    pub fn new(
        source: RepositorySet,
        target: RepositorySet,
        state: SyncState,
        tracker: SyncConflictTracker,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            target,
            state,
            tracker,
            clock,
        }
    }

    pub const fn state(&self) -> &SyncState {
        &self.state
    }

    pub const fn tracker(&self) -> &SyncConflictTracker {
        &self.tracker
    }

    /// Last-write-wins rule, see [`should_update`]
    pub fn should_update(
        local: Option<DateTime<Utc>>,
        remote: Option<DateTime<Utc>>,
        strategy: ConflictStrategy,
    ) -> (bool, UpdateReason) {
        should_update(local, remote, strategy)
    }

    /// Record a skipped update, stamped with the injected clock
    pub fn log_conflict(
        &mut self,
        resource_type: ResourceType,
        resource_id: impl ToString,
        local_data: Value,
        remote_data: Value,
        resolution: ConflictResolution,
    ) {
        self.tracker.add_conflict(SyncConflict {
            resource_type,
            resource_id: resource_id.to_string(),
            local_data,
            remote_data,
            resolution,
            detected_at: self.clock.now(),
        });
    }

    /// Run one reconciliation pass. Never fails: errors land in the result.
    pub async fn run(&mut self, direction: SyncDirection, request: &SyncRequest) -> SyncResult {
        let started = Instant::now();
        let strategy = request
            .strategy
            .unwrap_or_else(|| direction.default_strategy());
        let mut result = SyncResult::new(direction, request.dry_run);

        tracing::info!(
            "Starting {direction}: {} -> {} (strategy {strategy}{})",
            request.source_context,
            request.target_context,
            if request.dry_run { ", dry run" } else { "" }
        );

        self.tracker.clear();
        match self.execute(direction, request, strategy, &mut result).await {
            Ok(()) => result.success = true,
            Err(error) => {
                tracing::error!("{direction} failed: {error}");
                result.error = Some(error.describe());
            }
        }
        result.duration = started.elapsed().as_secs_f64();

        tracing::info!(
            "Finished {direction} in {:.2}s: {} change(s), {} conflict(s), {} failed item(s)",
            result.duration,
            result.total_changes(),
            result.total_conflicts(),
            result.item_errors.len()
        );
        result
    }

    async fn execute(
        &mut self,
        direction: SyncDirection,
        request: &SyncRequest,
        strategy: ConflictStrategy,
        result: &mut SyncResult,
    ) -> Result<()> {
        let key = SyncState::make_context_key(
            &request.source_context,
            &request.target_context,
            direction,
        );
        let last_sync = if request.full_sync {
            None
        } else {
            self.state.get_last_sync(&key)
        };
        tracing::debug!("Last sync for {key}: {last_sync:?}");

        let snapshot = self.fetch().await?;
        result.projects.fetched = snapshot.projects.len();
        result.labels.fetched = snapshot.labels.len();
        result.tasks.fetched = snapshot.tasks.len();

        if request.dry_run {
            tracing::info!("Dry run: no changes applied");
            return Ok(());
        }

        let target = self.target.clone();
        self.reconcile(
            direction,
            &*target.projects,
            snapshot.projects,
            strategy,
            &mut result.projects,
            &mut result.item_errors,
        )
        .await;
        self.reconcile(
            direction,
            &*target.labels,
            snapshot.labels,
            strategy,
            &mut result.labels,
            &mut result.item_errors,
        )
        .await;
        self.reconcile(
            direction,
            &*target.tasks,
            snapshot.tasks,
            strategy,
            &mut result.tasks,
            &mut result.item_errors,
        )
        .await;

        self.state.set_last_sync(&key, None)?;

        if self.tracker.has_conflicts() {
            self.tracker.save()?;
        }
        Ok(())
    }

    /// Projects, then labels, then tasks
    async fn fetch(&self) -> Result<Snapshot> {
        let projects = self.source.projects.list_all(&Default::default()).await?;
        let labels = self.source.labels.list_all(&Default::default()).await?;
        let tasks = self.source.tasks.list_all(&Default::default()).await?;
        tracing::debug!(
            "Fetched {} project(s), {} label(s), {} task(s)",
            projects.len(),
            labels.len(),
            tasks.len()
        );
        Ok(Snapshot {
            projects,
            labels,
            tasks,
        })
    }

    async fn reconcile<E, R>(
        &mut self,
        direction: SyncDirection,
        target: &R,
        items: Vec<E>,
        strategy: ConflictStrategy,
        counts: &mut EntityCounts,
        item_errors: &mut Vec<ItemError>,
    ) where
        E: Syncable,
        R: Repository<E> + ?Sized,
    {
        for item in items {
            match self.reconcile_item(direction, target, &item, strategy).await {
                Ok(outcome) => {
                    tracing::debug!("{} {}: {outcome:?}", E::RESOURCE, item.id());
                    counts.record(outcome);
                }
                Err(error) => {
                    tracing::warn!("Error syncing {} {}: {error}", E::RESOURCE, item.id());
                    item_errors.push(ItemError {
                        resource_type: E::RESOURCE,
                        resource_id: item.id().to_string(),
                        message: error.to_string(),
                    });
                }
            }
        }
    }

    async fn reconcile_item<E, R>(
        &mut self,
        direction: SyncDirection,
        target: &R,
        item: &E,
        strategy: ConflictStrategy,
    ) -> Result<ItemOutcome>
    where
        E: Syncable,
        R: Repository<E> + ?Sized,
    {
        let Some(existing) = target.get_by_id(item.id()).await? else {
            target.create(item.to_create()).await?;
            return Ok(ItemOutcome::Created);
        };

        // `should_update` takes (local, remote); the target is local on pull
        let (update, reason) = match direction {
            SyncDirection::Pull => should_update(existing.updated_at(), item.updated_at(), strategy),
            SyncDirection::Push => should_update(item.updated_at(), existing.updated_at(), strategy),
        };

        if update {
            return match item.to_update() {
                Some(patch) => {
                    target.update(item.id(), patch).await?;
                    Ok(ItemOutcome::Updated)
                }
                None => Ok(ItemOutcome::Unchanged),
            };
        }

        if !E::TRACKS_CONFLICTS {
            return Ok(ItemOutcome::Unchanged);
        }

        let (resolution, local, remote) = match (direction, reason) {
            (SyncDirection::Pull, UpdateReason::LocalNewer) => {
                (ConflictResolution::SkippedLocalNewer, &existing, item)
            }
            (SyncDirection::Push, UpdateReason::RemoteNewer) => {
                (ConflictResolution::SkippedRemoteNewer, item, &existing)
            }
            _ => return Ok(ItemOutcome::Unchanged),
        };

        self.log_conflict(
            E::RESOURCE,
            item.id(),
            serde_json::to_value(local)?,
            serde_json::to_value(remote)?,
            resolution,
        );
        Ok(ItemOutcome::SkippedConflict)
    }
}
