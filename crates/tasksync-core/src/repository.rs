//! Storage-agnostic repository contract.
//!
//! Every backing store (the embedded libSQL store, the hosted HTTP store)
//! implements the same traits, so the sync engine can treat either one as
//! source or target.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{
    Context, ContextCreate, ContextFilters, ContextId, ContextUpdate, Label, LabelCreate,
    LabelFilters, LabelId, LabelUpdate, Project, ProjectCreate, ProjectFilters, ProjectId,
    ProjectUpdate, ResourceType, Task, TaskCreate, TaskFilters, TaskId, TaskUpdate,
};

/// An entity type managed through a [`Repository`]
pub trait Entity: Clone + Serialize + Send + Sync + 'static {
    type Id: Copy + fmt::Display + Send + Sync + 'static;
    type Create: Send + 'static;
    type Update: Send + 'static;
    type Filters: Default + Send + Sync + 'static;

    const RESOURCE: ResourceType;

    fn id(&self) -> Self::Id;
}

/// CRUD + filter contract shared by all stores
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// List live entities matching `filters`
    async fn list_all(&self, filters: &E::Filters) -> Result<Vec<E>>;

    /// Look up an entity, returning `None` when it does not exist
    async fn get_by_id(&self, id: E::Id) -> Result<Option<E>>;

    /// Look up an entity, failing with [`Error::NotFound`] when absent
    async fn get(&self, id: E::Id) -> Result<E> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(E::RESOURCE, id))
    }

    async fn create(&self, data: E::Create) -> Result<E>;

    async fn update(&self, id: E::Id, patch: E::Update) -> Result<E>;

    /// Delete an entity; returns whether anything was removed
    async fn delete(&self, id: E::Id) -> Result<bool>;
}

/// Task repository with completion support
#[async_trait]
pub trait TaskRepository: Repository<Task> {
    /// Mark a task completed, stamping `completed_at`
    async fn complete(&self, id: TaskId) -> Result<Task>;
}

/// Project repository with archiving support
#[async_trait]
pub trait ProjectRepository: Repository<Project> {
    async fn archive(&self, id: ProjectId) -> Result<Project>;

    async fn unarchive(&self, id: ProjectId) -> Result<Project>;
}

impl Entity for Task {
    type Id = TaskId;
    type Create = TaskCreate;
    type Update = TaskUpdate;
    type Filters = TaskFilters;

    const RESOURCE: ResourceType = ResourceType::Task;

    fn id(&self) -> TaskId {
        self.id
    }
}

impl Entity for Project {
    type Id = ProjectId;
    type Create = ProjectCreate;
    type Update = ProjectUpdate;
    type Filters = ProjectFilters;

    const RESOURCE: ResourceType = ResourceType::Project;

    fn id(&self) -> ProjectId {
        self.id
    }
}

impl Entity for Label {
    type Id = LabelId;
    type Create = LabelCreate;
    type Update = LabelUpdate;
    type Filters = LabelFilters;

    const RESOURCE: ResourceType = ResourceType::Label;

    fn id(&self) -> LabelId {
        self.id
    }
}

impl Entity for Context {
    type Id = ContextId;
    type Create = ContextCreate;
    type Update = ContextUpdate;
    type Filters = ContextFilters;

    const RESOURCE: ResourceType = ResourceType::Context;

    fn id(&self) -> ContextId {
        self.id
    }
}

/// One store's repositories, injected into the sync engine as source or target
#[derive(Clone)]
pub struct RepositorySet {
    pub tasks: Arc<dyn TaskRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub labels: Arc<dyn Repository<Label>>,
    pub contexts: Arc<dyn Repository<Context>>,
}
