//! tasksync-core - Core library for tasksync
//!
//! This crate contains the task/project/label models, the storage-agnostic
//! repository contract with its embedded (libSQL) and hosted (HTTP)
//! implementations, and the sync engine that reconciles one store into the
//! other.

pub mod clock;
pub mod codec;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod repository;
pub mod sync;
pub mod util;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{FieldCodec, PlainCodec};
pub use db::LocalStore;
pub use error::{Error, Result};
pub use models::{Label, LabelId, Project, ProjectId, Task, TaskId};
pub use remote::HttpStore;
pub use repository::{Entity, ProjectRepository, Repository, RepositorySet, TaskRepository};
pub use sync::{
    ConflictStrategy, SyncConflictTracker, SyncDirection, SyncPullService, SyncPushService,
    SyncRequest, SyncResult, SyncService, SyncState,
};
