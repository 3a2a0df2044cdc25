use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tasksync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Unknown storage context: {0}")]
    UnknownContext(String),
    #[error("Context `{0}` is a remote context without a base_url")]
    MissingBaseUrl(String),
    #[error("Source and target are the same context: {0}")]
    SameContext(String),
    #[error("Sync {0} failed")]
    SyncFailed(&'static str),
}
