//! Error types for tasksync-core

use thiserror::Error;

use crate::models::ResourceType;

/// Result type alias using tasksync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tasksync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity not found
    #[error("{resource} not found: {id}")]
    NotFound {
        resource: ResourceType,
        id: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Mutation rejected because the target is protected (the Inbox project)
    #[error("Protected resource: {0}")]
    Protected(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error talking to the hosted store
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Hosted store answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Field codec failure
    #[error("Codec error: {0}")]
    Codec(String),
}

impl Error {
    /// Build a `NotFound` error for the given resource and id.
    pub fn not_found(resource: ResourceType, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Short, stable name of the variant, used when rendering run failures.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "Database",
            Self::LibSql(_) => "LibSql",
            Self::Io(_) => "Io",
            Self::NotFound { .. } => "NotFound",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Protected(_) => "Protected",
            Self::Serialization(_) => "Serialization",
            Self::Http(_) => "Http",
            Self::Api { .. } => "Api",
            Self::Codec(_) => "Codec",
        }
    }

    /// Render the error with its kind and full cause chain.
    pub fn describe(&self) -> String {
        let mut text = format!("{}: {self}", self.kind());
        let mut source = std::error::Error::source(self);
        if source.is_some() {
            text.push_str("\n\nCaused by:");
        }
        while let Some(cause) = source {
            text.push_str("\n  ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_resource_and_id() {
        let error = Error::not_found(ResourceType::Task, "abc");
        assert_eq!(error.to_string(), "task not found: abc");
    }

    #[test]
    fn describe_includes_kind_and_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let text = Error::from(io).describe();
        assert!(text.starts_with("Io: IO error: denied"));
    }
}
