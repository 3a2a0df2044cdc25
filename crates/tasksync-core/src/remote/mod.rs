//! Hosted store reached over the HTTP API

mod client;
mod context_repository;
mod label_repository;
mod project_repository;
mod task_repository;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::codec::{FieldCodec, PlainCodec};
use crate::error::{Error, Result};
use crate::repository::RepositorySet;

pub use client::{extract_list, ApiClient};
pub use context_repository::HttpContextRepository;
pub use label_repository::HttpLabelRepository;
pub use project_repository::HttpProjectRepository;
pub use task_repository::HttpTaskRepository;

/// The hosted store: one API client shared by every repository
#[derive(Clone)]
pub struct HttpStore {
    client: Arc<ApiClient>,
    codec: Arc<dyn FieldCodec>,
}

impl HttpStore {
    /// Connect to the hosted API at `base_url` with an optional bearer token
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self::from_client(ApiClient::new(base_url, token)?))
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self {
            client: Arc::new(client),
            codec: Arc::new(PlainCodec),
        }
    }

    /// Replace the field codec applied to task text
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn FieldCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn tasks(&self) -> HttpTaskRepository {
        HttpTaskRepository::new(Arc::clone(&self.client), Arc::clone(&self.codec))
    }

    pub fn projects(&self) -> HttpProjectRepository {
        HttpProjectRepository::new(Arc::clone(&self.client))
    }

    pub fn labels(&self) -> HttpLabelRepository {
        HttpLabelRepository::new(Arc::clone(&self.client))
    }

    pub fn contexts(&self) -> HttpContextRepository {
        HttpContextRepository::new(Arc::clone(&self.client))
    }

    /// Bundle the repositories for injection into the sync engine
    pub fn repositories(&self) -> RepositorySet {
        RepositorySet {
            tasks: Arc::new(self.tasks()),
            projects: Arc::new(self.projects()),
            labels: Arc::new(self.labels()),
            contexts: Arc::new(self.contexts()),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

fn decode_list<T: DeserializeOwned>(value: Value, collection: &str) -> Result<Vec<T>> {
    extract_list(value, collection)?
        .into_iter()
        .map(decode)
        .collect()
}

fn encode<T: Serialize>(body: &T) -> Result<Value> {
    match serde_json::to_value(body)? {
        object @ Value::Object(_) => Ok(object),
        other => Err(Error::InvalidInput(format!(
            "request body must be a JSON object, got {other}"
        ))),
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    needle
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map_or(true, |needle| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        })
}
