//! Task repository backed by the hosted API

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{decode, encode, extract_list, ApiClient};
use crate::codec::FieldCodec;
use crate::error::Result;
use crate::models::{Task, TaskCreate, TaskFilters, TaskId, TaskStatus, TaskUpdate};
use crate::repository::{Repository, TaskRepository};

/// Text fields passed through the codec, paired with their ciphertext field
const CODEC_FIELDS: [(&str, &str); 2] = [
    ("content", "content_encrypted"),
    ("description", "description_encrypted"),
];

/// HTTP implementation of `TaskRepository`
pub struct HttpTaskRepository {
    client: Arc<ApiClient>,
    codec: Arc<dyn FieldCodec>,
}

impl HttpTaskRepository {
    pub fn new(client: Arc<ApiClient>, codec: Arc<dyn FieldCodec>) -> Self {
        Self { client, codec }
    }

    /// Decrypt codec fields and parse a task from the wire
    fn decode_task(&self, mut value: Value) -> Result<Task> {
        if let Value::Object(map) = &mut value {
            for (field, cipher_field) in CODEC_FIELDS {
                let cipher = match map.remove(cipher_field) {
                    Some(Value::String(cipher)) => Some(cipher),
                    _ => None,
                };
                let visible = map.get(field).and_then(Value::as_str).map(str::to_string);
                if visible.is_none() && cipher.is_none() {
                    continue;
                }
                let plain = self
                    .codec
                    .decrypt(visible.as_deref().unwrap_or_default(), cipher.as_deref())?;
                map.insert(field.to_string(), Value::String(plain));
            }
        }
        decode(value)
    }

    /// Encrypt codec fields present in an outgoing body
    fn encode_fields(&self, map: &mut Map<String, Value>) -> Result<()> {
        for (field, cipher_field) in CODEC_FIELDS {
            let Some(Value::String(plain)) = map.get(field).cloned() else {
                continue;
            };
            let (visible, cipher) = self.codec.encrypt(&plain)?;
            map.insert(field.to_string(), Value::String(visible));
            if let Some(cipher) = cipher {
                map.insert(cipher_field.to_string(), Value::String(cipher));
            }
        }
        Ok(())
    }

    fn encode_body<T: serde::Serialize>(&self, body: &T) -> Result<Value> {
        let mut value = encode(body)?;
        if let Value::Object(map) = &mut value {
            self.encode_fields(map)?;
        }
        Ok(value)
    }
}

fn filter_query(filters: &TaskFilters) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if filters.status != TaskStatus::All {
        query.push(("status", filters.status.as_str().to_string()));
    }
    if let Some(project_id) = filters.project_id {
        query.push(("project_id", project_id.as_str()));
    }
    if let Some(priority) = filters.priority {
        query.push(("priority", priority.to_string()));
    }
    if let Some(label_id) = filters.label_id {
        query.push(("label_id", label_id.as_str()));
    }
    if let Some(search) = filters.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            query.push(("search", search.to_string()));
        }
    }
    if let Some(limit) = filters.limit {
        query.push(("limit", limit.to_string()));
    }
    if let Some(offset) = filters.offset {
        query.push(("offset", offset.to_string()));
    }
    query
}

#[async_trait]
impl Repository<Task> for HttpTaskRepository {
    async fn list_all(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        let response = self.client.get("v1/tasks", &filter_query(filters)).await?;
        extract_list(response, "tasks")?
            .into_iter()
            .map(|item| self.decode_task(item))
            .collect()
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        self.client
            .get_optional(&format!("v1/tasks/{id}"))
            .await?
            .map(|value| self.decode_task(value))
            .transpose()
    }

    async fn create(&self, data: TaskCreate) -> Result<Task> {
        let body = self.encode_body(&data)?;
        let response = self.client.post("v1/tasks", Some(&body)).await?;
        self.decode_task(response)
    }

    async fn update(&self, id: TaskId, patch: TaskUpdate) -> Result<Task> {
        let body = self.encode_body(&patch)?;
        let response = self.client.patch(&format!("v1/tasks/{id}"), &body).await?;
        self.decode_task(response)
    }

    async fn delete(&self, id: TaskId) -> Result<bool> {
        self.client.delete(&format!("v1/tasks/{id}")).await
    }
}

#[async_trait]
impl TaskRepository for HttpTaskRepository {
    async fn complete(&self, id: TaskId) -> Result<Task> {
        let response = self
            .client
            .post(&format!("v1/tasks/{id}/close"), None)
            .await?;
        self.decode_task(response)
    }
}
