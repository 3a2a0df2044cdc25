//! Label repository backed by the hosted API

use std::sync::Arc;

use async_trait::async_trait;

use super::{contains_ignore_case, decode, decode_list, encode, ApiClient};
use crate::error::Result;
use crate::models::{Label, LabelCreate, LabelFilters, LabelId, LabelUpdate};
use crate::repository::Repository;

pub struct HttpLabelRepository {
    client: Arc<ApiClient>,
}

impl HttpLabelRepository {
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Repository<Label> for HttpLabelRepository {
    async fn list_all(&self, filters: &LabelFilters) -> Result<Vec<Label>> {
        let response = self.client.get("v1/labels", &[]).await?;
        let labels: Vec<Label> = decode_list(response, "labels")?;
        Ok(labels
            .into_iter()
            .filter(|label| contains_ignore_case(&label.name, filters.search.as_deref()))
            .collect())
    }

    async fn get_by_id(&self, id: LabelId) -> Result<Option<Label>> {
        self.client
            .get_optional(&format!("v1/labels/{id}"))
            .await?
            .map(decode)
            .transpose()
    }

    async fn create(&self, data: LabelCreate) -> Result<Label> {
        let response = self.client.post("v1/labels", Some(&encode(&data)?)).await?;
        decode(response)
    }

    async fn update(&self, id: LabelId, patch: LabelUpdate) -> Result<Label> {
        let response = self
            .client
            .patch(&format!("v1/labels/{id}"), &encode(&patch)?)
            .await?;
        decode(response)
    }

    async fn delete(&self, id: LabelId) -> Result<bool> {
        self.client.delete(&format!("v1/labels/{id}")).await
    }
}
