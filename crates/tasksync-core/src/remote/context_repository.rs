//! Location context repository backed by the hosted API

use std::sync::Arc;

use async_trait::async_trait;

use super::{contains_ignore_case, decode, decode_list, encode, ApiClient};
use crate::error::{Error, Result};
use crate::models::{
    validate_geofence, Context, ContextCreate, ContextFilters, ContextId, ContextUpdate,
};
use crate::repository::Repository;

pub struct HttpContextRepository {
    client: Arc<ApiClient>,
}

impl HttpContextRepository {
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Repository<Context> for HttpContextRepository {
    async fn list_all(&self, filters: &ContextFilters) -> Result<Vec<Context>> {
        let response = self.client.get("v1/contexts", &[]).await?;
        let contexts: Vec<Context> = decode_list(response, "contexts")?;
        Ok(contexts
            .into_iter()
            .filter(|context| contains_ignore_case(&context.name, filters.search.as_deref()))
            .collect())
    }

    async fn get_by_id(&self, id: ContextId) -> Result<Option<Context>> {
        self.client
            .get_optional(&format!("v1/contexts/{id}"))
            .await?
            .map(decode)
            .transpose()
    }

    async fn create(&self, data: ContextCreate) -> Result<Context> {
        data.validate().map_err(Error::InvalidInput)?;
        let response = self.client.post("v1/contexts", Some(&encode(&data)?)).await?;
        decode(response)
    }

    async fn update(&self, id: ContextId, patch: ContextUpdate) -> Result<Context> {
        // Partial coordinates can only be checked against the stored geofence
        if let (Some(latitude), Some(longitude), Some(radius)) =
            (patch.latitude, patch.longitude, patch.radius)
        {
            validate_geofence(latitude, longitude, radius).map_err(Error::InvalidInput)?;
        }
        let response = self
            .client
            .patch(&format!("v1/contexts/{id}"), &encode(&patch)?)
            .await?;
        decode(response)
    }

    async fn delete(&self, id: ContextId) -> Result<bool> {
        self.client.delete(&format!("v1/contexts/{id}")).await
    }
}
