//! Project repository backed by the hosted API

use std::sync::Arc;

use async_trait::async_trait;

use super::{contains_ignore_case, decode, decode_list, encode, ApiClient};
use crate::error::{Error, Result};
use crate::models::{Project, ProjectCreate, ProjectFilters, ProjectId, ProjectUpdate};
use crate::repository::{ProjectRepository, Repository};

/// HTTP implementation of `ProjectRepository`
///
/// The hosted API lists every project; filters are applied client-side.
pub struct HttpProjectRepository {
    client: Arc<ApiClient>,
}

impl HttpProjectRepository {
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

fn passes_filters(project: &Project, filters: &ProjectFilters) -> bool {
    filters
        .is_archived
        .map_or(true, |archived| project.is_archived == archived)
        && filters
            .is_favorite
            .map_or(true, |favorite| project.is_favorite == favorite)
        && filters
            .workspace_id
            .as_ref()
            .map_or(true, |workspace| project.workspace_id.as_ref() == Some(workspace))
        && contains_ignore_case(&project.name, filters.search.as_deref())
}

#[async_trait]
impl Repository<Project> for HttpProjectRepository {
    async fn list_all(&self, filters: &ProjectFilters) -> Result<Vec<Project>> {
        let response = self.client.get("v1/projects", &[]).await?;
        let projects: Vec<Project> = decode_list(response, "projects")?;
        Ok(projects
            .into_iter()
            .filter(|project| passes_filters(project, filters))
            .collect())
    }

    async fn get_by_id(&self, id: ProjectId) -> Result<Option<Project>> {
        self.client
            .get_optional(&format!("v1/projects/{id}"))
            .await?
            .map(decode)
            .transpose()
    }

    async fn create(&self, data: ProjectCreate) -> Result<Project> {
        let response = self.client.post("v1/projects", Some(&encode(&data)?)).await?;
        decode(response)
    }

    async fn update(&self, id: ProjectId, patch: ProjectUpdate) -> Result<Project> {
        if id.is_inbox() && patch.violates_inbox_rule() {
            return Err(Error::Protected(
                "the Inbox project cannot be renamed or archived".to_string(),
            ));
        }
        let response = self
            .client
            .patch(&format!("v1/projects/{id}"), &encode(&patch)?)
            .await?;
        decode(response)
    }

    async fn delete(&self, id: ProjectId) -> Result<bool> {
        if id.is_inbox() {
            return Err(Error::Protected(
                "the Inbox project cannot be deleted".to_string(),
            ));
        }
        self.client.delete(&format!("v1/projects/{id}")).await
    }
}

#[async_trait]
impl ProjectRepository for HttpProjectRepository {
    async fn archive(&self, id: ProjectId) -> Result<Project> {
        if id.is_inbox() {
            return Err(Error::Protected(
                "the Inbox project cannot be archived".to_string(),
            ));
        }
        let response = self
            .client
            .post(&format!("v1/projects/{id}/archive"), None)
            .await?;
        decode(response)
    }

    async fn unarchive(&self, id: ProjectId) -> Result<Project> {
        let response = self
            .client
            .post(&format!("v1/projects/{id}/unarchive"), None)
            .await?;
        decode(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(name: &str, is_archived: bool) -> Project {
        Project {
            id: ProjectId::new(),
            name: name.to_string(),
            color: None,
            is_favorite: false,
            is_archived,
            workspace_id: Some("team".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn passes_filters_applies_every_filter() {
        let active = project("Garden", false);
        let archived = project("Old garden", true);

        let filters = ProjectFilters {
            is_archived: Some(false),
            search: Some("GARD".to_string()),
            workspace_id: Some("team".to_string()),
            ..ProjectFilters::default()
        };
        assert!(passes_filters(&active, &filters));
        assert!(!passes_filters(&archived, &filters));

        let other_workspace = ProjectFilters {
            workspace_id: Some("solo".to_string()),
            ..ProjectFilters::default()
        };
        assert!(!passes_filters(&active, &other_workspace));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn inbox_guard_runs_before_any_request() {
        let client = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        let repo = HttpProjectRepository::new(Arc::new(client));

        assert!(matches!(
            repo.delete(ProjectId::INBOX).await,
            Err(Error::Protected(_))
        ));
        assert!(matches!(
            repo.archive(ProjectId::INBOX).await,
            Err(Error::Protected(_))
        ));
    }
}
