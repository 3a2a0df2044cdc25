//! Project repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Value};

use super::{
    bool_value, flag, like_pattern, next_updated_at, opt_text, parse_id, require_text, text,
    text_value, timestamp, timestamp_value, Database,
};
use crate::error::{Error, Result};
use crate::models::{Project, ProjectCreate, ProjectFilters, ProjectId, ProjectUpdate};
use crate::repository::{ProjectRepository, Repository};

const PROJECT_COLUMNS: &str =
    "id, name, color, is_favorite, is_archived, workspace_id, created_at, updated_at";

/// libSQL implementation of `ProjectRepository`
pub struct LibSqlProjectRepository {
    db: Arc<Database>,
}

impl LibSqlProjectRepository {
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    fn parse_project(row: &libsql::Row) -> Result<Project> {
        Ok(Project {
            id: parse_id(&text(row, 0)?)?,
            name: text(row, 1)?,
            color: opt_text(row, 2)?,
            is_favorite: flag(row, 3)?,
            is_archived: flag(row, 4)?,
            workspace_id: opt_text(row, 5)?,
            created_at: timestamp(row, 6)?,
            updated_at: timestamp(row, 7)?,
        })
    }

    async fn query_projects(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Project>> {
        let mut rows = self.conn().query(sql, params).await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(Self::parse_project(&row)?);
        }
        Ok(projects)
    }

    async fn save(&self, project: &Project) -> Result<()> {
        self.conn()
            .execute(
                "UPDATE projects SET name = ?, color = ?, is_favorite = ?, is_archived = ?, \
                 workspace_id = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
                vec![
                    Value::Text(project.name.clone()),
                    text_value(project.color.as_deref()),
                    bool_value(project.is_favorite),
                    bool_value(project.is_archived),
                    text_value(project.workspace_id.as_deref()),
                    timestamp_value(Some(&project.updated_at)),
                    Value::Text(project.id.as_str()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn set_archived(&self, id: ProjectId, is_archived: bool) -> Result<Project> {
        self.update(
            id,
            ProjectUpdate {
                is_archived: Some(is_archived),
                ..ProjectUpdate::default()
            },
        )
        .await
    }
}

#[async_trait]
impl Repository<Project> for LibSqlProjectRepository {
    async fn list_all(&self, filters: &ProjectFilters) -> Result<Vec<Project>> {
        let mut sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE deleted_at IS NULL");
        let mut params: Vec<Value> = Vec::new();

        if let Some(is_archived) = filters.is_archived {
            sql.push_str(" AND is_archived = ?");
            params.push(bool_value(is_archived));
        }
        if let Some(is_favorite) = filters.is_favorite {
            sql.push_str(" AND is_favorite = ?");
            params.push(bool_value(is_favorite));
        }
        if let Some(workspace_id) = &filters.workspace_id {
            sql.push_str(" AND workspace_id = ?");
            params.push(Value::Text(workspace_id.clone()));
        }
        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            sql.push_str(" AND LOWER(name) LIKE ?");
            params.push(Value::Text(like_pattern(search)));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        self.query_projects(&sql, params).await
    }

    async fn get_by_id(&self, id: ProjectId) -> Result<Option<Project>> {
        let sql =
            format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ? AND deleted_at IS NULL");
        let projects = self
            .query_projects(&sql, vec![Value::Text(id.as_str())])
            .await?;
        Ok(projects.into_iter().next())
    }

    async fn create(&self, data: ProjectCreate) -> Result<Project> {
        let now = Utc::now();
        let project = Project {
            id: data.id.unwrap_or_default(),
            name: require_text(&data.name, "name")?,
            color: data.color,
            is_favorite: data.is_favorite,
            is_archived: data.is_archived,
            workspace_id: data.workspace_id,
            created_at: data.created_at.unwrap_or(now),
            updated_at: data.updated_at.unwrap_or(now),
        };

        let tx = self.conn().transaction().await?;
        tx.execute(
            "DELETE FROM projects WHERE id = ? AND deleted_at IS NOT NULL",
            [project.id.as_str()],
        )
        .await?;
        tx.execute(
            "INSERT INTO projects (id, name, color, is_favorite, is_archived, workspace_id, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                Value::Text(project.id.as_str()),
                Value::Text(project.name.clone()),
                text_value(project.color.as_deref()),
                bool_value(project.is_favorite),
                bool_value(project.is_archived),
                text_value(project.workspace_id.as_deref()),
                timestamp_value(Some(&project.created_at)),
                timestamp_value(Some(&project.updated_at)),
            ],
        )
        .await?;
        tx.commit().await?;

        Ok(project)
    }

    async fn update(&self, id: ProjectId, patch: ProjectUpdate) -> Result<Project> {
        if id.is_inbox() && patch.violates_inbox_rule() {
            return Err(Error::Protected(
                "the Inbox project cannot be renamed or archived".to_string(),
            ));
        }

        let mut project = self.get(id).await?;
        let previous_updated_at = project.updated_at;

        if let Some(name) = patch.name {
            project.name = require_text(&name, "name")?;
        }
        if let Some(color) = patch.color {
            project.color = color;
        }
        if let Some(is_favorite) = patch.is_favorite {
            project.is_favorite = is_favorite;
        }
        if let Some(is_archived) = patch.is_archived {
            project.is_archived = is_archived;
        }
        if let Some(workspace_id) = patch.workspace_id {
            project.workspace_id = workspace_id;
        }
        project.updated_at = patch
            .updated_at
            .unwrap_or_else(|| next_updated_at(previous_updated_at));

        self.save(&project).await?;
        Ok(project)
    }

    async fn delete(&self, id: ProjectId) -> Result<bool> {
        if id.is_inbox() {
            return Err(Error::Protected(
                "the Inbox project cannot be deleted".to_string(),
            ));
        }
        let Some(project) = self.get_by_id(id).await? else {
            return Ok(false);
        };
        let now = next_updated_at(project.updated_at);

        // Tasks fall back to no project rather than pointing at a tombstone
        let tx = self.conn().transaction().await?;
        tx.execute(
            "UPDATE tasks SET project_id = NULL WHERE project_id = ?",
            [id.as_str()],
        )
        .await?;
        let rows = tx
            .execute(
                "UPDATE projects SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
                vec![
                    timestamp_value(Some(&now)),
                    timestamp_value(Some(&now)),
                    Value::Text(id.as_str()),
                ],
            )
            .await?;
        tx.commit().await?;

        Ok(rows > 0)
    }
}

#[async_trait]
impl ProjectRepository for LibSqlProjectRepository {
    async fn archive(&self, id: ProjectId) -> Result<Project> {
        self.set_archived(id, true).await
    }

    async fn unarchive(&self, id: ProjectId) -> Result<Project> {
        self.set_archived(id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalStore;
    use crate::models::{TaskCreate, INBOX_NAME};

    async fn setup() -> LocalStore {
        LocalStore::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_inbox_exists_in_fresh_store() {
        let store = setup().await;
        let inbox = store.projects().get(ProjectId::INBOX).await.unwrap();

        assert_eq!(inbox.name, INBOX_NAME);
        assert_eq!(inbox.updated_at.timestamp(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_and_list() {
        let store = setup().await;
        let repo = store.projects();

        let project = repo
            .create(ProjectCreate {
                is_favorite: true,
                ..ProjectCreate::new("Launch")
            })
            .await
            .unwrap();

        let all = repo.list_all(&ProjectFilters::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let favorites = repo
            .list_all(&ProjectFilters {
                is_favorite: Some(true),
                ..ProjectFilters::default()
            })
            .await
            .unwrap();
        assert_eq!(favorites, vec![project]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_archive_and_unarchive() {
        let store = setup().await;
        let repo = store.projects();
        let project = repo.create(ProjectCreate::new("Old")).await.unwrap();

        let archived = repo.archive(project.id).await.unwrap();
        assert!(archived.is_archived);
        assert!(archived.updated_at > project.updated_at);

        let active = repo
            .list_all(&ProjectFilters {
                is_archived: Some(false),
                ..ProjectFilters::default()
            })
            .await
            .unwrap();
        assert!(active.iter().all(|p| p.id != project.id));

        let restored = repo.unarchive(project.id).await.unwrap();
        assert!(!restored.is_archived);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_inbox_is_protected() {
        let store = setup().await;
        let repo = store.projects();

        assert!(matches!(
            repo.archive(ProjectId::INBOX).await,
            Err(Error::Protected(_))
        ));
        assert!(matches!(
            repo.update(
                ProjectId::INBOX,
                ProjectUpdate {
                    name: Some("Triage".to_string()),
                    ..ProjectUpdate::default()
                }
            )
            .await,
            Err(Error::Protected(_))
        ));
        assert!(matches!(
            repo.delete(ProjectId::INBOX).await,
            Err(Error::Protected(_))
        ));

        let recolored = repo
            .update(
                ProjectId::INBOX,
                ProjectUpdate {
                    color: Some(Some("#ff0000".to_string())),
                    ..ProjectUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(recolored.color.as_deref(), Some("#ff0000"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_detaches_tasks() {
        let store = setup().await;
        let project = store
            .projects()
            .create(ProjectCreate::new("Doomed"))
            .await
            .unwrap();
        let task = store
            .tasks()
            .create(TaskCreate {
                project_id: Some(project.id),
                ..TaskCreate::new("Survivor")
            })
            .await
            .unwrap();

        assert!(store.projects().delete(project.id).await.unwrap());
        assert!(store.projects().get_by_id(project.id).await.unwrap().is_none());

        let task = store.tasks().get(task.id).await.unwrap();
        assert!(task.project_id.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_search_is_case_insensitive() {
        let store = setup().await;
        let repo = store.projects();
        repo.create(ProjectCreate::new("Garden Plans")).await.unwrap();

        let found = repo
            .list_all(&ProjectFilters {
                search: Some("garden".to_string()),
                ..ProjectFilters::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
