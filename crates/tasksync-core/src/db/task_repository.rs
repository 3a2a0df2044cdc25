//! Task repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Value};

use super::{
    bool_value, flag, like_pattern, next_updated_at, opt_text, opt_timestamp, parse_id,
    require_text, text, text_value, timestamp, timestamp_value, Database,
};
use crate::error::{Error, Result};
use crate::models::{
    ContextId, LabelId, Task, TaskCreate, TaskFilters, TaskId, TaskStatus,
    TaskUpdate, DEFAULT_PRIORITY,
};
use crate::repository::{Repository, TaskRepository};

const TASK_COLUMNS: &str = "id, content, description, priority, project_id, due_date, \
     is_completed, completed_at, created_at, updated_at, deleted_at";

/// libSQL implementation of `TaskRepository`
pub struct LibSqlTaskRepository {
    db: Arc<Database>,
}

impl LibSqlTaskRepository {
    /// Create a new repository over the given database
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    /// Parse a task from a database row; label and context ids are loaded separately
    fn parse_task(row: &libsql::Row) -> Result<Task> {
        Ok(Task {
            id: parse_id(&text(row, 0)?)?,
            content: text(row, 1)?,
            description: opt_text(row, 2)?,
            priority: u8::try_from(row.get::<i64>(3)?).unwrap_or(DEFAULT_PRIORITY),
            project_id: opt_text(row, 4)?.as_deref().map(parse_id).transpose()?,
            label_ids: Vec::new(),
            context_ids: Vec::new(),
            due_date: opt_timestamp(row, 5)?,
            is_completed: flag(row, 6)?,
            completed_at: opt_timestamp(row, 7)?,
            created_at: timestamp(row, 8)?,
            updated_at: timestamp(row, 9)?,
            deleted_at: opt_timestamp(row, 10)?,
        })
    }

    async fn query_tasks(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Task>> {
        let mut rows = self.conn().query(sql, params).await?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(Self::parse_task(&row)?);
        }
        for task in &mut tasks {
            self.load_links(task).await?;
        }
        Ok(tasks)
    }

    async fn load_links(&self, task: &mut Task) -> Result<()> {
        let mut rows = self
            .conn()
            .query(
                "SELECT label_id FROM task_labels WHERE task_id = ? ORDER BY label_id",
                [task.id.as_str()],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            task.label_ids.push(parse_id::<LabelId>(&text(&row, 0)?)?);
        }

        let mut rows = self
            .conn()
            .query(
                "SELECT context_id FROM task_contexts WHERE task_id = ? ORDER BY context_id",
                [task.id.as_str()],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            task.context_ids.push(parse_id::<ContextId>(&text(&row, 0)?)?);
        }
        Ok(())
    }

    /// Replace label and context links for a task
    async fn write_links(
        conn: &Connection,
        id: TaskId,
        label_ids: &[LabelId],
        context_ids: &[ContextId],
    ) -> Result<()> {
        conn.execute("DELETE FROM task_labels WHERE task_id = ?", [id.as_str()])
            .await?;
        for label_id in label_ids {
            conn.execute(
                "INSERT OR IGNORE INTO task_labels (task_id, label_id) VALUES (?, ?)",
                [id.as_str(), label_id.as_str()],
            )
            .await?;
        }

        conn.execute("DELETE FROM task_contexts WHERE task_id = ?", [id.as_str()])
            .await?;
        for context_id in context_ids {
            conn.execute(
                "INSERT OR IGNORE INTO task_contexts (task_id, context_id) VALUES (?, ?)",
                [id.as_str(), context_id.as_str()],
            )
            .await?;
        }
        Ok(())
    }

    fn task_row_values(task: &Task) -> Vec<Value> {
        vec![
            Value::Text(task.content.clone()),
            text_value(task.description.as_deref()),
            Value::Integer(i64::from(task.priority)),
            text_value(task.project_id.map(|id| id.as_str()).as_deref()),
            timestamp_value(task.due_date.as_ref()),
            bool_value(task.is_completed),
            timestamp_value(task.completed_at.as_ref()),
            timestamp_value(Some(&task.created_at)),
            timestamp_value(Some(&task.updated_at)),
            Value::Text(task.id.as_str()),
        ]
    }

    async fn insert(&self, task: &Task) -> Result<()> {
        let tx = self.conn().transaction().await?;

        // A tombstoned row with the same id is replaced, reviving the task
        tx.execute(
            "DELETE FROM tasks WHERE id = ? AND deleted_at IS NOT NULL",
            [task.id.as_str()],
        )
        .await?;
        tx.execute(
            "INSERT INTO tasks (content, description, priority, project_id, due_date, \
             is_completed, completed_at, created_at, updated_at, id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            Self::task_row_values(task),
        )
        .await?;
        Self::write_links(&tx, task.id, &task.label_ids, &task.context_ids).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn save(&self, task: &Task, links_changed: bool) -> Result<()> {
        let tx = self.conn().transaction().await?;

        tx.execute(
            "UPDATE tasks SET content = ?, description = ?, priority = ?, project_id = ?, \
             due_date = ?, is_completed = ?, completed_at = ?, created_at = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
            Self::task_row_values(task),
        )
        .await?;
        if links_changed {
            Self::write_links(&tx, task.id, &task.label_ids, &task.context_ids).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn validate_priority(priority: u8) -> Result<u8> {
    if (1..=4).contains(&priority) {
        Ok(priority)
    } else {
        Err(Error::InvalidInput(format!(
            "priority must be between 1 and 4, got {priority}"
        )))
    }
}

/// Apply a patch to a task, returning whether links changed
fn apply_update(task: &mut Task, patch: TaskUpdate) -> Result<bool> {
    let previous_updated_at = task.updated_at;

    if let Some(content) = patch.content {
        task.content = require_text(&content, "content")?;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(priority) = patch.priority {
        task.priority = validate_priority(priority)?;
    }
    if let Some(project_id) = patch.project_id {
        task.project_id = project_id;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
    if let Some(is_completed) = patch.is_completed {
        if is_completed && !task.is_completed {
            task.completed_at = Some(Utc::now());
        } else if !is_completed {
            task.completed_at = None;
        }
        task.is_completed = is_completed;
    }
    if let Some(completed_at) = patch.completed_at {
        task.completed_at = completed_at;
    }

    let links_changed = patch.label_ids.is_some() || patch.context_ids.is_some();
    if let Some(label_ids) = patch.label_ids {
        task.label_ids = label_ids;
    }
    if let Some(context_ids) = patch.context_ids {
        task.context_ids = context_ids;
    }

    task.updated_at = patch
        .updated_at
        .unwrap_or_else(|| next_updated_at(previous_updated_at));
    Ok(links_changed)
}

#[async_trait]
impl Repository<Task> for LibSqlTaskRepository {
    async fn list_all(&self, filters: &TaskFilters) -> Result<Vec<Task>> {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE deleted_at IS NULL");
        let mut params: Vec<Value> = Vec::new();

        match filters.status {
            TaskStatus::Active => sql.push_str(" AND is_completed = 0"),
            TaskStatus::Completed => sql.push_str(" AND is_completed = 1"),
            TaskStatus::All => {}
        }
        if let Some(project_id) = filters.project_id {
            sql.push_str(" AND project_id = ?");
            params.push(Value::Text(project_id.as_str()));
        }
        if let Some(priority) = filters.priority {
            sql.push_str(" AND priority = ?");
            params.push(Value::Integer(i64::from(priority)));
        }
        if let Some(label_id) = filters.label_id {
            sql.push_str(" AND id IN (SELECT task_id FROM task_labels WHERE label_id = ?)");
            params.push(Value::Text(label_id.as_str()));
        }
        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            sql.push_str(" AND LOWER(content) LIKE ?");
            params.push(Value::Text(like_pattern(search)));
        }

        sql.push_str(" ORDER BY created_at ASC, id ASC");
        if filters.limit.is_some() || filters.offset.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(
                filters
                    .limit
                    .map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX)),
            ));
            params.push(Value::Integer(
                i64::try_from(filters.offset.unwrap_or(0)).unwrap_or(i64::MAX),
            ));
        }

        self.query_tasks(&sql, params).await
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND deleted_at IS NULL");
        let tasks = self
            .query_tasks(&sql, vec![Value::Text(id.as_str())])
            .await?;
        Ok(tasks.into_iter().next())
    }

    async fn create(&self, data: TaskCreate) -> Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: data.id.unwrap_or_default(),
            content: require_text(&data.content, "content")?,
            description: data.description,
            priority: validate_priority(data.priority.unwrap_or(DEFAULT_PRIORITY))?,
            project_id: data.project_id,
            label_ids: data.label_ids,
            context_ids: data.context_ids,
            due_date: data.due_date,
            is_completed: data.is_completed,
            completed_at: data
                .completed_at
                .or_else(|| data.is_completed.then_some(now)),
            created_at: data.created_at.unwrap_or(now),
            updated_at: data.updated_at.unwrap_or(now),
            deleted_at: None,
        };

        self.insert(&task).await?;
        Ok(task)
    }

    async fn update(&self, id: TaskId, patch: TaskUpdate) -> Result<Task> {
        let mut task = self.get(id).await?;
        let links_changed = apply_update(&mut task, patch)?;
        self.save(&task, links_changed).await?;
        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> Result<bool> {
        let Some(task) = self.get_by_id(id).await? else {
            return Ok(false);
        };
        let now = next_updated_at(task.updated_at);

        let rows = self
            .conn()
            .execute(
                "UPDATE tasks SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
                vec![
                    timestamp_value(Some(&now)),
                    timestamp_value(Some(&now)),
                    Value::Text(id.as_str()),
                ],
            )
            .await?;

        Ok(rows > 0)
    }
}

#[async_trait]
impl TaskRepository for LibSqlTaskRepository {
    async fn complete(&self, id: TaskId) -> Result<Task> {
        self.update(
            id,
            TaskUpdate {
                is_completed: Some(true),
                ..TaskUpdate::default()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalStore;
    use crate::models::{LabelCreate, ProjectCreate, ProjectId, ResourceType};
    use chrono::{Duration, TimeZone};

    async fn setup() -> LocalStore {
        LocalStore::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_and_get() {
        let store = setup().await;
        let repo = store.tasks();

        let task = repo.create(TaskCreate::new("Write report")).await.unwrap();
        assert_eq!(task.priority, DEFAULT_PRIORITY);
        assert_eq!(task.created_at, task.updated_at);

        let fetched = repo.get(task.id).await.unwrap();
        assert_eq!(fetched, task);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_preserves_supplied_identity() {
        let store = setup().await;
        let repo = store.tasks();
        let id = TaskId::new();
        let stamp = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
            + Duration::nanoseconds(123_456_789);

        let task = repo
            .create(TaskCreate {
                id: Some(id),
                created_at: Some(stamp),
                updated_at: Some(stamp),
                ..TaskCreate::new("Replicated")
            })
            .await
            .unwrap();

        let fetched = repo.get(id).await.unwrap();
        assert_eq!(task.id, id);
        assert_eq!(fetched.updated_at, stamp);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_rejects_empty_content_and_bad_priority() {
        let store = setup().await;
        let repo = store.tasks();

        assert!(matches!(
            repo.create(TaskCreate::new("   ")).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            repo.create(TaskCreate {
                priority: Some(7),
                ..TaskCreate::new("x")
            })
            .await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_missing_is_not_found_but_get_by_id_is_none() {
        let store = setup().await;
        let repo = store.tasks();
        let id = TaskId::new();

        assert!(repo.get_by_id(id).await.unwrap().is_none());
        assert!(matches!(
            repo.get(id).await,
            Err(Error::NotFound {
                resource: ResourceType::Task,
                ..
            })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_strictly_increases_updated_at() {
        let store = setup().await;
        let repo = store.tasks();

        let task = repo.create(TaskCreate::new("Original")).await.unwrap();
        let updated = repo
            .update(
                task.id,
                TaskUpdate {
                    content: Some("Updated".to_string()),
                    ..TaskUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "Updated");
        assert!(updated.updated_at > task.updated_at);
        assert_eq!(repo.get(task.id).await.unwrap(), updated);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_labels_and_project_links() {
        let store = setup().await;
        let repo = store.tasks();
        let label = store.labels().create(LabelCreate::new("@work")).await.unwrap();
        let project = store
            .projects()
            .create(ProjectCreate::new("Launch"))
            .await
            .unwrap();

        let task = repo
            .create(TaskCreate {
                project_id: Some(project.id),
                label_ids: vec![label.id],
                ..TaskCreate::new("Ship it")
            })
            .await
            .unwrap();

        let by_label = repo
            .list_all(&TaskFilters {
                label_id: Some(label.id),
                ..TaskFilters::default()
            })
            .await
            .unwrap();
        assert_eq!(by_label.len(), 1);
        assert_eq!(by_label[0].label_ids, vec![label.id]);
        assert_eq!(by_label[0].project_id, Some(project.id));

        let cleared = repo
            .update(
                task.id,
                TaskUpdate {
                    label_ids: Some(Vec::new()),
                    project_id: Some(None),
                    ..TaskUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.label_ids.is_empty());
        assert!(cleared.project_id.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_project_is_rejected() {
        let store = setup().await;
        let result = store
            .tasks()
            .create(TaskCreate {
                project_id: Some(ProjectId::new()),
                ..TaskCreate::new("Orphan")
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_complete_and_status_filter() {
        let store = setup().await;
        let repo = store.tasks();

        let done = repo.create(TaskCreate::new("Done")).await.unwrap();
        repo.create(TaskCreate::new("Open")).await.unwrap();

        let completed = repo.complete(done.id).await.unwrap();
        assert!(completed.is_completed);
        assert!(completed.completed_at.is_some());

        let active = repo
            .list_all(&TaskFilters {
                status: TaskStatus::Active,
                ..TaskFilters::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].content, "Open");

        assert_eq!(repo.list_all(&TaskFilters::default()).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_soft_delete_hides_and_recreate_revives() {
        let store = setup().await;
        let repo = store.tasks();

        let task = repo.create(TaskCreate::new("Temporary")).await.unwrap();
        assert!(repo.delete(task.id).await.unwrap());
        assert!(!repo.delete(task.id).await.unwrap());
        assert!(repo.get_by_id(task.id).await.unwrap().is_none());
        assert!(repo.list_all(&TaskFilters::default()).await.unwrap().is_empty());

        let revived = repo
            .create(TaskCreate {
                id: Some(task.id),
                ..TaskCreate::new("Temporary")
            })
            .await
            .unwrap();
        assert_eq!(revived.id, task.id);
        assert!(repo.get_by_id(task.id).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_search_and_pagination() {
        let store = setup().await;
        let repo = store.tasks();

        repo.create(TaskCreate::new("Call Alice")).await.unwrap();
        repo.create(TaskCreate::new("call Bob")).await.unwrap();
        repo.create(TaskCreate::new("Email Carol")).await.unwrap();

        let calls = repo
            .list_all(&TaskFilters {
                search: Some("CALL".to_string()),
                ..TaskFilters::default()
            })
            .await
            .unwrap();
        assert_eq!(calls.len(), 2);

        let page = repo
            .list_all(&TaskFilters {
                limit: Some(1),
                offset: Some(1),
                ..TaskFilters::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
    }
}
