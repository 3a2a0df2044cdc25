//! Label repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Value};

use super::{like_pattern, opt_text, parse_id, require_text, text, text_value, Database};
use crate::error::Result;
use crate::models::{Label, LabelCreate, LabelFilters, LabelId, LabelUpdate};
use crate::repository::Repository;

/// libSQL implementation of the label repository
pub struct LibSqlLabelRepository {
    db: Arc<Database>,
}

impl LibSqlLabelRepository {
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    async fn query_labels(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Label>> {
        let mut rows = self.conn().query(sql, params).await?;
        let mut labels = Vec::new();
        while let Some(row) = rows.next().await? {
            labels.push(Label {
                id: parse_id(&text(&row, 0)?)?,
                name: text(&row, 1)?,
                color: opt_text(&row, 2)?,
            });
        }
        Ok(labels)
    }
}

#[async_trait]
impl Repository<Label> for LibSqlLabelRepository {
    async fn list_all(&self, filters: &LabelFilters) -> Result<Vec<Label>> {
        match filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(search) => {
                self.query_labels(
                    "SELECT id, name, color FROM labels WHERE LOWER(name) LIKE ? ORDER BY name",
                    vec![Value::Text(like_pattern(search))],
                )
                .await
            }
            None => {
                self.query_labels("SELECT id, name, color FROM labels ORDER BY name", Vec::new())
                    .await
            }
        }
    }

    async fn get_by_id(&self, id: LabelId) -> Result<Option<Label>> {
        let labels = self
            .query_labels(
                "SELECT id, name, color FROM labels WHERE id = ?",
                vec![Value::Text(id.as_str())],
            )
            .await?;
        Ok(labels.into_iter().next())
    }

    async fn create(&self, data: LabelCreate) -> Result<Label> {
        let label = Label {
            id: data.id.unwrap_or_default(),
            name: require_text(&data.name, "name")?,
            color: data.color,
        };

        self.conn()
            .execute(
                "INSERT INTO labels (id, name, color) VALUES (?, ?, ?)",
                vec![
                    Value::Text(label.id.as_str()),
                    Value::Text(label.name.clone()),
                    text_value(label.color.as_deref()),
                ],
            )
            .await?;

        Ok(label)
    }

    async fn update(&self, id: LabelId, patch: LabelUpdate) -> Result<Label> {
        let mut label = self.get(id).await?;
        if let Some(name) = patch.name {
            label.name = require_text(&name, "name")?;
        }
        if let Some(color) = patch.color {
            label.color = color;
        }

        self.conn()
            .execute(
                "UPDATE labels SET name = ?, color = ? WHERE id = ?",
                vec![
                    Value::Text(label.name.clone()),
                    text_value(label.color.as_deref()),
                    Value::Text(label.id.as_str()),
                ],
            )
            .await?;

        Ok(label)
    }

    /// Labels have no tombstone; links to tasks are removed with the row
    async fn delete(&self, id: LabelId) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM labels WHERE id = ?", [id.as_str()])
            .await?;
        Ok(rows > 0)
    }
}
