//! Location context repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Value};

use super::{like_pattern, parse_id, require_text, text, Database};
use crate::error::{Error, Result};
use crate::models::{
    validate_geofence, Context, ContextCreate, ContextFilters, ContextId, ContextUpdate,
};
use crate::repository::Repository;

const CONTEXT_COLUMNS: &str = "id, name, latitude, longitude, radius";

/// libSQL implementation of the context repository
pub struct LibSqlContextRepository {
    db: Arc<Database>,
}

impl LibSqlContextRepository {
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }

    async fn query_contexts(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Context>> {
        let mut rows = self.conn().query(sql, params).await?;
        let mut contexts = Vec::new();
        while let Some(row) = rows.next().await? {
            contexts.push(Context {
                id: parse_id(&text(&row, 0)?)?,
                name: text(&row, 1)?,
                latitude: row.get::<f64>(2)?,
                longitude: row.get::<f64>(3)?,
                radius: row.get::<f64>(4)?,
            });
        }
        Ok(contexts)
    }
}

#[async_trait]
impl Repository<Context> for LibSqlContextRepository {
    async fn list_all(&self, filters: &ContextFilters) -> Result<Vec<Context>> {
        let mut sql = format!("SELECT {CONTEXT_COLUMNS} FROM contexts");
        let mut params = Vec::new();
        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            sql.push_str(" WHERE LOWER(name) LIKE ?");
            params.push(Value::Text(like_pattern(search)));
        }
        sql.push_str(" ORDER BY name");

        self.query_contexts(&sql, params).await
    }

    async fn get_by_id(&self, id: ContextId) -> Result<Option<Context>> {
        let sql = format!("SELECT {CONTEXT_COLUMNS} FROM contexts WHERE id = ?");
        let contexts = self
            .query_contexts(&sql, vec![Value::Text(id.as_str())])
            .await?;
        Ok(contexts.into_iter().next())
    }

    async fn create(&self, data: ContextCreate) -> Result<Context> {
        data.validate().map_err(Error::InvalidInput)?;
        let context = Context {
            id: data.id.unwrap_or_default(),
            name: require_text(&data.name, "name")?,
            latitude: data.latitude,
            longitude: data.longitude,
            radius: data.radius,
        };

        self.conn()
            .execute(
                "INSERT INTO contexts (id, name, latitude, longitude, radius) VALUES (?, ?, ?, ?, ?)",
                vec![
                    Value::Text(context.id.as_str()),
                    Value::Text(context.name.clone()),
                    Value::Real(context.latitude),
                    Value::Real(context.longitude),
                    Value::Real(context.radius),
                ],
            )
            .await?;

        Ok(context)
    }

    async fn update(&self, id: ContextId, patch: ContextUpdate) -> Result<Context> {
        let mut context = self.get(id).await?;
        if let Some(name) = patch.name {
            context.name = require_text(&name, "name")?;
        }
        context.latitude = patch.latitude.unwrap_or(context.latitude);
        context.longitude = patch.longitude.unwrap_or(context.longitude);
        context.radius = patch.radius.unwrap_or(context.radius);
        validate_geofence(context.latitude, context.longitude, context.radius)
            .map_err(Error::InvalidInput)?;

        self.conn()
            .execute(
                "UPDATE contexts SET name = ?, latitude = ?, longitude = ?, radius = ? WHERE id = ?",
                vec![
                    Value::Text(context.name.clone()),
                    Value::Real(context.latitude),
                    Value::Real(context.longitude),
                    Value::Real(context.radius),
                    Value::Text(context.id.as_str()),
                ],
            )
            .await?;

        Ok(context)
    }

    async fn delete(&self, id: ContextId) -> Result<bool> {
        let tx = self.conn().transaction().await?;
        tx.execute(
            "DELETE FROM task_contexts WHERE context_id = ?",
            [id.as_str()],
        )
        .await?;
        let rows = tx
            .execute("DELETE FROM contexts WHERE id = ?", [id.as_str()])
            .await?;
        tx.commit().await?;
        Ok(rows > 0)
    }
}
