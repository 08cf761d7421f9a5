//! CRUD execution against PostgreSQL.

use crate::config::ModuleDefinition;
use crate::error::ApiError;
use crate::record::FieldValues;
use crate::service::CrudExecutor;
use crate::sql::{delete, insert, select_by_id, select_list, update, QueryBuf};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row};
use std::sync::Arc;

pub struct RelationalExecutor {
    pool: PgPool,
    module: Arc<ModuleDefinition>,
}

impl RelationalExecutor {
    pub fn new(pool: PgPool, module: Arc<ModuleDefinition>) -> Self {
        RelationalExecutor { pool, module }
    }

    fn bound(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query
    }

    fn values(&self, body: &Map<String, Value>) -> Result<FieldValues, ApiError> {
        FieldValues::from_body(&self.module.fields, body)
    }
}

/// Columns are selected as text, so every cell is a string or null.
fn row_to_record(row: &PgRow) -> Result<Value, ApiError> {
    let mut map = Map::new();
    for col in row.columns() {
        let v: Option<String> = row.try_get(col.ordinal())?;
        map.insert(col.name().to_string(), v.map(Value::String).unwrap_or(Value::Null));
    }
    Ok(Value::Object(map))
}

#[async_trait]
impl CrudExecutor for RelationalExecutor {
    async fn create(&self, body: Map<String, Value>) -> Result<String, ApiError> {
        let values = self.values(&body)?;
        let q = insert(&self.module, &values, uuid::Uuid::new_v4(), Utc::now());
        let row = Self::bound(&q).fetch_one(&self.pool).await?;
        let id: String = row.try_get(0)?;
        Ok(id)
    }

    async fn read_list(&self) -> Result<Vec<Value>, ApiError> {
        let q = select_list(&self.module);
        let rows = Self::bound(&q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn read_single(&self, id: &str) -> Result<Option<Value>, ApiError> {
        let q = select_by_id(&self.module, id);
        let row = Self::bound(&q).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn update(&self, id: &str, body: Map<String, Value>) -> Result<(), ApiError> {
        let values = self.values(&body)?;
        let q = update(&self.module, id, &values, Utc::now())?;
        let done = Self::bound(&q).execute(&self.pool).await?;
        tracing::debug!(module = %self.module.name, id = %id, rows = done.rows_affected(), "updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let q = delete(&self.module, id);
        let done = Self::bound(&q).execute(&self.pool).await?;
        tracing::debug!(module = %self.module.name, id = %id, rows = done.rows_affected(), "deleted");
        Ok(())
    }
}
