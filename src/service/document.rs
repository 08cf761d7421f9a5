//! CRUD execution against a MongoDB collection.

use crate::config::ModuleDefinition;
use crate::document::{document_to_record, id_filter, insert_document, list_filter, update_document};
use crate::error::ApiError;
use crate::service::CrudExecutor;
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::Collection;
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct DocumentExecutor {
    collection: Collection<Document>,
    module: Arc<ModuleDefinition>,
}

impl DocumentExecutor {
    pub fn new(collection: Collection<Document>, module: Arc<ModuleDefinition>) -> Self {
        DocumentExecutor { collection, module }
    }
}

#[async_trait]
impl CrudExecutor for DocumentExecutor {
    async fn create(&self, body: Map<String, Value>) -> Result<String, ApiError> {
        let id = uuid::Uuid::new_v4().to_string();
        let d = insert_document(body, &id, Utc::now())?;
        tracing::debug!(module = %self.module.name, doc = ?d, "insert_one");
        self.collection.insert_one(d).await?;
        Ok(id)
    }

    async fn read_list(&self) -> Result<Vec<Value>, ApiError> {
        let cursor = self.collection.find(list_filter()).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(document_to_record).collect())
    }

    async fn read_single(&self, id: &str) -> Result<Option<Value>, ApiError> {
        let found = self.collection.find_one(id_filter(id)).await?;
        Ok(found.map(document_to_record))
    }

    async fn update(&self, id: &str, body: Map<String, Value>) -> Result<(), ApiError> {
        let u = update_document(body, Utc::now())?;
        tracing::debug!(module = %self.module.name, id = %id, update = ?u, "update_one");
        let result = self.collection.update_one(id_filter(id), u).await?;
        tracing::debug!(module = %self.module.name, matched = result.matched_count, "updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let result = self.collection.delete_one(id_filter(id)).await?;
        tracing::debug!(module = %self.module.name, deleted = result.deleted_count, "deleted");
        Ok(())
    }
}
