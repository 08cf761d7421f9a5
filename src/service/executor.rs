//! The CRUD contract shared by both engines, and the per-module factory.

use crate::config::{validate_document, validate_relational, ModuleDefinition};
use crate::db::{Connection, ConnectionRegistry};
use crate::error::{ApiError, ConfigError};
use crate::service::{DocumentExecutor, RelationalExecutor};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// One store round-trip per call. Implementations hold only immutable state.
#[async_trait]
pub trait CrudExecutor: Send + Sync {
    /// Insert and return the generated `id`.
    async fn create(&self, body: Map<String, Value>) -> Result<String, ApiError>;

    async fn read_list(&self) -> Result<Vec<Value>, ApiError>;

    /// `Ok(None)` when no record has this `id`.
    async fn read_single(&self, id: &str) -> Result<Option<Value>, ApiError>;

    async fn update(&self, id: &str, body: Map<String, Value>) -> Result<(), ApiError>;

    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

/// Picks the executor for the module's connection and applies that engine's naming rules.
/// Resolved once, at registration.
pub fn executor_for(
    module: &Arc<ModuleDefinition>,
    registry: &ConnectionRegistry,
) -> Result<Arc<dyn CrudExecutor>, ConfigError> {
    let conn = registry.get(&module.database).ok_or_else(|| {
        match registry.unsupported_engine(&module.database) {
            Some(engine) => ConfigError::UnsupportedEngine {
                name: module.database.clone(),
                engine: engine.to_string(),
            },
            None => ConfigError::MissingReference {
                kind: "database",
                id: module.database.clone(),
            },
        }
    })?;
    let executor: Arc<dyn CrudExecutor> = match conn {
        Connection::Relational(pool) => {
            validate_relational(module)?;
            Arc::new(RelationalExecutor::new(pool.clone(), module.clone()))
        }
        Connection::Document(db) => {
            validate_document(module)?;
            Arc::new(DocumentExecutor::new(db.collection(&module.table), module.clone()))
        }
    };
    Ok(executor)
}
