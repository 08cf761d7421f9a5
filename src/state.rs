//! State handed to routes. Everything here is immutable after startup.

use crate::config::ModuleDefinition;
use crate::db::ConnectionRegistry;
use crate::service::CrudExecutor;
use std::sync::Arc;

/// Per-module state captured by that module's routes.
#[derive(Clone)]
pub struct ModuleState {
    pub module: Arc<ModuleDefinition>,
    pub executor: Arc<dyn CrudExecutor>,
}

/// Process-wide state for the common routes.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
}
