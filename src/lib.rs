//! Recipe API: a REST CRUD backend generated at startup from a declarative recipe.
//!
//! Each recipe module becomes routes under `/api/{slug}/v1` backed by a PostgreSQL table
//! or a MongoDB collection, optionally behind a named Basic or RS256 token policy.

pub mod auth;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod handlers;
pub mod record;
pub mod response;
pub mod routes;
pub mod server;
pub mod service;
pub mod slug;
pub mod sql;
pub mod state;
pub mod telemetry;

pub use auth::{AuthResolver, Gate, TokenClaims};
pub use config::{load_auto, load_layered, resolve_modules, AppConfig, ModuleDefinition, Operation};
pub use db::{connect_all, Connection, ConnectionRegistry, Engine};
pub use error::{ApiError, ConfigError, DbError, ServerError};
pub use response::{success, Envelope};
pub use routes::{bind_modules, common_routes, module_routes, BindReport};
pub use server::{build_app, run};
pub use service::CrudExecutor;
pub use slug::{base_path, to_slug};
pub use state::{AppState, ModuleState};
pub use telemetry::{init_logging, log_requests};
