//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::Envelope;

pub const MSG_INVALID_VALUE: &str = "Invalid field value";

/// Registration-time errors. Fatal to the module that hit them, never to the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("unsupported auth type '{kind}' for auth '{name}'")]
    UnsupportedAuthType { name: String, kind: String },
    #[error("invalid auth '{name}': {reason}")]
    InvalidAuth { name: String, reason: String },
    #[error("unsupported database engine '{engine}' for database '{name}'")]
    UnsupportedEngine { name: String, engine: String },
    #[error("invalid identifier '{ident}' in module '{module}'")]
    InvalidIdentifier { module: String, ident: String },
    #[error("field '{field}' in module '{module}' is managed by the server")]
    ReservedField { module: String, field: String },
    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: String, path: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Startup errors while opening connections.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("postgres '{name}': {source}")]
    Postgres { name: String, source: sqlx::Error },
    #[error("mongo '{name}': {source}")]
    Mongo { name: String, source: mongodb::error::Error },
}

/// Errors that stop the server from starting or end it early.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Request-time errors, rendered with the uniform error envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("store: {0}")]
    Store(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            // SQLSTATE class 22: a value did not parse as its column's type
            sqlx::Error::Database(db) if db.code().is_some_and(|c| c.starts_with("22")) => {
                tracing::debug!(error = %e, "rejected value");
                ApiError::BadRequest(MSG_INVALID_VALUE.into())
            }
            _ => ApiError::Store(e.to_string()),
        }
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(e: mongodb::error::Error) -> Self {
        ApiError::Store(e.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for ApiError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        ApiError::BadRequest(format!("Invalid document: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Store(detail) => {
                tracing::error!(error = %detail, "store operation failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(Envelope::error(status, message))).into_response()
    }
}
