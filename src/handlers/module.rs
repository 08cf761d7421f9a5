//! Module CRUD handlers: one per operation, each answering with the uniform envelope.

use crate::error::ApiError;
use crate::record::parse_object;
use crate::response::{success, MSG_CREATED, MSG_DELETED, MSG_NOT_FOUND, MSG_READ, MSG_UPDATED};
use crate::state::ModuleState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

pub async fn create(
    State(state): State<ModuleState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let body = parse_object(&body)?;
    let id = state.executor.create(body).await?;
    tracing::debug!(module = %state.module.name, id = %id, "created");
    Ok(success(json!({ "id": id }), MSG_CREATED))
}

pub async fn read_list(State(state): State<ModuleState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.executor.read_list().await?;
    Ok(success(rows, MSG_READ))
}

pub async fn read_single(
    State(state): State<ModuleState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .executor
        .read_single(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(MSG_NOT_FOUND.into()))?;
    Ok(success(row, MSG_READ))
}

pub async fn update(
    State(state): State<ModuleState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let body = parse_object(&body)?;
    state.executor.update(&id, body).await?;
    Ok(success(json!({ "updated": true }), MSG_UPDATED))
}

pub async fn delete(
    State(state): State<ModuleState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.executor.delete(&id).await?;
    Ok(success(json!({ "deleted": true }), MSG_DELETED))
}
