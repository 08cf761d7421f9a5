//! Common routes: health, readiness, version.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    ready: bool,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// Ready only when every registered database answers.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    for (name, conn) in state.registry.iter() {
        if let Err(e) = conn.ping().await {
            tracing::warn!(database = %name, error = %e, "readiness check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, Json(ReadyBody { ready: false }));
        }
    }
    (StatusCode::OK, Json(ReadyBody { ready: true }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /healthz, GET /readyz, GET /version. Never gated.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/readyz", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
