//! Standard response envelope helpers.

use axum::{
    body::to_bytes,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const MSG_CREATED: &str = "Data has been created";
pub const MSG_READ: &str = "Successfully read data";
pub const MSG_UPDATED: &str = "Successfully update data";
pub const MSG_DELETED: &str = "Successfully delete data";
pub const MSG_NOT_FOUND: &str = "Data not found";

/// `{status, code, data, message}`; `data` is `null` on errors.
#[derive(Serialize, Debug)]
pub struct Envelope<T> {
    pub status: bool,
    pub code: u16,
    pub data: Option<T>,
    pub message: String,
}

impl Envelope<serde_json::Value> {
    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Envelope {
            status: false,
            code: code.as_u16(),
            data: None,
            message: message.into(),
        }
    }
}

pub fn success<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            status: true,
            code: StatusCode::OK.as_u16(),
            data: Some(data),
            message: message.to_string(),
        }),
    )
}

/// Rejection bodies longer than this are replaced by the status reason.
const REJECTION_TEXT_LIMIT: usize = 4 * 1024;

/// Middleware: rewrap framework rejections (body limit, extractor failures, unmatched
/// routes) in the error envelope. JSON responses and 401 challenges pass through untouched.
pub async fn envelope_rejections(req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !(status.is_client_error() || status.is_server_error())
        || status == StatusCode::UNAUTHORIZED
        || is_json
    {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let message = to_bytes(body, REJECTION_TEXT_LIMIT)
        .await
        .ok()
        .map(|b| String::from_utf8_lossy(&b).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    let mut out = (status, Json(Envelope::error(status, message))).into_response();
    for (name, value) in parts.headers.iter() {
        out.headers_mut().append(name, value.clone());
    }
    out
}
