//! Filter and update documents for the document store.
//!
//! Records are addressed by the caller-visible `id` field, never by the store's `_id`.
//! Inserts keep every body key (no restriction to declared fields); see DESIGN.md.

use crate::error::ApiError;
use crate::record::MSG_INVALID_BODY;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Bson, Document};
use serde_json::{Map, Value};

/// The store's own primary key. Never written from a body, never returned.
pub const NATIVE_ID: &str = "_id";
pub const MSG_NO_UPDATE_FIELDS: &str = "No fields to update";

fn bson_now(now: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(now.timestamp_millis())
}

fn json_to_document(body: Map<String, Value>) -> Result<Document, ApiError> {
    match bson::to_bson(&Value::Object(body))? {
        Bson::Document(d) => Ok(d),
        _ => Err(ApiError::BadRequest(MSG_INVALID_BODY.into())),
    }
}

/// Body merged with server-generated `id`, `created_at`, `updated_at`.
pub fn insert_document(
    mut body: Map<String, Value>,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Document, ApiError> {
    body.remove(NATIVE_ID);
    let mut d = json_to_document(body)?;
    d.insert("id", id);
    d.insert("created_at", bson_now(now));
    d.insert("updated_at", bson_now(now));
    Ok(d)
}

pub fn list_filter() -> Document {
    Document::new()
}

pub fn id_filter(id: &str) -> Document {
    doc! { "id": id }
}

/// `$set` of the body minus `id`/`_id`, plus `updated_at`. Empty bodies are rejected.
pub fn update_document(mut body: Map<String, Value>, now: DateTime<Utc>) -> Result<Document, ApiError> {
    body.remove("id");
    body.remove(NATIVE_ID);
    if body.is_empty() {
        return Err(ApiError::BadRequest(MSG_NO_UPDATE_FIELDS.into()));
    }
    let mut set = json_to_document(body)?;
    set.insert("updated_at", bson_now(now));
    Ok(doc! { "$set": set })
}

fn bson_to_json(v: Bson) -> Value {
    match v {
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Bson::DateTime(dt).into_relaxed_extjson(),
        },
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(d) => Value::Object(d.into_iter().map(|(k, v)| (k, bson_to_json(v))).collect()),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Stored document as a client record: `_id` dropped, datetimes as RFC 3339.
pub fn document_to_record(mut d: Document) -> Value {
    d.remove(NATIVE_ID);
    bson_to_json(Bson::Document(d))
}
