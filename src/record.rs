//! Request bodies: JSON object parsing and the string-or-null field container used by the relational path.

use crate::error::ApiError;
use indexmap::IndexMap;
use serde_json::{Map, Value};

pub const MSG_INVALID_BODY: &str = "Invalid JSON body";

/// Parse a request body into a JSON object. An empty body is an empty object.
pub fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(m)) => Ok(m),
        _ => Err(ApiError::BadRequest(MSG_INVALID_BODY.into())),
    }
}

/// Declared fields present in a body, in declared order. `None` means an explicit `null`.
/// Keys the module does not declare are dropped here, so nothing else can reach SQL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: IndexMap<String, Option<String>>,
}

impl FieldValues {
    pub fn from_body(fields: &[String], body: &Map<String, Value>) -> Result<Self, ApiError> {
        let mut values = IndexMap::new();
        for f in fields {
            let v = match body.get(f) {
                None => continue,
                Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => {
                    return Err(ApiError::BadRequest(format!(
                        "Field '{}' must be a string or null",
                        f
                    )))
                }
            };
            values.insert(f.clone(), v);
        }
        Ok(FieldValues { values })
    }

    pub fn get(&self, field: &str) -> Option<&Option<String>> {
        self.values.get(field)
    }

    /// Value for an insert: a missing key becomes the empty string.
    pub fn value_or_empty(&self, field: &str) -> Option<String> {
        match self.values.get(field) {
            Some(v) => v.clone(),
            None => Some(String::new()),
        }
    }
}
