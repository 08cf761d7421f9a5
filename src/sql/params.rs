//! Values bound to relational statements.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// Every value goes over the wire as TEXT. Values meant for user columns travel inside
/// a `Row`, which the statement expands with `json_populate_record`, so Postgres parses
/// each one with the column's own input function (integer, numeric, uuid, date, ...).
#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    Text(Option<String>),
    Row(Map<String, Value>),
}

impl SqlParam {
    /// Cast carried by the placeholder, if any.
    pub fn cast(&self) -> Option<&'static str> {
        match self {
            SqlParam::Text(_) => None,
            SqlParam::Row(_) => Some("json"),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        SqlParam::Text(Some(s.into()))
    }
}

/// Timestamp as written into `created_at` / `updated_at`.
pub fn timestamp_text(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl<'q> Encode<'q, Postgres> for SqlParam {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            SqlParam::Text(None) => <Option<&str> as Encode<Postgres>>::encode_by_ref(&None, buf),
            SqlParam::Text(Some(s)) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf),
            SqlParam::Row(row) => {
                let s = serde_json::to_string(row)?;
                <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf)
            }
        }
    }
}

impl sqlx::Type<Postgres> for SqlParam {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}
