//! Builds parameterized INSERT, SELECT, UPDATE, DELETE for a module.
//!
//! Column order is always: declared fields, then `id`, `created_at`, `updated_at`.
//! Every placeholder comes from `QueryBuf::push_param`, which appends the value and
//! returns its `$n` in the same step, so the placeholders and the argument list
//! cannot drift apart.
//!
//! Written values are not bound per column. INSERT and UPDATE bind one JSON row and read
//! it back through `json_populate_record(NULL::<table>, $n::json)`, which converts each
//! value to its column's type. A string like `"5"` lands in an INTEGER column as 5.

use crate::config::{ModuleDefinition, SYSTEM_FIELDS};
use crate::error::ApiError;
use crate::record::FieldValues;
use crate::sql::{timestamp_text, SqlParam};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub const MSG_NO_FIELDS: &str = "No fields provided";

/// Quote identifier for PostgreSQL (safe: only from validated config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// `schema.table` or `table`, each part quoted.
fn qualified_table(table: &str) -> String {
    table.split('.').map(quoted).collect::<Vec<_>>().join(".")
}

/// Row source typed by the table's own composite type.
fn populated_row(module: &ModuleDefinition, placeholder: &str) -> String {
    format!(
        "json_populate_record(NULL::{}, {})",
        qualified_table(&module.table),
        placeholder
    )
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// Appends the value and returns its placeholder, with cast when the value needs one.
    fn push_param(&mut self, v: SqlParam) -> String {
        let n = self.params.len() + 1;
        let ph = match v.cast() {
            Some(cast) => format!("${}::{}", n, cast),
            None => format!("${}", n),
        };
        self.params.push(v);
        ph
    }
}

/// Names of every column a record carries, `id` first.
pub fn record_columns(module: &ModuleDefinition) -> Vec<&str> {
    let mut cols = Vec::with_capacity(module.fields.len() + SYSTEM_FIELDS.len());
    cols.push("id");
    cols.extend(module.fields.iter().map(String::as_str));
    cols.push("created_at");
    cols.push("updated_at");
    cols
}

/// SELECT list: every column as text so rows decode uniformly to string-or-null.
fn select_column_list(module: &ModuleDefinition) -> String {
    record_columns(module)
        .into_iter()
        .map(|c| format!("{q}::text AS {q}", q = quoted(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn cell(v: Option<String>) -> Value {
    v.map(Value::String).unwrap_or(Value::Null)
}

/// Insert columns in the fixed order, and the row carrying their values.
fn insert_row(
    module: &ModuleDefinition,
    values: &FieldValues,
    id: uuid::Uuid,
    now: DateTime<Utc>,
) -> (Vec<String>, Map<String, Value>) {
    let mut cols = Vec::with_capacity(module.fields.len() + SYSTEM_FIELDS.len());
    let mut row = Map::new();
    for f in &module.fields {
        cols.push(f.clone());
        row.insert(f.clone(), cell(values.value_or_empty(f)));
    }
    for (col, v) in [
        ("id", id.to_string()),
        ("created_at", timestamp_text(now)),
        ("updated_at", timestamp_text(now)),
    ] {
        cols.push(col.to_string());
        row.insert(col.to_string(), Value::String(v));
    }
    (cols, row)
}

/// INSERT of declared fields plus server-generated `id`, `created_at`, `updated_at`. Returns `id`.
pub fn insert(
    module: &ModuleDefinition,
    values: &FieldValues,
    id: uuid::Uuid,
    now: DateTime<Utc>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let (cols, row) = insert_row(module, values, id, now);
    let cols = cols.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
    let ph = q.push_param(SqlParam::Row(row));
    q.sql = format!(
        "INSERT INTO {table} ({cols}) SELECT {cols} FROM {source} RETURNING {id}::text",
        table = qualified_table(&module.table),
        cols = cols,
        source = populated_row(module, &ph),
        id = quoted("id"),
    );
    q
}

/// SELECT all rows, no filter, no pagination.
pub fn select_list(module: &ModuleDefinition) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {}",
        select_column_list(module),
        qualified_table(&module.table)
    );
    q
}

/// SELECT one row by `id`. `id` is compared as text so a malformed id is simply not found
/// instead of failing the cast; the comparison does not use an index on a `uuid` primary key.
pub fn select_by_id(module: &ModuleDefinition, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(SqlParam::text(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}::text = {}",
        select_column_list(module),
        qualified_table(&module.table),
        quoted("id"),
        ph
    );
    q
}

/// UPDATE by `id`: SET only declared fields present in the body, then `updated_at`.
pub fn update(
    module: &ModuleDefinition,
    id: &str,
    values: &FieldValues,
    now: DateTime<Utc>,
) -> Result<QueryBuf, ApiError> {
    let mut cols = Vec::new();
    let mut row = Map::new();
    for f in &module.fields {
        let Some(v) = values.get(f) else { continue };
        cols.push(f.as_str());
        row.insert(f.clone(), cell(v.clone()));
    }
    if cols.is_empty() {
        return Err(ApiError::BadRequest(MSG_NO_FIELDS.into()));
    }
    cols.push("updated_at");
    row.insert("updated_at".into(), Value::String(timestamp_text(now)));
    let sets = cols
        .iter()
        .map(|c| format!("{q} = body.{q}", q = quoted(c)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut q = QueryBuf::new();
    let row_ph = q.push_param(SqlParam::Row(row));
    let id_ph = q.push_param(SqlParam::text(id));
    q.sql = format!(
        "UPDATE {} AS target SET {} FROM {} AS body WHERE target.{}::text = {}",
        qualified_table(&module.table),
        sets,
        populated_row(module, &row_ph),
        quoted("id"),
        id_ph
    );
    Ok(q)
}

/// DELETE by `id`.
pub fn delete(module: &ModuleDefinition, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(SqlParam::text(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {}::text = {}",
        qualified_table(&module.table),
        quoted("id"),
        ph
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModuleConfig, ModuleDefinition};
    use chrono::TimeZone;
    use serde_json::json;

    fn module(table: &str) -> ModuleDefinition {
        ModuleDefinition::from_config(&ModuleConfig {
            name: "Product".into(),
            database: "main".into(),
            table: table.into(),
            auth: None,
            fields: vec!["name".into(), "description".into()],
            operations: vec!["create".into()],
        })
        .unwrap()
    }

    fn values(body: serde_json::Value) -> FieldValues {
        let m = module("products");
        FieldValues::from_body(&m.fields, body.as_object().unwrap()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn row(param: &SqlParam) -> &Map<String, Value> {
        match param {
            SqlParam::Row(row) => row,
            other => panic!("expected row param, got {:?}", other),
        }
    }

    #[test]
    fn insert_appends_system_columns_once_in_fixed_order() {
        let id = uuid::Uuid::new_v4();
        let q = insert(&module("products"), &values(json!({"name": "Tea", "id": "forged"})), id, now());
        let cols = "\"name\", \"description\", \"id\", \"created_at\", \"updated_at\"";
        assert_eq!(
            q.sql,
            format!(
                "INSERT INTO \"products\" ({cols}) SELECT {cols} \
                 FROM json_populate_record(NULL::\"products\", $1::json) RETURNING \"id\"::text",
                cols = cols
            )
        );
        assert_eq!(q.params.len(), 1);
        assert_eq!(
            Value::Object(row(&q.params[0]).clone()),
            json!({
                "name": "Tea",
                "description": "",
                "id": id.to_string(),
                "created_at": "2024-01-02T03:04:05.000000Z",
                "updated_at": "2024-01-02T03:04:05.000000Z",
            })
        );
    }

    #[test]
    fn insert_keeps_explicit_null() {
        let q = insert(&module("products"), &values(json!({"description": null})), uuid::Uuid::nil(), now());
        assert_eq!(row(&q.params[0])["description"], Value::Null);
    }

    #[test]
    fn written_values_are_typed_by_the_table_row() {
        // columns of any type take their value through the table's composite type
        let m = module("shop.products");
        let q = insert(&m, &values(json!({"name": "5"})), uuid::Uuid::nil(), now());
        assert!(q.sql.contains("json_populate_record(NULL::\"shop\".\"products\", $1::json)"));
        let q = update(&m, "abc", &values(json!({"name": "5"})), now()).unwrap();
        assert!(q.sql.contains("json_populate_record(NULL::\"shop\".\"products\", $1::json) AS body"));
        assert!(!q.sql.contains("= $1,"));
    }

    #[test]
    fn select_list_is_unfiltered() {
        let q = select_list(&module("shop.products"));
        assert_eq!(
            q.sql,
            "SELECT \"id\"::text AS \"id\", \"name\"::text AS \"name\", \"description\"::text AS \"description\", \
             \"created_at\"::text AS \"created_at\", \"updated_at\"::text AS \"updated_at\" FROM \"shop\".\"products\""
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn select_by_id_binds_single_param() {
        let q = select_by_id(&module("products"), "abc");
        assert!(q.sql.ends_with("FROM \"products\" WHERE \"id\"::text = $1"));
        assert_eq!(q.params, vec![SqlParam::text("abc")]);
    }

    #[test]
    fn update_sets_only_present_fields_then_updated_at_then_id() {
        let q = update(&module("products"), "abc", &values(json!({"description": "new"})), now()).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"products\" AS target SET \"description\" = body.\"description\", \
             \"updated_at\" = body.\"updated_at\" \
             FROM json_populate_record(NULL::\"products\", $1::json) AS body \
             WHERE target.\"id\"::text = $2"
        );
        assert_eq!(
            q.params[0],
            SqlParam::Row(
                json!({"description": "new", "updated_at": "2024-01-02T03:04:05.000000Z"})
                    .as_object()
                    .cloned()
                    .unwrap()
            )
        );
        assert_eq!(q.params[1], SqlParam::text("abc"));
    }

    #[test]
    fn update_without_declared_fields_is_rejected() {
        let err = update(&module("products"), "abc", &values(json!({"unknown": "x"})), now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == MSG_NO_FIELDS));
    }

    #[test]
    fn delete_by_id() {
        let q = delete(&module("products"), "abc");
        assert_eq!(q.sql, "DELETE FROM \"products\" WHERE \"id\"::text = $1");
        assert_eq!(q.params.len(), 1);
    }

    #[test]
    fn placeholders_match_param_count() {
        let m = module("products");
        let v = values(json!({"name": "a", "description": "b"}));
        for q in [
            insert(&m, &v, uuid::Uuid::nil(), now()),
            update(&m, "x", &v, now()).unwrap(),
            select_by_id(&m, "x"),
            delete(&m, "x"),
        ] {
            for n in 1..=q.params.len() {
                assert!(q.sql.contains(&format!("${}", n)), "missing ${} in {}", n, q.sql);
            }
            assert!(!q.sql.contains(&format!("${}", q.params.len() + 1)));
        }
    }
}
