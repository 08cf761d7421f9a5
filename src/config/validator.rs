//! Module config validation: identifiers that end up in SQL and reserved columns.

use crate::config::{ModuleConfig, ModuleDefinition};
use crate::error::ConfigError;
use crate::slug::to_slug;
use regex::Regex;
use std::sync::OnceLock;

/// Columns appended by the query builder. Never accepted from config.
pub const SYSTEM_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

pub fn is_identifier(s: &str) -> bool {
    ident_re().is_match(s)
}

/// Characters the router treats as path syntax.
fn is_route_safe(slug: &str) -> bool {
    !slug.chars().any(|c| matches!(c, '/' | ':' | '*' | '?' | '#' | '%' | '{' | '}'))
}

/// Table may be schema-qualified (`schema.table`).
pub fn is_table_name(s: &str) -> bool {
    let mut parts = s.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(t), None, None) => is_identifier(t),
        (Some(schema), Some(t), None) => is_identifier(schema) && is_identifier(t),
        _ => false,
    }
}

/// Checks that hold for every engine. Naming rules of the backing store are applied once the
/// module's connection is known; see [`validate_relational`] and [`validate_document`].
pub fn validate_module(m: &ModuleConfig) -> Result<(), ConfigError> {
    if m.name.trim().is_empty() {
        return Err(ConfigError::Validation("module name must not be empty".into()));
    }
    if !is_route_safe(&to_slug(&m.name)) {
        return Err(ConfigError::Validation(format!(
            "module name '{}' cannot be used in a route",
            m.name
        )));
    }
    if m.database.is_empty() {
        return Err(ConfigError::Validation(format!("module '{}' has no database", m.name)));
    }
    if m.table.trim().is_empty() {
        return Err(ConfigError::Validation(format!("module '{}' has no table", m.name)));
    }
    let mut seen = std::collections::HashSet::new();
    for f in &m.fields {
        if SYSTEM_FIELDS.contains(&f.as_str()) {
            return Err(ConfigError::ReservedField {
                module: m.name.clone(),
                field: f.clone(),
            });
        }
        if f.is_empty() {
            return Err(ConfigError::Validation(format!("module '{}' has an empty field name", m.name)));
        }
        if !seen.insert(f.as_str()) {
            return Err(ConfigError::Validation(format!(
                "module '{}' declares field '{}' twice",
                m.name, f
            )));
        }
    }
    Ok(())
}

/// Table and field names end up in SQL: plain identifiers only.
pub fn validate_relational(m: &ModuleDefinition) -> Result<(), ConfigError> {
    let bad = std::iter::once(&m.table)
        .filter(|t| !is_table_name(t))
        .chain(m.fields.iter().filter(|f| !is_identifier(f)))
        .next();
    match bad {
        Some(ident) => Err(ConfigError::InvalidIdentifier {
            module: m.name.clone(),
            ident: ident.clone(),
        }),
        None => Ok(()),
    }
}

/// Collection names follow MongoDB's rules; field names may not be operators or paths.
pub fn validate_document(m: &ModuleDefinition) -> Result<(), ConfigError> {
    let bad_collection = m.table.contains('$') || m.table.contains('\0') || m.table.starts_with("system.");
    if bad_collection {
        return Err(ConfigError::InvalidIdentifier {
            module: m.name.clone(),
            ident: m.table.clone(),
        });
    }
    if let Some(f) = m.fields.iter().find(|f| f.starts_with('$') || f.contains('.')) {
        return Err(ConfigError::InvalidIdentifier {
            module: m.name.clone(),
            ident: f.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(table: &str, fields: &[&str]) -> ModuleConfig {
        ModuleConfig {
            name: "Product".into(),
            database: "main".into(),
            table: table.into(),
            auth: None,
            fields: fields.iter().map(|s| s.to_string()).collect(),
            operations: vec!["create".into()],
        }
    }

    fn definition(table: &str, fields: &[&str]) -> ModuleDefinition {
        ModuleDefinition::from_config(&module(table, fields)).unwrap()
    }

    #[test]
    fn accepts_plain_and_qualified_tables() {
        assert!(validate_relational(&definition("products", &["name"])).is_ok());
        assert!(validate_relational(&definition("shop.products", &["name"])).is_ok());
    }

    #[test]
    fn rejects_injection_in_identifiers() {
        assert!(matches!(
            validate_relational(&definition("products; drop table x", &["name"])),
            Err(ConfigError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            validate_relational(&definition("products", &["name\" --"])),
            Err(ConfigError::InvalidIdentifier { .. })
        ));
        assert!(!is_table_name("a.b.c"));
    }

    #[test]
    fn hyphenated_collection_and_fields_pass_engine_independent_checks() {
        let m = module("order-items", &["first-name"]);
        assert!(validate_module(&m).is_ok());
        let def = definition("order-items", &["first-name"]);
        assert!(validate_document(&def).is_ok());
        assert!(matches!(
            validate_relational(&def),
            Err(ConfigError::InvalidIdentifier { ref ident, .. }) if ident == "order-items"
        ));
    }

    #[test]
    fn document_names_reject_operators_and_system_collections() {
        assert!(validate_document(&definition("system.users", &["a"])).is_err());
        assert!(validate_document(&definition("items$x", &["a"])).is_err());
        assert!(validate_document(&definition("items", &["$set"])).is_err());
        assert!(validate_document(&definition("items", &["a.b"])).is_err());
    }

    #[test]
    fn rejects_system_fields() {
        for f in SYSTEM_FIELDS {
            assert!(matches!(
                validate_module(&module("products", &["name", f])),
                Err(ConfigError::ReservedField { .. })
            ));
        }
    }

    #[test]
    fn rejects_names_with_path_syntax() {
        let mut m = module("products", &["name"]);
        m.name = "shop/products".into();
        assert!(validate_module(&m).is_err());
        m.name = "Shop:Products".into();
        assert!(validate_module(&m).is_err());
        m.name = "Shop Products".into();
        assert!(validate_module(&m).is_ok());
    }

    #[test]
    fn rejects_duplicate_fields() {
        assert!(validate_module(&module("products", &["name", "name"])).is_err());
    }
}
