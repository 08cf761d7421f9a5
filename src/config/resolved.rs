//! Resolved recipe: validated, immutable module and auth definitions for runtime use.

use crate::config::{validate_module, AuthConfig, ModuleConfig};
use crate::error::ConfigError;
use crate::slug::{base_path, to_slug};
use axum::http::Method;
use base64::Engine as _;

/// One CRUD operation a module can expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    ReadList,
    ReadSingle,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::ReadList,
        Operation::ReadSingle,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::ReadList => "read_list",
            Operation::ReadSingle => "read_single",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::Create => Method::POST,
            Operation::ReadList | Operation::ReadSingle => Method::GET,
            Operation::Update => Method::PATCH,
            Operation::Delete => Method::DELETE,
        }
    }

    /// Route path under the module base (`/api/{slug}/v1`).
    pub fn path(&self, base: &str) -> String {
        match self {
            Operation::Create | Operation::ReadList => base.to_string(),
            Operation::ReadSingle | Operation::Update | Operation::Delete => format!("{}/:id", base),
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Operation::Create),
            "read_list" => Ok(Operation::ReadList),
            "read_single" => Ok(Operation::ReadSingle),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Err(s.to_string()),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub name: String,
    pub slug: String,
    pub database: String,
    pub table: String,
    /// User fields in declared order; never contains system columns.
    pub fields: Vec<String>,
    /// Recognised operations, de-duplicated, in declared order.
    pub operations: Vec<Operation>,
    /// Operation strings that did not parse. Skipped at registration.
    pub unknown_operations: Vec<String>,
    pub auth: Option<String>,
}

impl ModuleDefinition {
    pub fn from_config(m: &ModuleConfig) -> Result<Self, ConfigError> {
        validate_module(m)?;
        let mut operations = Vec::new();
        let mut unknown_operations = Vec::new();
        for raw in &m.operations {
            match raw.parse::<Operation>() {
                Ok(op) if !operations.contains(&op) => operations.push(op),
                Ok(_) => {}
                Err(s) => unknown_operations.push(s),
            }
        }
        Ok(ModuleDefinition {
            name: m.name.clone(),
            slug: to_slug(&m.name),
            database: m.database.clone(),
            table: m.table.clone(),
            fields: m.fields.clone(),
            operations,
            unknown_operations,
            auth: m.auth.clone().filter(|a| !a.trim().is_empty()),
        })
    }

    pub fn base_path(&self) -> String {
        base_path(&self.slug)
    }
}

/// Validation material for one named auth policy. RS256 is the only token algorithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthPolicy {
    Basic { username: String, password: String },
    SignedToken { public_key_pem: Vec<u8> },
}

impl TryFrom<&AuthConfig> for AuthPolicy {
    type Error = ConfigError;

    fn try_from(a: &AuthConfig) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| ConfigError::InvalidAuth {
            name: a.name.clone(),
            reason: reason.to_string(),
        };
        match a.type_.to_lowercase().as_str() {
            "basic" => {
                let username = a.basic_username.clone().filter(|s| !s.is_empty());
                let password = a.basic_password.clone().filter(|s| !s.is_empty());
                match (username, password) {
                    (Some(username), Some(password)) => Ok(AuthPolicy::Basic { username, password }),
                    _ => Err(invalid("basic_username and basic_password are required")),
                }
            }
            "jwt" => {
                let encoded = a
                    .jwt_pubkey64
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| invalid("jwt_pubkey64 is required"))?;
                let public_key_pem = base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| invalid(&format!("invalid base64 public key: {}", e)))?;
                Ok(AuthPolicy::SignedToken { public_key_pem })
            }
            other => Err(ConfigError::UnsupportedAuthType {
                name: a.name.clone(),
                kind: other.to_string(),
            }),
        }
    }
}

/// Modules that passed validation plus the ones that did not, with reasons.
#[derive(Debug, Default)]
pub struct ResolvedModules {
    pub modules: Vec<ModuleDefinition>,
    pub rejected: Vec<(String, ConfigError)>,
}

pub fn resolve_modules(configs: &[ModuleConfig]) -> ResolvedModules {
    let mut out = ResolvedModules::default();
    for m in configs {
        match ModuleDefinition::from_config(m) {
            Ok(def) => out.modules.push(def),
            Err(e) => {
                tracing::error!(module = %m.name, error = %e, "module rejected");
                out.rejected.push((m.name.clone(), e));
            }
        }
    }
    out
}
