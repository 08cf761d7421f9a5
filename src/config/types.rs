//! Raw recipe types matching the YAML/JSON recipe document.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub environment: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
}

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8080;

    /// `host:port` with defaults applied for unset values.
    pub fn address(&self) -> String {
        let host = if self.host.is_empty() { Self::DEFAULT_HOST } else { &self.host };
        let port = if self.port == 0 { Self::DEFAULT_PORT } else { self.port };
        format!("{}:{}", host, port)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// debug | info | warn | error. Anything else falls back to info.
    #[serde(default)]
    pub level: String,
    /// "stdout" or a file path (appended).
    #[serde(default)]
    pub output: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub min: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    /// postgres | mongo
    pub engine: String,
    pub uri: String,
    #[serde(default)]
    pub pool: PoolConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub database: String,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub operations: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    pub name: String,
    /// basic | jwt
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_pubkey64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_password: Option<String>,
}

/// The whole recipe. Every section is optional so partial documents can be layered.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    #[serde(default)]
    pub auths: Vec<AuthConfig>,
}
