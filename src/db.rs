//! Named connections: one relational pool or document database per recipe entry.

use crate::config::DatabaseConfig;
use crate::error::{ApiError, DbError};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Backing store family. Closed set; anything else in a recipe is reported and skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Engine {
    Relational,
    Document,
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Engine::Relational),
            "mongo" | "mongodb" => Ok(Engine::Document),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Connection {
    Relational(PgPool),
    Document(mongodb::Database),
}

impl Connection {
    pub async fn ping(&self) -> Result<(), ApiError> {
        match self {
            Connection::Relational(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            Connection::Document(db) => {
                db.run_command(doc! { "ping": 1 }).await?;
            }
        }
        Ok(())
    }
}

/// Connection name -> handle. Built once at startup and shared read-only behind `Arc`.
#[derive(Clone, Debug, Default)]
pub struct ConnectionRegistry {
    by_name: HashMap<String, Connection>,
    /// Configured but not opened: name -> engine string.
    unsupported: HashMap<String, String>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, conn: Connection) {
        let name = name.into();
        if self.by_name.insert(name.clone(), conn).is_some() {
            tracing::warn!(database = %name, "database defined twice, keeping the last definition");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Connection> {
        self.by_name.get(name)
    }

    pub fn mark_unsupported(&mut self, name: impl Into<String>, engine: impl Into<String>) {
        self.unsupported.insert(name.into(), engine.into());
    }

    /// Engine string of a configured database that was skipped at startup.
    pub fn unsupported_engine(&self, name: &str) -> Option<&str> {
        self.unsupported.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Connection)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Postgres pools connect lazily; the first query (or `/readyz`) opens a connection.
pub async fn connect(cfg: &DatabaseConfig, engine: Engine) -> Result<Connection, DbError> {
    match engine {
        Engine::Relational => {
            let max = if cfg.pool.max > 0 { cfg.pool.max } else { DEFAULT_MAX_CONNECTIONS };
            let pool = PgPoolOptions::new()
                .max_connections(max)
                .min_connections(cfg.pool.min.min(max))
                .max_lifetime(CONNECTION_MAX_LIFETIME)
                .connect_lazy(&cfg.uri)
                .map_err(|source| DbError::Postgres {
                    name: cfg.name.clone(),
                    source,
                })?;
            Ok(Connection::Relational(pool))
        }
        Engine::Document => {
            let mongo_err = |source| DbError::Mongo {
                name: cfg.name.clone(),
                source,
            };
            let mut opts = ClientOptions::parse(&cfg.uri).await.map_err(mongo_err)?;
            if cfg.pool.max > 0 {
                opts.max_pool_size = Some(cfg.pool.max);
            }
            if cfg.pool.min > 0 {
                opts.min_pool_size = Some(cfg.pool.min);
            }
            let client = mongodb::Client::with_options(opts).map_err(mongo_err)?;
            let db = client
                .default_database()
                .unwrap_or_else(|| client.database(&cfg.name));
            Ok(Connection::Document(db))
        }
    }
}

/// Open every configured database. Unsupported engines are logged and left out.
pub async fn connect_all(configs: &[DatabaseConfig]) -> Result<ConnectionRegistry, DbError> {
    let mut registry = ConnectionRegistry::new();
    for cfg in configs {
        let engine = match cfg.engine.parse::<Engine>() {
            Ok(e) => e,
            Err(engine) => {
                tracing::warn!(database = %cfg.name, engine = %engine, "unsupported database engine, skipping");
                registry.mark_unsupported(cfg.name.clone(), engine);
                continue;
            }
        };
        let conn = connect(cfg, engine).await?;
        tracing::info!(database = %cfg.name, engine = ?engine, "database registered");
        registry.insert(cfg.name.clone(), conn);
    }
    Ok(registry)
}
