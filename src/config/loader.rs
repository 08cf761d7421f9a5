//! Layered recipe loading: file, then an env-provided document, then env overrides.

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Recipe file names probed in the working directory when no path is given.
pub const RECIPE_CANDIDATES: &[&str] = &["recipe.yaml", "recipe.yml", "recipe.json"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeFormat {
    Yaml,
    Json,
}

impl RecipeFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
            Some("yaml") | Some("yml") => Ok(RecipeFormat::Yaml),
            Some("json") => Ok(RecipeFormat::Json),
            _ => Err(ConfigError::Load(format!(
                "unsupported recipe format: {}",
                path.display()
            ))),
        }
    }
}

pub fn parse_recipe(content: &str, format: RecipeFormat) -> Result<AppConfig, ConfigError> {
    match format {
        RecipeFormat::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::Load(format!("yaml: {}", e))),
        RecipeFormat::Json => serde_json::from_str(content).map_err(|e| ConfigError::Load(format!("json: {}", e))),
    }
}

fn detect_recipe_file(dir: &Path) -> Option<PathBuf> {
    RECIPE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Empty recipe when there is no file at all.
pub fn load_from_file(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    tracing::info!(path = %path.display(), "loading recipe file");
    let format = RecipeFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_recipe(&content, format)
}

/// `CONFIG_YAML` takes precedence over `CONFIG_JSON`. None when neither is set.
pub fn load_from_env_document<F>(env: &F) -> Result<Option<AppConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |k: &str| env(k).filter(|v| !v.is_empty());
    if let Some(y) = non_empty("CONFIG_YAML") {
        tracing::info!("loading recipe from CONFIG_YAML");
        return parse_recipe(&y, RecipeFormat::Yaml).map(Some);
    }
    if let Some(j) = non_empty("CONFIG_JSON") {
        tracing::info!("loading recipe from CONFIG_JSON");
        return parse_recipe(&j, RecipeFormat::Json).map(Some);
    }
    Ok(None)
}

pub fn apply_env_overrides<F>(cfg: &mut AppConfig, env: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |k: &str| env(k).filter(|v| !v.is_empty());
    if let Some(v) = non_empty("APP_NAME") {
        cfg.app.name = v;
    }
    if let Some(v) = non_empty("APP_ENVIRONMENT") {
        cfg.app.environment = v;
    }
    if let Some(v) = non_empty("SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = non_empty("SERVER_PORT") {
        match v.parse() {
            Ok(port) => cfg.server.port = port,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid SERVER_PORT"),
        }
    }
}

/// Scalars replace when set; lists replace wholesale when non-empty.
pub fn merge(dst: &mut AppConfig, src: AppConfig) {
    fn set(dst: &mut String, src: String) {
        if !src.is_empty() {
            *dst = src;
        }
    }
    set(&mut dst.app.name, src.app.name);
    set(&mut dst.app.environment, src.app.environment);
    set(&mut dst.server.host, src.server.host);
    if src.server.port != 0 {
        dst.server.port = src.server.port;
    }
    set(&mut dst.logging.level, src.logging.level);
    set(&mut dst.logging.output, src.logging.output);
    if !src.databases.is_empty() {
        dst.databases = src.databases;
    }
    if !src.modules.is_empty() {
        dst.modules = src.modules;
    }
    if !src.auths.is_empty() {
        dst.auths = src.auths;
    }
}

/// Load using the process environment. `path` overrides recipe file detection in the current directory.
pub fn load_auto(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Load(e.to_string()))?;
    load_layered(path, &cwd, |k| std::env::var(k).ok())
}

pub fn load_layered<F>(path: Option<&Path>, dir: &Path, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(p) => Some(p.to_path_buf()),
        None => detect_recipe_file(dir),
    };
    let mut cfg = AppConfig::default();
    merge(&mut cfg, load_from_file(file.as_deref())?);
    if let Some(env_cfg) = load_from_env_document(&env)? {
        merge(&mut cfg, env_cfg);
    }
    apply_env_overrides(&mut cfg, &env);
    Ok(cfg)
}
