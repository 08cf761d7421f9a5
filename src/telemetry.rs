//! Logging setup and per-request access logging.

use crate::config::LoggingConfig;
use axum::{extract::Request, middleware::Next, response::Response};
use std::error::Error;
use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Filter directive for the recipe's `logging.level`.
pub fn level_directive(cfg: &LoggingConfig) -> &'static str {
    match cfg.level.trim().to_lowercase().as_str() {
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the recipe level.
/// Output is stdout unless `logging.output` names a file, which is appended to without ANSI colors.
pub fn init_logging(cfg: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_directive(cfg)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let output = cfg.output.trim();
    if output.is_empty() || output.eq_ignore_ascii_case("stdout") {
        builder.try_init()
    } else {
        let file = OpenOptions::new().create(true).append(true).open(output)?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
    }
}

/// Middleware: one line per request with method, path, status, and latency.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let res = next.run(req).await;
    tracing::info!(
        method = %method,
        path = %path,
        status = res.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    res
}
