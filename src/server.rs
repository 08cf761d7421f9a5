//! Application assembly and the serve loop.

use crate::auth::AuthResolver;
use crate::config::{resolve_modules, AppConfig};
use crate::db::{connect_all, ConnectionRegistry};
use crate::error::ServerError;
use crate::response::envelope_rejections;
use crate::routes::{bind_modules, common_routes, BindReport};
use crate::state::AppState;
use crate::telemetry::log_requests;
use axum::{extract::DefaultBodyLimit, middleware, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Request bodies above this size are answered with 413.
pub const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Build the full router from a loaded recipe and open connections.
/// Modules rejected by validation are folded into the report next to the ones that failed wiring.
pub fn build_app(config: &AppConfig, registry: ConnectionRegistry) -> (Router, BindReport) {
    let resolved = resolve_modules(&config.modules);
    let auth = AuthResolver::new(&config.auths);
    let registry = Arc::new(registry);

    let (modules, mut report) = bind_modules(Router::new(), &resolved.modules, &auth, &registry);
    report.skipped_modules.extend(resolved.rejected);

    let app = Router::new()
        .merge(common_routes(AppState { registry }))
        .merge(modules)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_requests))
                .layer(middleware::from_fn(envelope_rejections))
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
                .layer(DefaultBodyLimit::disable()),
        );
    (app, report)
}

/// Connect, bind, and serve until SIGINT/SIGTERM.
pub async fn run(config: AppConfig) -> Result<(), ServerError> {
    let registry = connect_all(&config.databases).await?;
    let (app, report) = build_app(&config, registry);
    tracing::info!(
        routes = report.routes.len(),
        skipped_modules = report.skipped_modules.len(),
        skipped_operations = report.skipped_operations.len(),
        "modules bound"
    );

    let listener = TcpListener::bind(config.server.address()).await?;
    tracing::info!(
        app = %config.app.name,
        environment = %config.app.environment,
        "listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
