//! Module routes built from resolved recipe modules.
//! Each enabled operation gets one method route under `/api/{slug}/v1`; a module's auth gate
//! wraps only that module's routes. A module that cannot be wired is skipped and reported.

use crate::auth::{require_gate, AuthResolver, Gate};
use crate::config::{ModuleDefinition, Operation};
use crate::db::ConnectionRegistry;
use crate::error::ConfigError;
use crate::handlers;
use crate::service::executor_for;
use crate::state::ModuleState;
use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use std::collections::HashSet;
use std::sync::Arc;

/// One registered route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteEntry {
    pub module: String,
    pub method: Method,
    pub path: String,
}

/// One operation that was listed but not registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedOperation {
    pub module: String,
    pub operation: String,
    pub reason: String,
}

/// What registration did: routes that exist and everything that was left out.
#[derive(Debug, Default)]
pub struct BindReport {
    pub routes: Vec<RouteEntry>,
    pub skipped_modules: Vec<(String, ConfigError)>,
    pub skipped_operations: Vec<SkippedOperation>,
}

impl BindReport {
    pub fn has_route(&self, method: &Method, path: &str) -> bool {
        self.routes.iter().any(|r| &r.method == method && r.path == path)
    }
}

/// Method route for one operation, bound to the module's state and optionally gated.
pub fn operation_route(op: Operation, state: ModuleState, gate: Option<Gate>) -> MethodRouter {
    let route: MethodRouter<ModuleState> = match op {
        Operation::Create => post(handlers::create),
        Operation::ReadList => get(handlers::read_list),
        Operation::ReadSingle => get(handlers::read_single),
        Operation::Update => patch(handlers::update),
        Operation::Delete => delete(handlers::delete),
    };
    let route = route.with_state(state);
    match gate {
        Some(gate) => route.route_layer(from_fn_with_state(gate, require_gate)),
        None => route,
    }
}

/// Add every module's routes to `router`. Failures stay local to the module or operation.
pub fn bind_modules(
    mut router: Router,
    modules: &[ModuleDefinition],
    auth: &AuthResolver,
    registry: &ConnectionRegistry,
) -> (Router, BindReport) {
    let mut report = BindReport::default();
    let mut taken: HashSet<(Method, String)> = HashSet::new();

    for def in modules {
        let module = Arc::new(def.clone());
        let prepared = auth
            .resolve(module.auth.as_deref())
            .and_then(|gate| executor_for(&module, registry).map(|executor| (gate, executor)));
        let (gate, executor) = match prepared {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(module = %module.name, error = %e, "module not registered");
                report.skipped_modules.push((module.name.clone(), e));
                continue;
            }
        };

        for raw in &module.unknown_operations {
            tracing::warn!(module = %module.name, operation = %raw, "unknown operation, skipping");
            report.skipped_operations.push(SkippedOperation {
                module: module.name.clone(),
                operation: raw.clone(),
                reason: "unknown operation".into(),
            });
        }

        let state = ModuleState {
            module: module.clone(),
            executor,
        };
        let base = module.base_path();
        for op in &module.operations {
            let method = op.method();
            let path = op.path(&base);
            if !taken.insert((method.clone(), path.clone())) {
                let e = ConfigError::DuplicateRoute {
                    method: method.to_string(),
                    path: path.clone(),
                };
                tracing::warn!(module = %module.name, operation = %op, error = %e, "route skipped");
                report.skipped_operations.push(SkippedOperation {
                    module: module.name.clone(),
                    operation: op.to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
            router = router.route(&path, operation_route(*op, state.clone(), gate.clone()));
            tracing::info!(
                module = %module.name,
                method = %method,
                path = %path,
                gated = gate.is_some(),
                "route registered"
            );
            report.routes.push(RouteEntry {
                module: module.name.clone(),
                method,
                path,
            });
        }
    }
    (router, report)
}

/// Routes for `modules` on a fresh router.
pub fn module_routes(
    modules: &[ModuleDefinition],
    auth: &AuthResolver,
    registry: &ConnectionRegistry,
) -> (Router, BindReport) {
    bind_modules(Router::new(), modules, auth, registry)
}
