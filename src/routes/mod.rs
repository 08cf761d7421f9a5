pub mod common;
pub mod module;

pub use common::common_routes;
pub use module::{bind_modules, module_routes, operation_route, BindReport, RouteEntry, SkippedOperation};
