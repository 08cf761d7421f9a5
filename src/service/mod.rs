//! Per-engine CRUD executors behind one trait.

mod document;
mod executor;
mod relational;
pub use document::DocumentExecutor;
pub use executor::{executor_for, CrudExecutor};
pub use relational::RelationalExecutor;
