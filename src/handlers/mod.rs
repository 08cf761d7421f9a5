//! HTTP handlers for module CRUD.

pub mod module;
pub use module::*;
