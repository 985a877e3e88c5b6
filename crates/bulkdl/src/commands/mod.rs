//! CLI command implementations.

pub mod fetch;
pub mod files;
pub mod history;
pub mod submit;
