//! diff-preview: stage uncommitted git changes as before/after trees
//! and open them in a directory-diff viewer (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod config;
pub mod constants;
pub mod env;
pub mod external;
pub mod models;
pub mod preview;
pub mod repo;
pub mod snapshot;
pub mod status;
pub mod viewer;
pub mod workspace;
