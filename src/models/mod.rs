//! Shared types used across all modules.
//!
//! Other modules import change records and layout options from here
//! rather than reaching into each other's internals.

pub mod change;

pub use change::{ChangeKind, ChangeRecord, SnapshotLayout};
