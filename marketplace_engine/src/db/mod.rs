//! Storage backends for the marketplace engine.
//!
//! Backends implement the traits in [`crate::traits`]. SQLite is the only backend at present.
#[cfg(feature = "sqlite")]
pub mod sqlite;
