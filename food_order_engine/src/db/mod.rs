//! Storage backends for the food ordering engine.
//!
//! Backends implement the traits in [`crate::traits`]. SQLite is the supported backend.
#[cfg(feature = "sqlite")]
pub mod sqlite;
