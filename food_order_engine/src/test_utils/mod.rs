//! Helpers for tests, in this crate and in crates that embed the engine.
pub mod fake_processor;
pub mod fixtures;
pub mod prepare_env;
