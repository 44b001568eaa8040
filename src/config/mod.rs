//! Configuration module for the stylegen build
//!
//! Provides types and parsing for `stylegen.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{default_config, load_config, ConfigError};
pub use schema::*;
