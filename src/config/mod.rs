//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config structs (Config, ServerConfig, IdentityConfig, FilterConfig)
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup/reload validation producing compiled filter rules

mod defaults;
mod types;
mod validation;

pub use types::{ConfigError, Config, FilterConfig, IdentityConfig, LogFormat, ServerConfig};
pub use validation::validate;
