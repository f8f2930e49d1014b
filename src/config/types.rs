//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_ban_minutes, default_listen, default_metrics_port, default_sweep_interval,
};
use crate::error::ConfigurationError;
use crate::filter::FilterRules;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ConfigurationError>),
}

impl ConfigError {
    /// Static codes of every validation problem, for log labeling.
    pub fn error_codes(&self) -> Vec<&'static str> {
        match self {
            Self::Io(_) => vec!["io"],
            Self::Parse(_) => vec!["parse"],
            Self::Invalid(errors) => errors.iter().map(ConfigurationError::error_code).collect(),
        }
    }
}

fn join_errors(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listener and logging.
    #[serde(default)]
    pub server: ServerConfig,
    /// How a client is identified.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Forbidden paths and ban length.
    pub filter: FilterConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load and validate, returning the compiled filter rules alongside.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<(Self, FilterRules), ConfigError> {
        let config = Self::load(path)?;
        let rules = super::validate(&config).map_err(ConfigError::Invalid)?;
        Ok((config, rules))
    }
}

/// Listener and logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the filtered HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Prometheus metrics HTTP port (default: 9090, 0 disables).
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_port: default_metrics_port(),
            log_format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Client identity policy.
///
/// With `header` set, the client is whatever that header says. This is only
/// safe behind a proxy that overwrites the header. Without it, the socket
/// peer address is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Request header carrying the client address (e.g. "Cf-Connecting-Ip").
    pub header: Option<String>,
}

/// Forbidden-path filter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Regular expressions matched against the request URI (path and query).
    #[serde(default)]
    pub bad_uris: Vec<String>,
    /// Ban length in minutes. Must be positive.
    #[serde(default = "default_ban_minutes")]
    pub ban_minutes: i64,
    /// Seconds between sweeps of expired bans (0 disables the sweep).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}
