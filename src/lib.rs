//! tinywaf - bans clients that request forbidden paths.
//!
//! Each request is checked against an in-memory ban table and, if the client
//! is not banned, against a set of forbidden-path regexes. A match bans the
//! client for a configured duration; every request from a banned client gets
//! the same fixed rejection until the ban expires.
//!
//! The core ([`security`], [`filter`]) is host-agnostic. [`web`] mounts it as
//! axum middleware.

pub mod config;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod security;
pub mod sweep;
pub mod telemetry;
pub mod web;

pub use error::ConfigurationError;
pub use filter::{DecisionEngine, DecisionEvent, DecisionObserver, FilterRules, Verdict};
pub use security::{BanTable, PatternSet};
