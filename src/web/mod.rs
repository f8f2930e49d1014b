//! axum host adapter.
//!
//! - [`identity`]: pluggable client identity policies
//! - [`middleware`]: per-request filter middleware and the fixed rejection
//! - [`server`]: listener bootstrap and the Prometheus endpoint

pub mod identity;
pub mod middleware;
pub mod server;

pub use identity::{ClientIdentity, HeaderIdentity, PeerAddrIdentity};
pub use middleware::{BLOCK_BODY, BLOCK_STATUS, FilterState, rejection, waf_middleware};
pub use server::{filtered, metrics_router, placeholder_downstream, run_metrics_server, serve};
