//! Default value functions for configuration.

use std::net::{Ipv4Addr, SocketAddr};

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_listen() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

pub fn default_metrics_port() -> u16 {
    9090
}

// =============================================================================
// Filter Defaults
// =============================================================================

pub fn default_ban_minutes() -> i64 {
    15
}

pub fn default_sweep_interval() -> u64 {
    300
}
