//! Client identity policies.
//!
//! The ban key is whatever the policy returns. Trusting a forwarded header is
//! a deployment decision: only do it behind a proxy that overwrites it.

use crate::config::IdentityConfig;
use crate::error::ConfigurationError;
use axum::extract::{ConnectInfo, Request};
use http::HeaderName;
use std::net::SocketAddr;
use std::sync::Arc;

/// Derives the ban key for a request.
///
/// Must never fail: a request with no usable identity maps to the empty
/// string, which is banned and matched like any other key.
pub trait ClientIdentity: Send + Sync {
    fn identify(&self, req: &Request) -> String;
}

/// Uses the value of one request header, verbatim.
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    name: HeaderName,
}

impl HeaderIdentity {
    pub fn new(name: HeaderName) -> Self {
        Self { name }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        HeaderName::from_bytes(name.as_bytes())
            .map(Self::new)
            .map_err(|_| ConfigurationError::InvalidIdentityHeader(name.to_string()))
    }
}

impl ClientIdentity for HeaderIdentity {
    fn identify(&self, req: &Request) -> String {
        req.headers()
            .get(&self.name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }
}

/// Uses the IP of the TCP peer.
///
/// Requires the server to be started with connect info
/// (`into_make_service_with_connect_info::<SocketAddr>()`).
#[derive(Debug, Default, Clone, Copy)]
pub struct PeerAddrIdentity;

impl ClientIdentity for PeerAddrIdentity {
    fn identify(&self, req: &Request) -> String {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_default()
    }
}

/// Build the identity policy selected by configuration.
pub fn from_config(config: &IdentityConfig) -> Result<Arc<dyn ClientIdentity>, ConfigurationError> {
    Ok(match config.header.as_deref() {
        Some(name) => Arc::new(HeaderIdentity::from_name(name)?),
        None => Arc::new(PeerAddrIdentity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(name: &str, value: &str) -> Request {
        http::Request::builder()
            .uri("/")
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_header_identity() {
        let policy = HeaderIdentity::from_name("Cf-Connecting-Ip").unwrap();
        let req = request_with_header("cf-connecting-ip", "203.0.113.7");
        assert_eq!(policy.identify(&req), "203.0.113.7");
    }

    #[test]
    fn test_missing_header_is_empty_identity() {
        let policy = HeaderIdentity::from_name("X-Real-Ip").unwrap();
        let req = request_with_header("x-other", "1.1.1.1");
        assert_eq!(policy.identify(&req), "");
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        assert!(matches!(
            HeaderIdentity::from_name("not a header"),
            Err(ConfigurationError::InvalidIdentityHeader(_))
        ));
    }

    #[test]
    fn test_peer_addr_identity() {
        let mut req = http::Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(PeerAddrIdentity.identify(&req), "");

        let addr: SocketAddr = "198.51.100.4:51234".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(PeerAddrIdentity.identify(&req), "198.51.100.4");
    }

    #[test]
    fn test_from_config() {
        let header = IdentityConfig {
            header: Some("Cf-Connecting-Ip".to_string()),
        };
        let req = request_with_header("cf-connecting-ip", "10.0.0.1");
        assert_eq!(from_config(&header).unwrap().identify(&req), "10.0.0.1");

        let peer = IdentityConfig::default();
        assert_eq!(from_config(&peer).unwrap().identify(&req), "");
    }
}
