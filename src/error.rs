//! Unified error handling for tinywaf.
//!
//! Only filter construction can fail. Request-time decisions are infallible:
//! malformed identifiers and URIs are ordinary inputs, not errors.

use thiserror::Error;

/// Longest ban a configuration may request (one year, in minutes).
pub const MAX_BAN_MINUTES: i64 = 365 * 24 * 60;

// ============================================================================
// Configuration Errors (fatal, startup only)
// ============================================================================

/// A filter configuration that must not be activated.
///
/// Surfaced to the host before any request is served. There is no fallback
/// to an empty pattern set or a default duration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid forbidden-path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("ban duration must be positive, got {minutes} minute(s)")]
    NonPositiveBanDuration { minutes: i64 },

    #[error("ban duration of {minutes} minute(s) exceeds the maximum of {max}")]
    BanDurationTooLong { minutes: i64, max: i64 },

    #[error("identity.header is not a valid HTTP header name: '{0}'")]
    InvalidIdentityHeader(String),
}

impl ConfigurationError {
    /// Get a static error code string for log and metric labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::NonPositiveBanDuration { .. } => "non_positive_ban_duration",
            Self::BanDurationTooLong { .. } => "ban_duration_too_long",
            Self::InvalidIdentityHeader(_) => "invalid_identity_header",
        }
    }
}
