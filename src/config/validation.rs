//! Configuration validation.
//!
//! Validates configuration at startup, and on reload, so an invalid file is
//! never activated.

use super::Config;
use crate::error::ConfigurationError;
use crate::filter::{FilterRules, ban_duration_from_minutes};
use crate::security::PatternSet;
use http::HeaderName;

/// Validate a configuration, returning all errors found.
///
/// On success returns the compiled filter rules.
pub fn validate(config: &Config) -> Result<FilterRules, Vec<ConfigurationError>> {
    let mut errors = Vec::new();

    let duration = ban_duration_from_minutes(config.filter.ban_minutes)
        .map_err(|e| errors.push(e))
        .ok();

    let patterns = PatternSet::compile(&config.filter.bad_uris)
        .map_err(|e| errors.push(e))
        .ok();

    if let Some(ref header) = config.identity.header
        && HeaderName::from_bytes(header.as_bytes()).is_err()
    {
        errors.push(ConfigurationError::InvalidIdentityHeader(header.clone()));
    }

    match (patterns, duration) {
        (Some(patterns), Some(duration)) if errors.is_empty() => {
            FilterRules::new(patterns, duration).map_err(|e| vec![e])
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[filter]
bad_uris = ["^/wp-admin/.*", "^/wp-login\\.php$"]
ban_minutes = 15
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        let rules = validate(&config).unwrap();
        assert_eq!(rules.patterns().len(), 2);
        assert_eq!(rules.ban_duration().as_secs(), 15 * 60);
        assert!(rules.patterns().matches("/wp-login.php"));
    }

    #[test]
    fn test_defaults_applied() {
        let config: Config = toml::from_str("[filter]\n").unwrap();
        assert_eq!(config.filter.ban_minutes, 15);
        assert_eq!(config.filter.sweep_interval_secs, 300);
        assert_eq!(config.server.metrics_port, 9090);
        assert_eq!(config.server.listen.port(), 8080);
        assert!(config.identity.header.is_none());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_ban_fails() {
        let toml = r#"
[filter]
bad_uris = ["^/x"]
ban_minutes = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::NonPositiveBanDuration { minutes: 0 })));
    }

    #[test]
    fn test_negative_ban_fails() {
        let toml = r#"
[filter]
ban_minutes = -5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::NonPositiveBanDuration { minutes: -5 })));
    }

    #[test]
    fn test_all_errors_collected() {
        let toml = r#"
[identity]
header = "bad header"

[filter]
bad_uris = ["^/ok", "^/(broken"]
ban_minutes = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::InvalidPattern { pattern, .. } if pattern == "^/(broken")));
        assert!(errors.iter().any(|e| matches!(e, ConfigurationError::InvalidIdentityHeader(_))));
    }

    #[test]
    fn test_identity_header_accepted() {
        let toml = r#"
[identity]
header = "Cf-Connecting-Ip"

[filter]
bad_uris = []
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(validate(&config).is_ok());
    }
}
