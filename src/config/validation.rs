//! Configuration validation.
//!
//! Serde handles syntax; this checks values. All problems are reported at
//! once rather than stopping at the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// Upper bound on configurable redirect hops.
pub const MAX_REDIRECT_LIMIT: usize = 20;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("upstream.referer is not an absolute URL: {0}")]
    InvalidReferer(String),

    #[error("upstream.max_redirects must be at most 20, got {0}")]
    TooManyRedirects(usize),

    #[error("api.prefix must start with '/' and not be '/': {0}")]
    InvalidPrefix(String),

    #[error("extractor.endpoint is not a valid URL: {0}")]
    InvalidExtractorEndpoint(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.log_format must be \"pretty\" or \"json\", got {0:?}")]
    UnknownLogFormat(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    }
    if Url::parse(&config.upstream.referer).is_err() {
        errors.push(ValidationError::InvalidReferer(config.upstream.referer.clone()));
    }
    if config.upstream.max_redirects > MAX_REDIRECT_LIMIT {
        errors.push(ValidationError::TooManyRedirects(config.upstream.max_redirects));
    }

    let prefix = &config.api.prefix;
    if !prefix.starts_with('/') || prefix.trim_end_matches('/').is_empty() {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }

    if let Some(endpoint) = &config.extractor.endpoint {
        if Url::parse(endpoint).is_err() {
            errors.push(ValidationError::InvalidExtractorEndpoint(endpoint.clone()));
        }
    }

    for (name, value) in [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs),
        ("extractor.timeout_secs", config.extractor.timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.upstream.user_agent = " ".into();
        config.upstream.referer = "facebook".into();
        config.api.prefix = "/".into();
        config.timeouts.request_secs = 0;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::EmptyUserAgent));
        assert!(errors.contains(&ValidationError::InvalidPrefix("/".into())));
        assert!(errors.contains(&ValidationError::ZeroTimeout("timeouts.request_secs")));
    }

    #[test]
    fn test_extractor_endpoint_checked() {
        let mut config = ProxyConfig::default();
        config.extractor.endpoint = Some("::nope".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidExtractorEndpoint("::nope".into())])
        );
    }
}
