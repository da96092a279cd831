//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("[service] {field}: {message}")]
    ServiceError { field: &'static str, message: String },

    #[error("[notify] {field}: {message}")]
    NotifyError { field: &'static str, message: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(host) = &config.service.host
        && host.trim().is_empty()
    {
        errors.push(ValidationError::ServiceError {
            field: "host",
            message: "host cannot be empty".into(),
        });
    }

    if config.service.port == Some(0) {
        errors.push(ValidationError::ServiceError {
            field: "port",
            message: "port must be non-zero".into(),
        });
    }

    if let Some(url) = &config.notify.api_url {
        errors.extend(validate_api_url(url));
    }

    if let Some(token) = &config.notify.api_token
        && token.is_empty()
    {
        errors.push(ValidationError::NotifyError {
            field: "api_token",
            message: "api_token cannot be empty".into(),
        });
    }

    if config.notify.request_timeout_ms == Some(0) {
        errors.push(ValidationError::NotifyError {
            field: "request_timeout_ms",
            message: "request_timeout_ms must be positive".into(),
        });
    }

    errors
}

/// Validate the upstream URL shape (scheme and non-empty host part)
pub fn validate_api_url(url: &str) -> Option<ValidationError> {
    if url.is_empty() {
        return Some(ValidationError::NotifyError {
            field: "api_url",
            message: "api_url cannot be empty".into(),
        });
    }

    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));

    match rest {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => None,
        Some(_) => Some(ValidationError::NotifyError {
            field: "api_url",
            message: format!("'{}' has no host", url),
        }),
        None => Some(ValidationError::NotifyError {
            field: "api_url",
            message: format!("'{}' must start with http:// or https://", url),
        }),
    }
}
