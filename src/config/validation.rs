//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that endpoints are absolute http(s) URLs
//! - Check that the chosen auth method has its credentials
//! - Validate value ranges (timeouts > 0, min delay ≤ max delay)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::{AuthMethod, ClientConfig};

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check `config`, collecting every problem.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (i, raw) in config.endpoints.iter().enumerate() {
        let field = format!("endpoints[{i}]");
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                field,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {e}"))),
        }
    }

    let auth = &config.auth;
    match auth.method {
        AuthMethod::Basic | AuthMethod::Bearer => {
            if auth.username.as_deref().map_or(true, str::is_empty) {
                errors.push(ValidationError::new("auth.username", "required"));
            }
            if auth.password.is_none() {
                errors.push(ValidationError::new("auth.password", "required"));
            }
        }
        AuthMethod::ClientCertificate => {
            if auth.pkcs12_path.is_none() {
                errors.push(ValidationError::new("auth.pkcs12_path", "required"));
            }
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    let polling = &config.polling;
    if polling.min_delay_ms == 0 {
        errors.push(ValidationError::new("polling.min_delay_ms", "must be > 0"));
    }
    if polling.min_delay_ms > polling.max_delay_ms {
        errors.push(ValidationError::new(
            "polling.max_delay_ms",
            "must be >= polling.min_delay_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
