//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check upstream URLs actually parse
//! - Validate value ranges (TTL > 0, poll attempts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "upstreams.core_service_url").
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "listener.public_url", &config.listener.public_url);
    check_url(
        &mut errors,
        "upstreams.user_service_url",
        &config.upstreams.user_service_url,
    );
    check_url(
        &mut errors,
        "upstreams.core_service_url",
        &config.upstreams.core_service_url,
    );
    check_url(
        &mut errors,
        "upstreams.saga_orchestrator_url",
        &config.upstreams.saga_orchestrator_url,
    );

    if config.auth.signing_secret.is_empty() {
        errors.push(ValidationError {
            field: "auth.signing_secret".into(),
            message: "must not be empty".into(),
        });
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError {
            field: "auth.token_ttl_secs".into(),
            message: "must be at least 1 second".into(),
        });
    }

    if !config.auth.auth_prefix.starts_with('/') {
        errors.push(ValidationError {
            field: "auth.auth_prefix".into(),
            message: "must start with '/'".into(),
        });
    }

    if config.saga.max_poll_attempts == 0 {
        errors.push(ValidationError {
            field: "saga.max_poll_attempts".into(),
            message: "must be at least 1".into(),
        });
    }

    if config.saga.poll_interval_ms == 0 {
        errors.push(ValidationError {
            field: "saga.poll_interval_ms".into(),
            message: "must be at least 1 millisecond".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.host_str().is_some() => {}
        Ok(_) => errors.push(ValidationError {
            field: field.into(),
            message: format!("'{}' has no host", value),
        }),
        Err(e) => errors.push(ValidationError {
            field: field.into(),
            message: format!("'{}' is not a valid URL: {}", value, e),
        }),
    }
}
