//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that the endpoint and metrics addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::BridgeConfig;

/// Smallest frame limit that still fits a realistic request.
pub const MIN_FRAME_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let endpoint = &config.endpoint;
    if endpoint.host.trim().is_empty() {
        errors.push(ValidationError::new("endpoint.host", "must not be empty"));
    } else if let Err(e) = endpoint.base_url() {
        errors.push(ValidationError::new("endpoint.host", e));
    }

    if endpoint.port == 0 {
        errors.push(ValidationError::new("endpoint.port", "must be non-zero"));
    }

    if endpoint.timeout_secs == 0 {
        errors.push(ValidationError::new("endpoint.timeout_secs", "must be non-zero"));
    }

    if config.dispatcher.max_frame_bytes < MIN_FRAME_BYTES {
        errors.push(ValidationError::new(
            "dispatcher.max_frame_bytes",
            format!("must be at least {}", MIN_FRAME_BYTES),
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
