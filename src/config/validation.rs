//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits sane)
//! - Check synthesized status lines start with a status code
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// Smallest header budget that still fits a request line and a Host header.
const MIN_HEADER_BYTES: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("limits.max_header_bytes must be at least {min}, got {actual}")]
    HeaderLimitTooSmall { min: usize, actual: usize },

    #[error("{field} must start with a three-digit status code, got '{value}'")]
    InvalidStatus { field: &'static str, value: String },

    #[error("censor.marker must not be empty")]
    EmptyMarker,
}

/// Check every semantic constraint and collect the failures.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("listener.max_connections", config.listener.max_connections as u64),
        ("limits.max_body_bytes", config.limits.max_body_bytes as u64),
        (
            "limits.max_decompressed_bytes",
            config.limits.max_decompressed_bytes as u64,
        ),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.read_secs", config.timeouts.read_secs),
        ("timeouts.write_secs", config.timeouts.write_secs),
        ("timeouts.shutdown_grace_secs", config.timeouts.shutdown_grace_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.limits.max_header_bytes < MIN_HEADER_BYTES {
        errors.push(ValidationError::HeaderLimitTooSmall {
            min: MIN_HEADER_BYTES,
            actual: config.limits.max_header_bytes,
        });
    }

    let statuses = [
        ("responses.blocked_status", &config.responses.blocked_status),
        ("responses.bad_request_status", &config.responses.bad_request_status),
        ("responses.bad_gateway_status", &config.responses.bad_gateway_status),
        (
            "responses.gateway_timeout_status",
            &config.responses.gateway_timeout_status,
        ),
    ];
    for (field, value) in statuses {
        if !starts_with_status_code(value) {
            errors.push(ValidationError::InvalidStatus {
                field,
                value: value.clone(),
            });
        }
    }

    if config.censor.marker.is_empty() {
        errors.push(ValidationError::EmptyMarker);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn starts_with_status_code(status: &str) -> bool {
    let code = status.split_whitespace().next().unwrap_or_default();
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit())
}
