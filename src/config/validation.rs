//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject denylist entries that are not bare host names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SiteConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("rewrite.preconnect_denylist: {0:?} is not a bare host name")]
    InvalidHost(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.upstream.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "upstream.address",
            value: config.upstream.address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.rewrite.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "rewrite.max_body_bytes" });
    }

    for host in &config.rewrite.preconnect_denylist {
        if !is_bare_host(host) {
            errors.push(ValidationError::InvalidHost(host.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_bare_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}
