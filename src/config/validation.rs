//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Validation is a pure
//! function that reports every problem, not just the first one, and runs
//! before the config is accepted into the system.

use std::net::IpAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.host {0:?} is not an IP address")]
    InvalidListenHost(String),

    #[error("upstream.address must not be empty")]
    EmptyUpstream,

    #[error("forwarding.max_buffer_bytes must be greater than zero")]
    ZeroBuffer,

    #[error("forwarding.connect_timeout_secs must be greater than zero")]
    ZeroConnectTimeout,
}

/// Check a configuration, returning all validation errors found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidListenHost(
            config.listener.host.clone(),
        ));
    }
    if config.upstream.address.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstream);
    }
    if config.forwarding.max_buffer_bytes == 0 {
        errors.push(ValidationError::ZeroBuffer);
    }
    if config.forwarding.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Render a list of validation errors on one line.
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
