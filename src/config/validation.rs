//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate socket addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{RelayConfig, MAX_UDP_PAYLOAD};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("collector.max_datagram_bytes must be between 1 and {max}, got {0}", max = MAX_UDP_PAYLOAD)]
    DatagramSize(usize),

    #[error("front_door.request_timeout_secs must be greater than 0")]
    ZeroTimeout,

    #[error("storage.path must not be empty")]
    EmptyStoragePath,

    #[error("observability.log_level: unknown level '{0}'")]
    UnknownLogLevel(String),
}

/// Check a loaded configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "front_door.bind_address", &config.front_door.bind_address);
    check_address(
        &mut errors,
        "front_door.collector_address",
        &config.front_door.collector_address,
    );
    check_address(&mut errors, "collector.bind_address", &config.collector.bind_address);

    let size = config.collector.max_datagram_bytes;
    if size == 0 || size > MAX_UDP_PAYLOAD {
        errors.push(ValidationError::DatagramSize(size));
    }

    if config.front_door.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.storage.path.trim().is_empty() {
        errors.push(ValidationError::EmptyStoragePath);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
