//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, chunk sizes > 0)
//! - Check listen addresses parse as socket addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

#[derive(Debug)]
pub enum ValidationError {
    BadBindAddress(String),
    BadFallbackAddress(String),
    ZeroTimeout(&'static str),
    ZeroChunkSize,
    IncompleteTls,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::BadBindAddress(addr) => {
                write!(f, "invalid bind address '{}'", addr)
            }
            ValidationError::BadFallbackAddress(addr) => {
                write!(f, "invalid fallback bind address '{}'", addr)
            }
            ValidationError::ZeroTimeout(which) => {
                write!(f, "timeout '{}' must be greater than zero", which)
            }
            ValidationError::ZeroChunkSize => {
                write!(f, "partial reliability chunk size must be greater than zero")
            }
            ValidationError::IncompleteTls => {
                write!(f, "tls cert_path and key_path must be set together")
            }
        }
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadBindAddress(config.bind_address.clone()));
    }
    if config.fallback.enabled && config.fallback.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadFallbackAddress(
            config.fallback.bind_address.clone(),
        ));
    }

    if config.timeouts.txn_idle_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("txn_idle_ms"));
    }
    if config.timeouts.conn_idle_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("conn_idle_ms"));
    }

    if config.partial_reliability.chunk_size == Some(0) {
        errors.push(ValidationError::ZeroChunkSize);
    }

    if config.tls.cert_path.is_some() != config.tls.key_path.is_some() {
        errors.push(ValidationError::IncompleteTls);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
