//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidHost(String),

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Backoff base must be positive and not exceed backoff max")]
    InvalidBackoff,

    #[error("Invalid limit for {0}")]
    InvalidLimit(&'static str),

    #[error("Bundle path must not be empty")]
    InvalidBundlePath,

    #[error(
        "server.request_timeout_secs ({request_timeout_secs}s) must exceed the longest turn ({worst_case_turn_ms}ms)"
    )]
    RequestTimeoutTooShort {
        request_timeout_secs: u64,
        worst_case_turn_ms: u64,
    },
}
