//! Application configuration module
//!
//! This module provides type-safe configuration loading using the `config` and
//! `dotenvy` crates. An optional settings file (YAML, TOML or JSON) named by
//! `CLAUSE_NEGOTIATOR_CONFIG` is read first; environment variables with the
//! `CLAUSE_NEGOTIATOR` prefix override it, with `__` separating nested values.
//!
//! # Example
//!
//! ```no_run
//! use clause_negotiator::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod data;
mod error;
mod negotiation;
mod server;

pub use ai::{AiConfig, AiProvider};
pub use data::DataConfig;
pub use error::{ConfigError, ValidationError};
pub use negotiation::NegotiationConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming an optional settings file.
pub const CONFIG_FILE_ENV: &str = "CLAUSE_NEGOTIATOR_CONFIG";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// AI provider configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Retry, timeout and limit settings
    #[serde(default)]
    pub negotiation: NegotiationConfig,

    /// Clause bundle location
    #[serde(default)]
    pub data: DataConfig,
}

impl AppConfig {
    /// Load configuration from the optional settings file and the environment
    ///
    /// # Environment Variable Format
    ///
    /// - `CLAUSE_NEGOTIATOR__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CLAUSE_NEGOTIATOR__NEGOTIATION__MAX_RETRIES=2` -> `negotiation.max_retries = 2`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the settings file is unreadable or values
    /// cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::from(PathBuf::from(path)));
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix("CLAUSE_NEGOTIATOR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section, or
    /// `RequestTimeoutTooShort` if the HTTP timeout could cut a turn short.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.negotiation.validate()?;
        self.data.validate()?;

        let worst_case_turn = self.negotiation.worst_case_turn();
        if Duration::from_secs(self.server.request_timeout_secs) <= worst_case_turn {
            return Err(ValidationError::RequestTimeoutTooShort {
                request_timeout_secs: self.server.request_timeout_secs,
                worst_case_turn_ms: worst_case_turn.as_millis() as u64,
            });
        }
        Ok(())
    }
}
