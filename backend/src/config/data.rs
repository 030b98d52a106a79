//! Input data configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Where ingested clauses come from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataConfig {
    /// JSON or YAML clause bundle loaded at startup
    pub bundle_path: Option<String>,
}

impl DataConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.bundle_path {
            Some(path) if path.trim().is_empty() => Err(ValidationError::InvalidBundlePath),
            _ => Ok(()),
        }
    }
}
