//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Which backend produces counterparty and strategist output
    #[serde(default)]
    pub provider: AiProvider,

    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Completion token limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Anthropic,
    /// Canned responses, no network
    Scripted,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if Anthropic is configured
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == AiProvider::Anthropic && !self.has_anthropic() {
            return Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("ai.timeout_secs"));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidLimit("ai.max_tokens"));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            anthropic_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.provider, AiProvider::Anthropic);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn test_anthropic_requires_key() {
        assert_eq!(
            AiConfig::default().validate(),
            Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"))
        );

        let config = AiConfig {
            anthropic_api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scripted_needs_no_key() {
        let config = AiConfig {
            provider: AiProvider::Scripted,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_valid_config() {
        let config = AiConfig {
            anthropic_api_key: Some("sk-ant-xxx".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
