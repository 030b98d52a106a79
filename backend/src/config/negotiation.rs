//! Negotiation engine configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Retry, timeout and limit settings for turn orchestration
#[derive(Debug, Clone, Deserialize)]
pub struct NegotiationConfig {
    /// Retries after the first attempt of each collaborator call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled per retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    #[serde(default = "default_counterparty_timeout")]
    pub counterparty_timeout_secs: u64,

    #[serde(default = "default_strategy_timeout")]
    pub strategy_timeout_secs: u64,

    #[serde(default = "default_retrieval_timeout")]
    pub retrieval_timeout_secs: u64,

    /// How long the counterparty call waits for grounding before going without
    #[serde(default = "default_grounding_wait_ms")]
    pub grounding_wait_ms: u64,

    /// Maximum proposal length in characters, after trimming
    #[serde(default = "default_max_proposal_chars")]
    pub max_proposal_chars: usize,

    #[serde(default = "default_max_grounding_snippets")]
    pub max_grounding_snippets: usize,

    /// Capacity of the broadcast channel event listeners read from
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl NegotiationConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub fn counterparty_timeout(&self) -> Duration {
        Duration::from_secs(self.counterparty_timeout_secs)
    }

    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_secs(self.strategy_timeout_secs)
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs)
    }

    pub fn grounding_wait(&self) -> Duration {
        Duration::from_millis(self.grounding_wait_ms)
    }

    /// Longest a turn submission can run once it holds the session gate:
    /// the grounding wait, every counterparty attempt timing out, and a
    /// full backoff between attempts.
    pub fn worst_case_turn(&self) -> Duration {
        self.grounding_wait()
            + self.counterparty_timeout() * (self.max_retries + 1)
            + self.backoff_max() * self.max_retries
    }

    /// Validate negotiation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_retries > 10 {
            return Err(ValidationError::InvalidLimit("negotiation.max_retries"));
        }
        if self.backoff_base_ms == 0 || self.backoff_base_ms > self.backoff_max_ms {
            return Err(ValidationError::InvalidBackoff);
        }
        if self.counterparty_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("negotiation.counterparty_timeout_secs"));
        }
        if self.strategy_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("negotiation.strategy_timeout_secs"));
        }
        if self.retrieval_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("negotiation.retrieval_timeout_secs"));
        }
        if self.max_proposal_chars == 0 {
            return Err(ValidationError::InvalidLimit("negotiation.max_proposal_chars"));
        }
        if self.event_channel_capacity == 0 {
            return Err(ValidationError::InvalidLimit("negotiation.event_channel_capacity"));
        }
        Ok(())
    }
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            counterparty_timeout_secs: default_counterparty_timeout(),
            strategy_timeout_secs: default_strategy_timeout(),
            retrieval_timeout_secs: default_retrieval_timeout(),
            grounding_wait_ms: default_grounding_wait_ms(),
            max_proposal_chars: default_max_proposal_chars(),
            max_grounding_snippets: default_max_grounding_snippets(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    250
}

fn default_backoff_max_ms() -> u64 {
    4_000
}

fn default_counterparty_timeout() -> u64 {
    30
}

fn default_strategy_timeout() -> u64 {
    30
}

fn default_retrieval_timeout() -> u64 {
    5
}

fn default_grounding_wait_ms() -> u64 {
    1_500
}

fn default_max_proposal_chars() -> usize {
    2_000
}

fn default_max_grounding_snippets() -> usize {
    5
}

fn default_event_channel_capacity() -> usize {
    256
}
