//! Model gateway port - the three collaborator capabilities used per turn.
//!
//! Each capability is tagged by role so mandatory and best-effort calls stay
//! separate: the counterparty call is required for a turn to commit, the
//! strategist and retriever calls are advisory.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use super::AIError;
use crate::domain::negotiation::{
    GroundingSnippet, NegotiationContext, ProposalOutcome, StrategyTip,
};

/// Which collaborator a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayRole {
    Counterparty,
    Strategist,
    Retriever,
}

impl fmt::Display for GatewayRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GatewayRole::Counterparty => "counterparty",
            GatewayRole::Strategist => "strategist",
            GatewayRole::Retriever => "retriever",
        };
        write!(f, "{}", s)
    }
}

/// Gateway failures, classified for retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The collaborator answered but the answer could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Returns true for transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited { .. }
                | GatewayError::Unavailable(_)
                | GatewayError::Network(_)
                | GatewayError::Timeout { .. }
        )
    }
}

impl From<AIError> for GatewayError {
    fn from(err: AIError) -> Self {
        match err {
            AIError::RateLimited { retry_after_secs } => {
                GatewayError::RateLimited { retry_after_secs }
            }
            AIError::Unavailable { message } => GatewayError::Unavailable(message),
            AIError::Network(message) => GatewayError::Network(message),
            AIError::Timeout { timeout_secs } => GatewayError::Timeout {
                timeout_ms: u64::from(timeout_secs) * 1000,
            },
            AIError::AuthenticationFailed => GatewayError::AuthenticationFailed,
            AIError::InvalidRequest(message) => GatewayError::InvalidRequest(message),
            AIError::ContextTooLong { tokens, max } => GatewayError::InvalidRequest(format!(
                "context too long: {} tokens exceeds {}",
                tokens, max
            )),
            AIError::ContentFiltered { reason } => {
                GatewayError::MalformedResponse(format!("content filtered: {}", reason))
            }
            AIError::Parse(message) => GatewayError::MalformedResponse(message),
        }
    }
}

/// Port for the negotiation collaborators.
///
/// Implementations own latency and failure; callers apply timeouts and retries.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Counterparty verdict on the proposal in `context`.
    async fn generate_counterparty_response(
        &self,
        context: &NegotiationContext,
    ) -> Result<ProposalOutcome, GatewayError>;

    /// Advice for the user on the proposal in `context`.
    async fn generate_strategy_tip(
        &self,
        context: &NegotiationContext,
    ) -> Result<StrategyTip, GatewayError>;

    /// Ranked snippets relevant to `query`, best first, at most `limit`.
    async fn retrieve_grounding_context(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GroundingSnippet>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ModelGateway) {}

    #[test]
    fn transient_errors_are_retryable() {
        assert!(GatewayError::RateLimited { retry_after_secs: 1 }.is_retryable());
        assert!(GatewayError::unavailable("503").is_retryable());
        assert!(GatewayError::Network("reset".into()).is_retryable());
        assert!(GatewayError::Timeout { timeout_ms: 10 }.is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!GatewayError::AuthenticationFailed.is_retryable());
        assert!(!GatewayError::InvalidRequest("bad".into()).is_retryable());
        assert!(!GatewayError::malformed("not json").is_retryable());
    }

    #[test]
    fn ai_errors_keep_retry_class() {
        let cases = [
            (AIError::rate_limited(2), true),
            (AIError::unavailable("down"), true),
            (AIError::network("dns"), true),
            (AIError::Timeout { timeout_secs: 3 }, true),
            (AIError::AuthenticationFailed, false),
            (AIError::parse("eof"), false),
            (AIError::context_too_long(10, 5), false),
        ];
        for (ai, retryable) in cases {
            assert_eq!(GatewayError::from(ai).is_retryable(), retryable);
        }
    }

    #[test]
    fn timeout_converts_to_millis() {
        assert_eq!(
            GatewayError::from(AIError::Timeout { timeout_secs: 3 }),
            GatewayError::Timeout { timeout_ms: 3000 }
        );
    }

    #[test]
    fn role_display() {
        assert_eq!(GatewayRole::Strategist.to_string(), "strategist");
    }
}
