//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing the LLM gateway to be exercised without calling real APIs.
//!
//! # Features
//!
//! - Pre-configured responses
//! - Simulated delays for timeout testing
//! - Error injection for retry testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response(r#"{"outcome":"accepted","rationale":"fair"}"#)
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success { content: String },
    Error(AIError),
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1", 128_000),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        lock(&self.responses).push_back(MockResponse::Success {
            content: content.into(),
        });
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: AIError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: "Mock response".to_string(),
            })
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success { content } => Ok(CompletionResponse {
                usage: TokenUsage::new(10, (content.len() / 4) as u32),
                content,
                model: self.info.model.clone(),
                finish_reason: FinishReason::Stop,
            }),
            MockResponse::Error(err) => Err(err),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::ports::{MessageRole, RequestMetadata};

    fn request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(SessionId::new(), "counterparty", "t-1"))
            .with_message(MessageRole::User, "Proposal")
    }

    #[tokio::test]
    async fn returns_responses_in_order_then_default() {
        let provider = MockAIProvider::new().with_response("First").with_response("Second");

        assert_eq!(provider.complete(request()).await.unwrap().content, "First");
        assert_eq!(provider.complete(request()).await.unwrap().content, "Second");
        assert_eq!(provider.complete(request()).await.unwrap().content, "Mock response");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn returns_injected_error() {
        let provider = MockAIProvider::new().with_error(AIError::rate_limited(3));

        let err = provider.complete(request()).await.unwrap_err();
        assert_eq!(err, AIError::rate_limited(3));
    }

    #[tokio::test]
    async fn records_calls() {
        let provider = MockAIProvider::new();
        provider.complete(request()).await.unwrap();

        let calls = provider.get_calls();
        assert_eq!(calls[0].metadata.purpose, "counterparty");
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_applied() {
        let provider = MockAIProvider::new().with_delay(Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        provider.complete(request()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
