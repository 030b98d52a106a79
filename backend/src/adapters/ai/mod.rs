//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Configurable mock for testing
//! - `AnthropicProvider` - Anthropic Claude models over the Messages API

mod anthropic_provider;
mod mock_provider;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_provider::{MockAIProvider, MockResponse};
