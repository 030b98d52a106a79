//! Model Gateway Adapters
//!
//! - `LlmModelGateway` - counterparty and strategist over an AIProvider, grounding from a local index
//! - `ScriptedModelGateway` - canned results for tests and offline runs

mod llm;
mod scripted;

pub use llm::LlmModelGateway;
pub use scripted::ScriptedModelGateway;
