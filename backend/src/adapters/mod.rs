//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - LLM provider clients (Anthropic, mock)
//! - `events` - In-memory event bus
//! - `gateway` - Model gateway implementations (LLM-backed, scripted)
//! - `http` - REST API
//! - `retrieval` - Grounding chunk index
//! - `storage` - In-memory clause store, session repository, bundle loading

pub mod ai;
pub mod events;
pub mod gateway;
pub mod http;
pub mod retrieval;
pub mod storage;

pub use events::InMemoryEventBus;
pub use gateway::{LlmModelGateway, ScriptedModelGateway};
pub use storage::{ClauseBundle, InMemoryClauseStore, InMemorySessionRepository};
