//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Data Ports
//!
//! - `ClauseStore` - Read-only clauses and source documents
//! - `SessionRepository` - Negotiation session persistence
//!
//! ## Collaborator Ports
//!
//! - `ModelGateway` - Counterparty, strategist and retrieval capabilities
//! - `AIProvider` - LLM completions behind the gateway
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events

mod ai_provider;
mod clause_store;
mod event_publisher;
mod model_gateway;
mod session_repository;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use clause_store::ClauseStore;
pub use event_publisher::EventPublisher;
pub use model_gateway::{GatewayError, GatewayRole, ModelGateway};
pub use session_repository::{InsertResult, SessionRepository};
