//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, errors, the state machine trait
//! and event infrastructure used by every other domain module.

mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{domain_event, DomainEvent, EventEnvelope, EventId};
pub use ids::{ClauseId, DocumentId, SessionId, TurnNumber};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
