//! Event publisher port - outbound channel for negotiation events.
//!
//! Late strategy tips reach listeners through this channel.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Callers publish after the session change is saved. A failed publish
/// never undoes the change.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;
}
