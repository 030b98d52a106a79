//! In-process event bus.
//!
//! Fans published events out on a broadcast channel for streaming
//! listeners. Envelopes are only kept when retention is switched on, which
//! tests use to inspect what was published.

use async_trait::async_trait;
use std::sync::RwLock;
use tokio::sync::broadcast;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

/// Default broadcast buffer when none is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// In-memory event bus.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new().with_retention());
/// let mut listener = bus.listen();
///
/// bus.publish(envelope).await?;
///
/// let received = listener.recv().await?;
/// assert!(bus.has_event("negotiation.turn_committed.v1"));
/// ```
pub struct InMemoryEventBus {
    /// `None` unless built with `with_retention`.
    published: Option<RwLock<Vec<EventEnvelope>>>,
    channel: broadcast::Sender<EventEnvelope>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus whose broadcast channel buffers `capacity` events per listener.
    pub fn with_capacity(capacity: usize) -> Self {
        let (channel, _) = broadcast::channel(capacity.max(1));
        Self {
            published: None,
            channel,
        }
    }

    /// Keep every published envelope for later inspection.
    ///
    /// Memory grows with each event, so servers leave this off.
    pub fn with_retention(mut self) -> Self {
        self.published = Some(RwLock::new(Vec::new()));
        self
    }

    /// Receiver for every event published from now on.
    ///
    /// Slow receivers lag rather than block publishers.
    pub fn listen(&self) -> broadcast::Receiver<EventEnvelope> {
        self.channel.subscribe()
    }

    // === Inspection (empty without retention) ===

    /// All events published so far.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        match &self.published {
            Some(published) => published
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
            None => Vec::new(),
        }
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn events_for_aggregate(&self, aggregate_id: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.published.as_ref().map_or(0, |published| {
            published
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .len()
        })
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.published_events()
            .iter()
            .any(|e| e.event_type == event_type)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if let Some(published) = &self.published {
            published
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(event.clone());
        }

        // no listeners is not an error
        let _ = self.channel.send(event);
        Ok(())
    }
}
