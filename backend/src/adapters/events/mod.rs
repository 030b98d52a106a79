//! Event bus adapters.
//!
//! - `InMemoryEventBus` - In-process bus with a broadcast channel for
//!   streaming listeners and opt-in retention for inspection

mod in_memory;

pub use in_memory::{InMemoryEventBus, DEFAULT_CHANNEL_CAPACITY};
