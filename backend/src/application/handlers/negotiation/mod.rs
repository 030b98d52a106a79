//! Negotiation handlers.
//!
//! - `SessionManager` - create, submit, withdraw, finalize, reopen, history
//! - `ConversationOrchestrator` - collaborator calls for one turn
//! - `SessionGate` - per-session single-writer locks
//! - `RetryPolicy` - bounded retries with backoff and per-attempt timeouts
//! - `TipTracker` - background tip and grounding tasks

mod orchestrator;
mod retry;
mod session_gate;
mod session_manager;
mod tip_tracker;

pub use orchestrator::{ConversationOrchestrator, OrchestratorSettings, PendingTip, TurnDraft};
pub use retry::{RetryExhausted, RetryPolicy};
pub use session_gate::{SessionGate, SessionGuard};
pub use session_manager::{SessionManager, TurnResult, DEFAULT_MAX_PROPOSAL_CHARS};
pub use tip_tracker::TipTracker;
