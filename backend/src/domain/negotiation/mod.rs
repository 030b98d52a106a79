//! Negotiation domain module.
//!
//! Owns per-clause negotiation state: the session aggregate with its
//! append-only turn log, the clause state machine, and the terms the
//! history implies.
//!
//! # Events
//!
//! - `SessionOpened` - Published when a session is created
//! - `TurnCommitted` - Published when a turn commits
//! - `StrategyTipAttached` - Published when a late tip lands on a turn
//! - `SessionWithdrawn` - Published when the user abandons a session
//! - `SessionReopened` - Published when a terminal session is reopened
//! - `SessionFinalized` - Published when an artifact is produced

mod agreed;
mod context;
mod errors;
mod events;
mod outcome;
mod session;
mod state;
mod turn;

pub use agreed::{AgreedChange, Disposition};
pub use context::NegotiationContext;
pub use errors::{ConflictReason, NegotiationError};
pub use events::{
    SessionFinalized, SessionOpened, SessionReopened, SessionWithdrawn, StrategyTipAttached,
    TurnCommitted, AGGREGATE_TYPE,
};
pub use outcome::{GroundingSnippet, OutcomeKind, ProposalOutcome, StrategyTip};
pub use session::NegotiationSession;
pub use state::ClauseNegotiationState;
pub use turn::Turn;
