//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, events)
//! - `clause` - Classified clauses and the documents they come from
//! - `negotiation` - Session aggregate, turn log and clause state machine
//! - `reconciliation` - Pure derivation of redlines and summaries

pub mod clause;
pub mod foundation;
pub mod negotiation;
pub mod reconciliation;
