//! Reconciliation domain module.
//!
//! Turns terminal negotiation history into output artifacts: a redlined
//! document and a structured summary, bundled with a content digest.
//! Everything here is derived and regenerable.

mod artifact;
mod reconciler;
mod redline;
mod summary;

pub use artifact::OutputArtifact;
pub use reconciler::{reconcile_clause, reconcile_document, reconcile_session, ClauseReconciliation};
pub use redline::{RedlineChange, RedlinedDocument};
pub use summary::{NegotiationSummary, SummaryRow};
