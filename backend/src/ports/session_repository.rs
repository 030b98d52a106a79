//! Session repository port - persistence for negotiation sessions.
//!
//! Sessions are stored keyed by ID, each holding its clause, state and
//! append-only turn log, which is enough to replay or audit a negotiation.

use async_trait::async_trait;

use crate::domain::foundation::{ClauseId, DomainError, SessionId};
use crate::domain::negotiation::NegotiationSession;

/// Result of inserting a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Inserted,
    /// Another non-terminal session already covers the clause.
    ActiveSessionExists(SessionId),
}

/// Repository port for negotiation sessions.
///
/// Writers are serialized per session by the caller; the repository only
/// guarantees that each call is atomic.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Inserts a new session unless its clause already has an active one.
    ///
    /// The check and the insert happen atomically.
    async fn insert(&self, session: &NegotiationSession) -> Result<InsertResult, DomainError>;

    /// Replaces a stored session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if it was never inserted
    async fn update(&self, session: &NegotiationSession) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<NegotiationSession>, DomainError>;

    /// Most recently created session for a clause, i.e. the head of its lineage.
    async fn find_latest_by_clause(
        &self,
        clause_id: &ClauseId,
    ) -> Result<Option<NegotiationSession>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SessionRepository) {}
}
