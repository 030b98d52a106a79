//! In-Memory Session Repository
//!
//! Keeps negotiation sessions in a map keyed by session ID, with insertion
//! order retained so the head of each clause's lineage can be found.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ClauseId, DomainError, ErrorCode, SessionId};
use crate::domain::negotiation::NegotiationSession;
use crate::ports::{InsertResult, SessionRepository};

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<SessionId, NegotiationSession>,
    /// Insertion order, oldest first.
    order: Vec<SessionId>,
}

/// In-memory session storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: &NegotiationSession) -> Result<InsertResult, DomainError> {
        let mut inner = self.inner.write().await;

        if let Some(active) = inner
            .sessions
            .values()
            .find(|s| s.clause_id() == session.clause_id() && !s.is_terminal())
        {
            return Ok(InsertResult::ActiveSessionExists(*active.id()));
        }

        inner.order.push(*session.id());
        inner.sessions.insert(*session.id(), session.clone());
        Ok(InsertResult::Inserted)
    }

    async fn update(&self, session: &NegotiationSession) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(session.id()) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            )),
        }
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<NegotiationSession>, DomainError> {
        Ok(self.inner.read().await.sessions.get(id).cloned())
    }

    async fn find_latest_by_clause(
        &self,
        clause_id: &ClauseId,
    ) -> Result<Option<NegotiationSession>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.sessions.get(id))
            .find(|s| s.clause_id() == clause_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clause::{Clause, RiskLabel, TextSpan};
    use crate::domain::foundation::DocumentId;
    use crate::domain::negotiation::ProposalOutcome;

    fn clause(id: &str) -> Clause {
        let text = "Deposit of 2 months.";
        Clause::new(
            ClauseId::new(id).unwrap(),
            DocumentId::new("lease").unwrap(),
            text,
            TextSpan::covering(text),
            RiskLabel::High,
            true,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_find() {
        let repo = InMemorySessionRepository::new();
        let session = NegotiationSession::open(&clause("a")).unwrap();

        assert_eq!(repo.insert(&session).await.unwrap(), InsertResult::Inserted);
        assert_eq!(repo.find_by_id(session.id()).await.unwrap(), Some(session));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn second_active_session_for_clause_is_refused() {
        let repo = InMemorySessionRepository::new();
        let first = NegotiationSession::open(&clause("a")).unwrap();
        let second = NegotiationSession::open(&clause("a")).unwrap();

        repo.insert(&first).await.unwrap();
        assert_eq!(
            repo.insert(&second).await.unwrap(),
            InsertResult::ActiveSessionExists(*first.id())
        );
        assert!(repo.find_by_id(second.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn other_clauses_are_independent() {
        let repo = InMemorySessionRepository::new();
        repo.insert(&NegotiationSession::open(&clause("a")).unwrap())
            .await
            .unwrap();
        assert_eq!(
            repo.insert(&NegotiationSession::open(&clause("b")).unwrap())
                .await
                .unwrap(),
            InsertResult::Inserted
        );
    }

    #[tokio::test]
    async fn update_unknown_session_fails() {
        let repo = InMemorySessionRepository::new();
        let session = NegotiationSession::open(&clause("a")).unwrap();
        let err = repo.update(&session).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn latest_follows_lineage_and_terminal_frees_the_clause() {
        let repo = InMemorySessionRepository::new();
        let mut first = NegotiationSession::open(&clause("a")).unwrap();
        repo.insert(&first).await.unwrap();

        first
            .record_turn("1 month".into(), ProposalOutcome::accepted("ok"), vec![])
            .unwrap();
        repo.update(&first).await.unwrap();
        let a = ClauseId::new("a").unwrap();

        let reopened = NegotiationSession::reopen(&first).unwrap();
        assert_eq!(repo.insert(&reopened).await.unwrap(), InsertResult::Inserted);

        let latest = repo.find_latest_by_clause(&a).await.unwrap().unwrap();
        assert_eq!(latest.id(), reopened.id());
        assert_eq!(repo.len().await, 2);
    }
}
