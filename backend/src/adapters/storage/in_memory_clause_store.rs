//! In-Memory Clause Store
//!
//! Holds ingested documents and clauses. Populated once at startup from a
//! bundle, then only read.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::ClauseBundle;
use crate::domain::clause::{Clause, SourceDocument};
use crate::domain::foundation::{ClauseId, DocumentId, DomainError, ValidationError};
use crate::ports::ClauseStore;

/// In-memory clause and document storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClauseStore {
    documents: Arc<RwLock<HashMap<DocumentId, SourceDocument>>>,
    clauses: Arc<RwLock<HashMap<ClauseId, Clause>>>,
}

impl InMemoryClauseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a loaded bundle, verifying every clause against its document.
    pub async fn from_bundle(bundle: &ClauseBundle) -> Result<Self, ValidationError> {
        let store = Self::new();
        for document in &bundle.documents {
            store.insert_document(document.clone()).await;
        }
        for clause in &bundle.clauses {
            store.insert_clause(clause.clone()).await?;
        }
        Ok(store)
    }

    pub async fn insert_document(&self, document: SourceDocument) {
        self.documents
            .write()
            .await
            .insert(document.id().clone(), document);
    }

    /// Adds a clause. If its document is known, the span must match the document text.
    pub async fn insert_clause(&self, clause: Clause) -> Result<(), ValidationError> {
        if let Some(document) = self.documents.read().await.get(clause.document_id()) {
            document.verify_clause(&clause)?;
        }
        self.clauses.write().await.insert(clause.id().clone(), clause);
        Ok(())
    }

    pub async fn clause_count(&self) -> usize {
        self.clauses.read().await.len()
    }
}

#[async_trait]
impl ClauseStore for InMemoryClauseStore {
    async fn find_clause(&self, id: &ClauseId) -> Result<Option<Clause>, DomainError> {
        Ok(self.clauses.read().await.get(id).cloned())
    }

    async fn find_document(&self, id: &DocumentId) -> Result<Option<SourceDocument>, DomainError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn list_clauses(&self, document_id: &DocumentId) -> Result<Vec<Clause>, DomainError> {
        let mut clauses: Vec<Clause> = self
            .clauses
            .read()
            .await
            .values()
            .filter(|c| c.document_id() == document_id)
            .cloned()
            .collect();
        clauses.sort_by(|a, b| (a.span().start(), a.id()).cmp(&(b.span().start(), b.id())));
        Ok(clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clause::{RiskLabel, TextSpan};

    const TEXT: &str = "Rent is due monthly. Deposit is 2 months.";

    fn clause(id: &str, sentence: &str) -> Clause {
        let start = TEXT.find(sentence).unwrap();
        Clause::new(
            ClauseId::new(id).unwrap(),
            DocumentId::new("lease").unwrap(),
            sentence,
            TextSpan::new(start, start + sentence.len()).unwrap(),
            RiskLabel::Negotiable,
            true,
        )
        .unwrap()
    }

    async fn store() -> InMemoryClauseStore {
        let store = InMemoryClauseStore::new();
        store
            .insert_document(
                SourceDocument::new(DocumentId::new("lease").unwrap(), "Lease", TEXT).unwrap(),
            )
            .await;
        store
    }

    #[tokio::test]
    async fn list_clauses_orders_by_position() {
        let store = store().await;
        store.insert_clause(clause("z-deposit", "Deposit is 2 months.")).await.unwrap();
        store.insert_clause(clause("a-rent", "Rent is due monthly.")).await.unwrap();

        let ids: Vec<String> = store
            .list_clauses(&DocumentId::new("lease").unwrap())
            .await
            .unwrap()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a-rent", "z-deposit"]);
    }

    #[tokio::test]
    async fn misaligned_clause_is_rejected() {
        let store = store().await;
        let bad = Clause::new(
            ClauseId::new("bad").unwrap(),
            DocumentId::new("lease").unwrap(),
            "Deposit is 2 months.",
            TextSpan::new(0, "Deposit is 2 months.".len()).unwrap(),
            RiskLabel::Standard,
            true,
        )
        .unwrap();
        assert!(store.insert_clause(bad).await.is_err());
        assert_eq!(store.clause_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_ids_return_none() {
        let store = store().await;
        assert!(store
            .find_clause(&ClauseId::new("missing").unwrap())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_document(&DocumentId::new("missing").unwrap())
            .await
            .unwrap()
            .is_none());
    }
}
