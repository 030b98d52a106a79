//! Clause store port - read-only access to ingested clauses and documents.

use async_trait::async_trait;

use crate::domain::clause::{Clause, SourceDocument};
use crate::domain::foundation::{ClauseId, DocumentId, DomainError};

/// Read-only view of classified clauses.
///
/// The negotiation core never writes here, so implementations need no
/// coordination with session state.
#[async_trait]
pub trait ClauseStore: Send + Sync {
    async fn find_clause(&self, id: &ClauseId) -> Result<Option<Clause>, DomainError>;

    async fn find_document(&self, id: &DocumentId) -> Result<Option<SourceDocument>, DomainError>;

    /// Clauses of a document ordered by their position in the text.
    async fn list_clauses(&self, document_id: &DocumentId) -> Result<Vec<Clause>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ClauseStore) {}
}
