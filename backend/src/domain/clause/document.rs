//! Source document holding the full text clauses are anchored in.

use serde::{Deserialize, Serialize};

use super::Clause;
use crate::domain::foundation::{DocumentId, ValidationError};

/// An ingested document. Clause spans index into `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    id: DocumentId,
    title: String,
    text: String,
}

impl SourceDocument {
    pub fn new(
        id: DocumentId,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ValidationError::empty_field("text"));
        }
        Ok(Self {
            id,
            title: title.into(),
            text,
        })
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Checks that a clause belongs to this document and its span matches the text.
    pub fn verify_clause(&self, clause: &Clause) -> Result<(), ValidationError> {
        if clause.document_id() != &self.id {
            return Err(ValidationError::invalid_format(
                "document_id",
                format!(
                    "clause {} belongs to {}, not {}",
                    clause.id(),
                    clause.document_id(),
                    self.id
                ),
            ));
        }
        match clause.span().slice(&self.text) {
            Some(excerpt) if excerpt == clause.text() => Ok(()),
            _ => Err(ValidationError::invalid_format(
                "span",
                format!(
                    "clause {} text does not match document at {}",
                    clause.id(),
                    clause.span()
                ),
            )),
        }
    }
}
