//! Clause entity - a single classified provision of a source document.
//!
//! Clauses are immutable once classified. The negotiation core only ever
//! reads them; ingestion owns their creation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PageRange, TextSpan};
use crate::domain::foundation::{ClauseId, DocumentId, ValidationError};

/// Risk classification assigned during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    High,
    Negotiable,
    Standard,
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLabel::High => "High",
            RiskLabel::Negotiable => "Negotiable",
            RiskLabel::Standard => "Standard",
        };
        write!(f, "{}", s)
    }
}

/// A classified clause.
///
/// # Invariants
///
/// - `text` is non-blank and `span.len() == text.len()`
/// - `term_span` lies inside `text` on char boundaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    id: ClauseId,
    document_id: DocumentId,
    section_title: Option<String>,
    pages: Option<PageRange>,
    text: String,
    span: TextSpan,
    risk: RiskLabel,
    negotiable: bool,
    /// Location of the negotiable term, relative to `text`.
    term_span: TextSpan,
}

impl Clause {
    /// Creates a clause whose negotiable term is its whole text.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if text is blank
    /// - `InvalidFormat` if the span length differs from the text length
    pub fn new(
        id: ClauseId,
        document_id: DocumentId,
        text: impl Into<String>,
        span: TextSpan,
        risk: RiskLabel,
        negotiable: bool,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("text"));
        }
        if span.len() != text.len() {
            return Err(ValidationError::invalid_format(
                "span",
                format!(
                    "span {} covers {} bytes but clause text has {}",
                    span,
                    span.len(),
                    text.len()
                ),
            ));
        }

        let term_span = TextSpan::covering(&text);
        Ok(Self {
            id,
            document_id,
            section_title: None,
            pages: None,
            text,
            span,
            risk,
            negotiable,
            term_span,
        })
    }

    /// Narrows the negotiable term to the first occurrence of `term` in the text.
    pub fn with_term(mut self, term: &str) -> Result<Self, ValidationError> {
        if term.trim().is_empty() {
            return Err(ValidationError::empty_field("term"));
        }
        let start = self.text.find(term).ok_or_else(|| {
            ValidationError::invalid_format("term", "term does not occur in clause text")
        })?;
        self.term_span = TextSpan::new(start, start + term.len())?;
        Ok(self)
    }

    pub fn with_section_title(mut self, title: impl Into<String>) -> Self {
        self.section_title = Some(title.into());
        self
    }

    pub fn with_pages(mut self, pages: PageRange) -> Self {
        self.pages = Some(pages);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &ClauseId {
        &self.id
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn section_title(&self) -> Option<&str> {
        self.section_title.as_deref()
    }

    pub fn pages(&self) -> Option<PageRange> {
        self.pages
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Location of the clause in its source document.
    pub fn span(&self) -> TextSpan {
        self.span
    }

    pub fn risk(&self) -> RiskLabel {
        self.risk
    }

    pub fn is_negotiable(&self) -> bool {
        self.negotiable
    }

    /// The negotiable term.
    pub fn term(&self) -> &str {
        // term_span is validated against text at construction
        self.term_span.slice(&self.text).unwrap_or(&self.text)
    }

    /// Location of the term relative to the clause text.
    pub fn term_span(&self) -> TextSpan {
        self.term_span
    }

    /// Location of the term in document coordinates.
    pub fn term_span_in_document(&self) -> TextSpan {
        self.term_span.shifted(self.span.start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPOSIT: &str = "Tenant shall pay a security deposit of 2 months rent.";

    fn deposit_clause() -> Clause {
        Clause::new(
            ClauseId::new("c-deposit").unwrap(),
            DocumentId::new("lease-1").unwrap(),
            DEPOSIT,
            TextSpan::new(100, 100 + DEPOSIT.len()).unwrap(),
            RiskLabel::High,
            true,
        )
        .unwrap()
    }

    #[test]
    fn new_defaults_term_to_full_text() {
        let clause = deposit_clause();
        assert_eq!(clause.term(), DEPOSIT);
        assert_eq!(clause.term_span_in_document(), clause.span());
    }

    #[test]
    fn new_rejects_blank_text() {
        let result = Clause::new(
            ClauseId::new("c").unwrap(),
            DocumentId::new("d").unwrap(),
            "   ",
            TextSpan::new(0, 3).unwrap(),
            RiskLabel::Standard,
            true,
        );
        assert_eq!(result.unwrap_err(), ValidationError::empty_field("text"));
    }

    #[test]
    fn new_rejects_mismatched_span() {
        let result = Clause::new(
            ClauseId::new("c").unwrap(),
            DocumentId::new("d").unwrap(),
            "abc",
            TextSpan::new(0, 10).unwrap(),
            RiskLabel::Standard,
            true,
        );
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn with_term_locates_term_in_document() {
        let clause = deposit_clause().with_term("2 months").unwrap();
        assert_eq!(clause.term(), "2 months");
        let offset = DEPOSIT.find("2 months").unwrap();
        assert_eq!(clause.term_span().start(), offset);
        assert_eq!(clause.term_span_in_document().start(), 100 + offset);
    }

    #[test]
    fn with_term_rejects_missing_term() {
        assert!(deposit_clause().with_term("3 weeks").is_err());
    }

    #[test]
    fn provenance_builders() {
        let clause = deposit_clause()
            .with_section_title("4. Deposit")
            .with_pages(PageRange::new(2, 3).unwrap());
        assert_eq!(clause.section_title(), Some("4. Deposit"));
        assert_eq!(clause.pages().map(|p| p.first()), Some(2));
    }
}
