//! Redlined document: original text plus delete/insert spans.

use serde::{Deserialize, Serialize};

use crate::domain::clause::TextSpan;
use crate::domain::foundation::{ClauseId, DocumentId};

/// One replacement: delete `span` of the original, insert `inserted_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedlineChange {
    pub clause_id: ClauseId,
    /// Relative to the owning document's `original_text`.
    pub span: TextSpan,
    pub deleted_text: String,
    pub inserted_text: String,
}

/// Original text annotated with non-overlapping changes sorted by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedlinedDocument {
    pub document_id: DocumentId,
    /// Offset of `original_text` within the full source document.
    pub base_offset: usize,
    pub original_text: String,
    pub changes: Vec<RedlineChange>,
}

impl RedlinedDocument {
    pub fn new(document_id: DocumentId, base_offset: usize, original_text: String) -> Self {
        Self {
            document_id,
            base_offset,
            original_text,
            changes: Vec::new(),
        }
    }

    /// Location of a change in source-document coordinates.
    pub fn document_span(&self, change: &RedlineChange) -> TextSpan {
        change.span.shifted(self.base_offset)
    }

    /// Original text with every change applied.
    pub fn amended_text(&self) -> String {
        self.render(|out, change| out.push_str(&change.inserted_text))
    }

    /// Original text with changes shown inline as `[-deleted-]{+inserted+}`.
    pub fn markup(&self) -> String {
        self.render(|out, change| {
            if !change.deleted_text.is_empty() {
                out.push_str("[-");
                out.push_str(&change.deleted_text);
                out.push_str("-]");
            }
            if !change.inserted_text.is_empty() {
                out.push_str("{+");
                out.push_str(&change.inserted_text);
                out.push_str("+}");
            }
        })
    }

    fn render<F>(&self, mut emit: F) -> String
    where
        F: FnMut(&mut String, &RedlineChange),
    {
        let mut out = String::with_capacity(self.original_text.len());
        let mut cursor = 0;
        for change in &self.changes {
            // out-of-range spans contribute nothing
            out.push_str(
                self.original_text
                    .get(cursor..change.span.start())
                    .unwrap_or_default(),
            );
            emit(&mut out, change);
            cursor = cursor.max(change.span.end());
        }
        out.push_str(self.original_text.get(cursor..).unwrap_or_default());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redline() -> RedlinedDocument {
        let text = "Deposit: 2 months. Notice: 30 days.";
        let mut doc = RedlinedDocument::new(DocumentId::new("lease").unwrap(), 0, text.into());
        let deposit = text.find("2 months").unwrap();
        let notice = text.find("30 days").unwrap();
        doc.changes.push(RedlineChange {
            clause_id: ClauseId::new("deposit").unwrap(),
            span: TextSpan::new(deposit, deposit + "2 months".len()).unwrap(),
            deleted_text: "2 months".into(),
            inserted_text: "1.5 months".into(),
        });
        doc.changes.push(RedlineChange {
            clause_id: ClauseId::new("notice").unwrap(),
            span: TextSpan::new(notice, notice + "30 days".len()).unwrap(),
            deleted_text: "30 days".into(),
            inserted_text: "60 days".into(),
        });
        doc
    }

    #[test]
    fn amended_text_applies_all_changes() {
        assert_eq!(
            redline().amended_text(),
            "Deposit: 1.5 months. Notice: 60 days."
        );
    }

    #[test]
    fn markup_shows_deletions_and_insertions() {
        assert_eq!(
            redline().markup(),
            "Deposit: [-2 months-]{+1.5 months+}. Notice: [-30 days-]{+60 days+}."
        );
    }

    #[test]
    fn no_changes_renders_original() {
        let doc = RedlinedDocument::new(DocumentId::new("d").unwrap(), 7, "plain".into());
        assert_eq!(doc.amended_text(), "plain");
        assert_eq!(doc.markup(), "plain");
    }

    #[test]
    fn document_span_adds_base_offset() {
        let mut doc = redline();
        doc.base_offset = 100;
        let span = doc.document_span(&doc.changes[0]);
        assert_eq!(span.start(), 100 + doc.changes[0].span.start());
    }
}
