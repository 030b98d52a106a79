//! Document Reconciler - pure functions from terminal sessions to artifacts.
//!
//! Clauses reconcile independently. A document result is the union of
//! per-clause results sorted by position, so input order never matters.

use super::{NegotiationSummary, OutputArtifact, RedlineChange, RedlinedDocument, SummaryRow};
use crate::domain::clause::{Clause, SourceDocument, TextSpan};
use crate::domain::foundation::Timestamp;
use crate::domain::negotiation::{
    AgreedChange, ConflictReason, NegotiationError, NegotiationSession,
};

/// Per-clause reconciliation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseReconciliation {
    pub change: AgreedChange,
    pub row: SummaryRow,
    /// Term location in document coordinates.
    pub term_span: TextSpan,
    pub finalized_at: Option<Timestamp>,
}

impl ClauseReconciliation {
    fn redline_change(&self, base_offset: usize) -> Option<RedlineChange> {
        if !self.change.is_change() {
            return None;
        }
        Some(RedlineChange {
            clause_id: self.change.clause_id.clone(),
            span: TextSpan::new(
                self.term_span.start() - base_offset,
                self.term_span.end() - base_offset,
            )
            .ok()?,
            deleted_text: self.change.original_term.clone(),
            inserted_text: self.change.negotiated_term.clone(),
        })
    }
}

/// Reconciles one clause against its latest session, if any.
///
/// # Errors
///
/// - `Conflict` if the session is not terminal
/// - `Validation` if the session negotiates a different clause
pub fn reconcile_clause(
    clause: &Clause,
    session: Option<&NegotiationSession>,
) -> Result<ClauseReconciliation, NegotiationError> {
    let (change, session_id, final_state, turns, finalized_at) = match session {
        Some(session) => {
            if session.clause_id() != clause.id() {
                return Err(NegotiationError::validation(
                    "clause_id",
                    format!(
                        "session {} negotiates {}, not {}",
                        session.id(),
                        session.clause_id(),
                        clause.id()
                    ),
                ));
            }
            if !session.is_terminal() {
                return Err(NegotiationError::conflict(
                    ConflictReason::SessionNotTerminal {
                        session_id: *session.id(),
                        state: session.state(),
                    },
                ));
            }
            (
                session.agreed_change(clause),
                Some(*session.id()),
                Some(session.state()),
                session.history().len() as u32,
                session.finalized_at(),
            )
        }
        None => (AgreedChange::unchanged(clause), None, None, 0, None),
    };

    let row = SummaryRow {
        clause_id: change.clause_id.clone(),
        section_title: clause.section_title().map(String::from),
        original_term: change.original_term.clone(),
        negotiated_term: change.negotiated_term.clone(),
        disposition: change.disposition,
        session_id,
        final_state,
        turns,
    };

    Ok(ClauseReconciliation {
        change,
        row,
        term_span: clause.term_span_in_document(),
        finalized_at,
    })
}

/// Artifact for a single session, anchored on the clause text.
pub fn reconcile_session(
    session: &NegotiationSession,
    clause: &Clause,
) -> Result<OutputArtifact, NegotiationError> {
    let result = reconcile_clause(clause, Some(session))?;
    let base_offset = clause.span().start();

    let mut redline = RedlinedDocument::new(
        clause.document_id().clone(),
        base_offset,
        clause.text().to_string(),
    );
    redline.changes.extend(result.redline_change(base_offset));

    let summary = NegotiationSummary {
        rows: vec![result.row],
    };
    Ok(OutputArtifact::new(redline, summary, result.finalized_at)?)
}

/// Artifact for a whole document: the union of every clause's result.
///
/// # Errors
///
/// - `Conflict` if any supplied session is not terminal
/// - `Validation` if a clause belongs to another document or term spans overlap
pub fn reconcile_document(
    document: &SourceDocument,
    clauses: &[(Clause, Option<NegotiationSession>)],
) -> Result<OutputArtifact, NegotiationError> {
    let mut results = clauses
        .iter()
        .map(|(clause, session)| {
            document.verify_clause(clause)?;
            reconcile_clause(clause, session.as_ref())
        })
        .collect::<Result<Vec<_>, NegotiationError>>()?;

    results.sort_by(|a, b| {
        (a.term_span.start(), &a.change.clause_id).cmp(&(b.term_span.start(), &b.change.clause_id))
    });

    for pair in results.windows(2) {
        if pair[0].term_span.overlaps(&pair[1].term_span) {
            return Err(NegotiationError::validation(
                "span",
                format!(
                    "terms of {} and {} overlap",
                    pair[0].change.clause_id, pair[1].change.clause_id
                ),
            ));
        }
    }

    let mut redline =
        RedlinedDocument::new(document.id().clone(), 0, document.text().to_string());
    redline
        .changes
        .extend(results.iter().filter_map(|r| r.redline_change(0)));

    let finalized_at = results.iter().filter_map(|r| r.finalized_at).max();
    let summary = NegotiationSummary {
        rows: results.into_iter().map(|r| r.row).collect(),
    };

    Ok(OutputArtifact::new(redline, summary, finalized_at)?)
}
