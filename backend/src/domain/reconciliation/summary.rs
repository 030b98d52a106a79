//! Structured negotiation summary.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClauseId, SessionId};
use crate::domain::negotiation::{ClauseNegotiationState, Disposition};

/// One row per clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub clause_id: ClauseId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    pub original_term: String,
    pub negotiated_term: String,
    pub disposition: Disposition,
    /// Session the row was reconciled from, absent for never-negotiated clauses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_state: Option<ClauseNegotiationState>,
    pub turns: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationSummary {
    pub rows: Vec<SummaryRow>,
}

impl NegotiationSummary {
    pub fn row(&self, clause_id: &ClauseId) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| &r.clause_id == clause_id)
    }

    /// Rows whose term actually changed.
    pub fn adopted(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows
            .iter()
            .filter(|r| r.disposition == Disposition::Adopted)
    }
}
