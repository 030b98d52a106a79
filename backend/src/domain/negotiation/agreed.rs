//! AgreedChange - the terms a session's committed history implies.
//!
//! Derived on demand, never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ClauseNegotiationState, NegotiationSession};
use crate::domain::clause::Clause;
use crate::domain::foundation::ClauseId;

/// How the negotiated term relates to the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// An accepted negotiation replaced the term.
    Adopted,
    /// Proposals were exchanged but the session ended rejected or withdrawn.
    ProposedNotAdopted,
    /// Never negotiated.
    Unchanged,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Disposition::Adopted => "adopted",
            Disposition::ProposedNotAdopted => "proposed, not adopted",
            Disposition::Unchanged => "unchanged",
        };
        write!(f, "{}", s)
    }
}

/// Original and negotiated term for one clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreedChange {
    pub clause_id: ClauseId,
    pub original_term: String,
    pub negotiated_term: String,
    pub disposition: Disposition,
}

impl AgreedChange {
    /// Row for a clause nobody negotiated.
    pub fn unchanged(clause: &Clause) -> Self {
        Self {
            clause_id: clause.id().clone(),
            original_term: clause.term().to_string(),
            negotiated_term: clause.term().to_string(),
            disposition: Disposition::Unchanged,
        }
    }

    /// Derives the change purely from committed turns.
    ///
    /// For an `Accepted` session the negotiated term is the accepting turn's
    /// counter-terms when the counterparty restated them. Otherwise the
    /// accepting proposal itself is the term, unless it only accepts what was
    /// on the table (e.g. "accept"), in which case the latest earlier
    /// counter-terms apply, or the original term if none were offered.
    /// Every other state keeps the original term.
    pub fn derive(session: &NegotiationSession, clause: &Clause) -> Self {
        let original = clause.term().to_string();
        let turns = session.history();

        match (session.state(), turns.last()) {
            (ClauseNegotiationState::Accepted, Some(accepting)) => {
                let negotiated = match accepting.outcome().counter_terms() {
                    Some(restated) => restated,
                    None if is_bare_acceptance(accepting.proposal()) => turns
                        .iter()
                        .rev()
                        .skip(1)
                        .find_map(|t| t.outcome().counter_terms())
                        .unwrap_or(original.as_str()),
                    None => accepting.proposal(),
                }
                .to_string();

                Self {
                    clause_id: clause.id().clone(),
                    original_term: original,
                    negotiated_term: negotiated,
                    disposition: Disposition::Adopted,
                }
            }
            _ if !turns.is_empty() => Self {
                clause_id: clause.id().clone(),
                negotiated_term: original.clone(),
                original_term: original,
                disposition: Disposition::ProposedNotAdopted,
            },
            _ => Self::unchanged(clause),
        }
    }

    /// True if the negotiated term differs from the original.
    pub fn is_change(&self) -> bool {
        self.negotiated_term != self.original_term
    }
}

/// Proposals that accept the standing terms without naming new ones.
const ACCEPTANCE_PHRASES: &[&str] = &[
    "accept", "accepted", "i accept", "we accept", "agree", "agreed", "i agree", "we agree",
    "deal", "ok", "okay", "yes", "fine", "sounds good",
];

fn is_bare_acceptance(proposal: &str) -> bool {
    let normalized = proposal
        .trim()
        .trim_end_matches(|c: char| c == '.' || c == '!')
        .to_lowercase();
    ACCEPTANCE_PHRASES.contains(&normalized.as_str())
}
