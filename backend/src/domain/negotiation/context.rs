//! Explicit per-turn context passed into every model call.
//!
//! The model never sees an implicit running conversation: each call gets the
//! clause, the full committed history and the new proposal.

use serde::Serialize;

use super::{GroundingSnippet, Turn};
use crate::domain::clause::{Clause, RiskLabel};
use crate::domain::foundation::{ClauseId, SessionId, TurnNumber};

/// Everything a collaborator needs to respond to one proposal.
#[derive(Debug, Clone, Serialize)]
pub struct NegotiationContext {
    pub session_id: SessionId,
    pub clause_id: ClauseId,
    pub clause_text: String,
    pub term: String,
    pub risk: RiskLabel,
    pub section_title: Option<String>,
    pub history: Vec<Turn>,
    pub turn_number: TurnNumber,
    pub proposal: String,
    pub grounding: Vec<GroundingSnippet>,
}

impl NegotiationContext {
    pub fn new(
        session_id: SessionId,
        clause: &Clause,
        history: Vec<Turn>,
        turn_number: TurnNumber,
        proposal: String,
    ) -> Self {
        Self {
            session_id,
            clause_id: clause.id().clone(),
            clause_text: clause.text().to_string(),
            term: clause.term().to_string(),
            risk: clause.risk(),
            section_title: clause.section_title().map(String::from),
            history,
            turn_number,
            proposal,
            grounding: Vec::new(),
        }
    }

    /// Copy of this context enriched with grounding snippets.
    pub fn with_grounding(&self, grounding: Vec<GroundingSnippet>) -> Self {
        Self {
            grounding,
            ..self.clone()
        }
    }

    /// Query text for grounding retrieval: the term under negotiation plus the proposal.
    pub fn retrieval_query(&self) -> String {
        match &self.section_title {
            Some(title) => format!("{} {} {}", title, self.term, self.proposal),
            None => format!("{} {}", self.term, self.proposal),
        }
    }

    /// Plain-text transcript of prior turns, oldest first.
    pub fn transcript(&self) -> String {
        self.history
            .iter()
            .map(|turn| {
                let outcome = turn.outcome();
                let mut line = format!(
                    "Turn {}: user proposed \"{}\"; counterparty {}: {}",
                    turn.number(),
                    turn.proposal(),
                    outcome.kind(),
                    outcome.rationale()
                );
                if let Some(terms) = outcome.counter_terms() {
                    line.push_str(&format!(" (counter-terms: {})", terms));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clause::TextSpan;
    use crate::domain::foundation::DocumentId;
    use crate::domain::negotiation::{NegotiationSession, ProposalOutcome};

    fn clause() -> Clause {
        let text = "Deposit equals 2 months rent.";
        Clause::new(
            ClauseId::new("deposit").unwrap(),
            DocumentId::new("lease").unwrap(),
            text,
            TextSpan::covering(text),
            RiskLabel::High,
            true,
        )
        .unwrap()
        .with_term("2 months")
        .unwrap()
        .with_section_title("Security Deposit")
    }

    #[test]
    fn retrieval_query_includes_section_term_and_proposal() {
        let ctx = NegotiationContext::new(
            SessionId::new(),
            &clause(),
            vec![],
            TurnNumber::FIRST,
            "one month".into(),
        );
        assert_eq!(ctx.retrieval_query(), "Security Deposit 2 months one month");
    }

    #[test]
    fn transcript_lists_prior_turns() {
        let mut session = NegotiationSession::open(&clause()).unwrap();
        session
            .record_turn(
                "one month".into(),
                ProposalOutcome::countered("market", "1.5 months").unwrap(),
                vec![],
            )
            .unwrap();

        let ctx = NegotiationContext::new(
            *session.id(),
            &clause(),
            session.history().to_vec(),
            session.next_turn_number(),
            "accept".into(),
        );
        let transcript = ctx.transcript();
        assert!(transcript.starts_with("Turn 1: user proposed \"one month\""));
        assert!(transcript.contains("counter-terms: 1.5 months"));
    }

    #[test]
    fn with_grounding_leaves_original_untouched() {
        let ctx = NegotiationContext::new(
            SessionId::new(),
            &clause(),
            vec![],
            TurnNumber::FIRST,
            "one month".into(),
        );
        let enriched = ctx.with_grounding(vec![GroundingSnippet::new("law", "cap", 1.0)]);
        assert!(ctx.grounding.is_empty());
        assert_eq!(enriched.grounding.len(), 1);
    }
}
