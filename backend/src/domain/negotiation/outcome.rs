//! Values produced by the model collaborators for a turn.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};

/// The counterparty's verdict on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Accepted,
    Countered,
    Rejected,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeKind::Accepted => "Accepted",
            OutcomeKind::Countered => "Countered",
            OutcomeKind::Rejected => "Rejected",
        };
        write!(f, "{}", s)
    }
}

/// Counterparty response to a proposal.
///
/// # Invariants
///
/// - `Countered` always carries counter-terms
/// - counter-terms, when present, are non-blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalOutcome {
    kind: OutcomeKind,
    rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    counter_terms: Option<String>,
}

impl ProposalOutcome {
    pub fn new(
        kind: OutcomeKind,
        rationale: impl Into<String>,
        counter_terms: Option<String>,
    ) -> Result<Self, ValidationError> {
        let counter_terms = counter_terms
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if kind == OutcomeKind::Countered && counter_terms.is_none() {
            return Err(ValidationError::empty_field("counter_terms"));
        }

        Ok(Self {
            kind,
            rationale: rationale.into(),
            counter_terms,
        })
    }

    pub fn accepted(rationale: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Accepted,
            rationale: rationale.into(),
            counter_terms: None,
        }
    }

    pub fn countered(
        rationale: impl Into<String>,
        counter_terms: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            OutcomeKind::Countered,
            rationale,
            Some(counter_terms.into()),
        )
    }

    pub fn rejected(rationale: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Rejected,
            rationale: rationale.into(),
            counter_terms: None,
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn counter_terms(&self) -> Option<&str> {
        self.counter_terms.as_deref()
    }
}

/// Advice from the strategist, attached to a turn after it commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyTip {
    text: String,
    produced_at: Timestamp,
}

impl StrategyTip {
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("tip"));
        }
        Ok(Self {
            text,
            produced_at: Timestamp::now(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn produced_at(&self) -> Timestamp {
        self.produced_at
    }
}

/// A ranked fact returned by grounding retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingSnippet {
    pub source: String,
    pub text: String,
    pub score: f32,
}

impl GroundingSnippet {
    pub fn new(source: impl Into<String>, text: impl Into<String>, score: f32) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countered_requires_counter_terms() {
        assert!(ProposalOutcome::new(OutcomeKind::Countered, "r", None).is_err());
        assert!(ProposalOutcome::new(OutcomeKind::Countered, "r", Some("  ".into())).is_err());
    }

    #[test]
    fn counter_terms_are_trimmed() {
        let outcome = ProposalOutcome::countered("r", "  1.5 months ").unwrap();
        assert_eq!(outcome.counter_terms(), Some("1.5 months"));
    }

    #[test]
    fn blank_counter_terms_on_rejection_become_none() {
        let outcome = ProposalOutcome::new(OutcomeKind::Rejected, "no", Some("".into())).unwrap();
        assert_eq!(outcome.counter_terms(), None);
    }

    #[test]
    fn outcome_serializes_snake_case_kind() {
        let json = serde_json::to_value(ProposalOutcome::accepted("fine")).unwrap();
        assert_eq!(json["kind"], "accepted");
        assert!(json.get("counter_terms").is_none());
    }

    #[test]
    fn tip_rejects_blank_text() {
        assert!(StrategyTip::new(" ").is_err());
        assert_eq!(StrategyTip::new("Anchor on market rate").unwrap().text(), "Anchor on market rate");
    }
}
