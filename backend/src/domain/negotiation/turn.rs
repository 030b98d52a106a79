//! Turn entity - one proposal and the counterparty's response.

use serde::{Deserialize, Serialize};

use super::{GroundingSnippet, ProposalOutcome, StrategyTip};
use crate::domain::foundation::{Timestamp, TurnNumber};

/// A committed turn.
///
/// Everything but `tip` is fixed at commit. The tip is filled at most once,
/// possibly after the turn is already visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    number: TurnNumber,
    proposal: String,
    outcome: ProposalOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    grounding: Vec<GroundingSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tip: Option<StrategyTip>,
    committed_at: Timestamp,
}

impl Turn {
    pub(crate) fn commit(
        number: TurnNumber,
        proposal: String,
        outcome: ProposalOutcome,
        grounding: Vec<GroundingSnippet>,
    ) -> Self {
        Self {
            number,
            proposal,
            outcome,
            grounding,
            tip: None,
            committed_at: Timestamp::now(),
        }
    }

    pub fn number(&self) -> TurnNumber {
        self.number
    }

    pub fn proposal(&self) -> &str {
        &self.proposal
    }

    pub fn outcome(&self) -> &ProposalOutcome {
        &self.outcome
    }

    /// Snippets the counterparty prompt was grounded on.
    pub fn grounding(&self) -> &[GroundingSnippet] {
        &self.grounding
    }

    pub fn tip(&self) -> Option<&StrategyTip> {
        self.tip.as_ref()
    }

    pub fn committed_at(&self) -> Timestamp {
        self.committed_at
    }

    /// Fills the tip slot. Returns false if a tip was already attached.
    pub(crate) fn fill_tip(&mut self, tip: StrategyTip) -> bool {
        if self.tip.is_some() {
            return false;
        }
        self.tip = Some(tip);
        true
    }
}
