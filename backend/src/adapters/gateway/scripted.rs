//! Scripted model gateway for tests and offline demos.
//!
//! Each capability has its own queue of canned results, consumed in order.
//! When a queue runs dry a neutral default is returned, so long-running
//! scenarios only need to script the turns they care about.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::negotiation::{
    GroundingSnippet, NegotiationContext, ProposalOutcome, StrategyTip,
};
use crate::ports::{GatewayError, GatewayRole, ModelGateway};

type Queue<T> = Arc<Mutex<VecDeque<Result<T, GatewayError>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Gateway driven entirely by pre-configured results.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModelGateway {
    outcomes: Queue<ProposalOutcome>,
    tips: Queue<StrategyTip>,
    grounding: Queue<Vec<GroundingSnippet>>,
    delays: HashMap<GatewayRole, Duration>,
    calls: Arc<Mutex<HashMap<GatewayRole, usize>>>,
    /// Contexts seen by the counterparty, in call order.
    contexts: Arc<Mutex<Vec<NegotiationContext>>>,
}

impl ScriptedModelGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(self, outcome: ProposalOutcome) -> Self {
        lock(&self.outcomes).push_back(Ok(outcome));
        self
    }

    pub fn with_counterparty_error(self, error: GatewayError) -> Self {
        lock(&self.outcomes).push_back(Err(error));
        self
    }

    /// Queues a tip. Blank text is skipped.
    pub fn with_tip(self, text: &str) -> Self {
        if let Ok(tip) = StrategyTip::new(text) {
            lock(&self.tips).push_back(Ok(tip));
        }
        self
    }

    pub fn with_tip_error(self, error: GatewayError) -> Self {
        lock(&self.tips).push_back(Err(error));
        self
    }

    pub fn with_grounding(self, snippets: Vec<GroundingSnippet>) -> Self {
        lock(&self.grounding).push_back(Ok(snippets));
        self
    }

    pub fn with_grounding_error(self, error: GatewayError) -> Self {
        lock(&self.grounding).push_back(Err(error));
        self
    }

    /// Simulated latency for every call to `role`.
    pub fn with_delay(mut self, role: GatewayRole, delay: Duration) -> Self {
        self.delays.insert(role, delay);
        self
    }

    pub fn call_count(&self, role: GatewayRole) -> usize {
        lock(&self.calls).get(&role).copied().unwrap_or(0)
    }

    pub fn counterparty_contexts(&self) -> Vec<NegotiationContext> {
        lock(&self.contexts).clone()
    }

    async fn enter(&self, role: GatewayRole) {
        *lock(&self.calls).entry(role).or_insert(0) += 1;
        if let Some(delay) = self.delays.get(&role) {
            sleep(*delay).await;
        }
    }
}

#[async_trait]
impl ModelGateway for ScriptedModelGateway {
    async fn generate_counterparty_response(
        &self,
        context: &NegotiationContext,
    ) -> Result<ProposalOutcome, GatewayError> {
        lock(&self.contexts).push(context.clone());
        self.enter(GatewayRole::Counterparty).await;

        let scripted = lock(&self.outcomes).pop_front();
        match scripted {
            Some(result) => result,
            None => ProposalOutcome::countered(
                "Counterparty wants to keep discussing",
                format!("{} (subject to review)", context.proposal),
            )
            .map_err(|e| GatewayError::malformed(e.to_string())),
        }
    }

    async fn generate_strategy_tip(
        &self,
        _context: &NegotiationContext,
    ) -> Result<StrategyTip, GatewayError> {
        self.enter(GatewayRole::Strategist).await;

        let scripted = lock(&self.tips).pop_front();
        match scripted {
            Some(result) => result,
            None => StrategyTip::new("Anchor on comparable market terms")
                .map_err(|e| GatewayError::malformed(e.to_string())),
        }
    }

    async fn retrieve_grounding_context(
        &self,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<GroundingSnippet>, GatewayError> {
        self.enter(GatewayRole::Retriever).await;

        let scripted = lock(&self.grounding).pop_front();
        scripted
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(|snippets| snippets.into_iter().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clause::{Clause, RiskLabel, TextSpan};
    use crate::domain::foundation::{ClauseId, DocumentId, SessionId, TurnNumber};
    use crate::domain::negotiation::OutcomeKind;

    fn context(proposal: &str) -> NegotiationContext {
        let text = "Deposit is 2 months.";
        let clause = Clause::new(
            ClauseId::new("deposit").unwrap(),
            DocumentId::new("lease").unwrap(),
            text,
            TextSpan::covering(text),
            RiskLabel::High,
            true,
        )
        .unwrap();
        NegotiationContext::new(
            SessionId::new(),
            &clause,
            vec![],
            TurnNumber::FIRST,
            proposal.to_string(),
        )
    }

    #[tokio::test]
    async fn scripted_outcomes_then_default_counter() {
        let gateway = ScriptedModelGateway::new()
            .with_outcome(ProposalOutcome::accepted("fine"))
            .with_counterparty_error(GatewayError::unavailable("down"));

        let ctx = context("1 month");
        assert_eq!(
            gateway.generate_counterparty_response(&ctx).await.unwrap().kind(),
            OutcomeKind::Accepted
        );
        assert!(gateway.generate_counterparty_response(&ctx).await.is_err());

        let fallback = gateway.generate_counterparty_response(&ctx).await.unwrap();
        assert_eq!(fallback.kind(), OutcomeKind::Countered);
        assert_eq!(fallback.counter_terms(), Some("1 month (subject to review)"));

        assert_eq!(gateway.call_count(GatewayRole::Counterparty), 3);
        assert_eq!(gateway.counterparty_contexts().len(), 3);
    }

    #[tokio::test]
    async fn grounding_honours_limit() {
        let gateway = ScriptedModelGateway::new().with_grounding(vec![
            GroundingSnippet::new("a", "one", 0.9),
            GroundingSnippet::new("b", "two", 0.5),
        ]);

        let snippets = gateway.retrieve_grounding_context("q", 1).await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert!(gateway.retrieve_grounding_context("q", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tips_fall_back_to_default() {
        let gateway = ScriptedModelGateway::new().with_tip("Ask for a cap");
        let ctx = context("1 month");

        assert_eq!(gateway.generate_strategy_tip(&ctx).await.unwrap().text(), "Ask for a cap");
        assert!(!gateway.generate_strategy_tip(&ctx).await.unwrap().text().is_empty());
        assert_eq!(gateway.call_count(GatewayRole::Strategist), 2);
        assert_eq!(gateway.call_count(GatewayRole::Retriever), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_applies_per_role() {
        let gateway = ScriptedModelGateway::new()
            .with_delay(GatewayRole::Strategist, Duration::from_secs(3));
        let ctx = context("1 month");

        let started = tokio::time::Instant::now();
        gateway.generate_counterparty_response(&ctx).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));

        gateway.generate_strategy_tip(&ctx).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
