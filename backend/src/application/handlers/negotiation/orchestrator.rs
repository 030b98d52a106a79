//! ConversationOrchestrator - runs the collaborator calls for one turn.
//!
//! Per submission:
//! 1. grounding retrieval starts first, as a shared future
//! 2. the strategy tip task is spawned right away and waits for the full
//!    grounding result on its own
//! 3. the counterparty call waits a bounded time for grounding, then runs
//!    under the retry policy
//!
//! Only step 3 decides whether the turn can commit. The tip is handed back
//! as a [`PendingTip`] the caller either takes, forwards, or discards.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::timeout;

use super::{RetryPolicy, TipTracker};
use crate::config::NegotiationConfig;
use crate::domain::negotiation::{
    GroundingSnippet, NegotiationContext, NegotiationError, ProposalOutcome, StrategyTip,
};
use crate::ports::{GatewayRole, ModelGateway};

type GroundingFuture = Shared<BoxFuture<'static, Vec<GroundingSnippet>>>;

/// Timeouts and limits for the collaborator calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub counterparty_timeout: Duration,
    pub strategy_timeout: Duration,
    pub retrieval_timeout: Duration,
    /// How long the counterparty call waits for grounding.
    pub grounding_wait: Duration,
    pub max_grounding_snippets: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&NegotiationConfig::default())
    }
}

impl From<&NegotiationConfig> for OrchestratorSettings {
    fn from(config: &NegotiationConfig) -> Self {
        Self {
            counterparty_timeout: config.counterparty_timeout(),
            strategy_timeout: config.strategy_timeout(),
            retrieval_timeout: config.retrieval_timeout(),
            grounding_wait: config.grounding_wait(),
            max_grounding_snippets: config.max_grounding_snippets,
        }
    }
}

/// A strategy tip that may still be in flight.
#[derive(Debug)]
pub struct PendingTip {
    receiver: oneshot::Receiver<StrategyTip>,
    task: AbortHandle,
}

impl PendingTip {
    /// Takes the tip if it is already available.
    pub fn try_take(&mut self) -> Option<StrategyTip> {
        self.receiver.try_recv().ok()
    }

    /// Resolves with the tip, or an error if the tip call gave up.
    pub fn into_receiver(self) -> oneshot::Receiver<StrategyTip> {
        self.receiver
    }

    /// Cancels the tip task; its result is never attached.
    pub fn discard(self) {
        self.task.abort();
    }
}

/// Result of the collaborator calls for one proposal, ready to commit.
#[derive(Debug)]
pub struct TurnDraft {
    pub outcome: ProposalOutcome,
    /// Snippets the counterparty saw.
    pub grounding: Vec<GroundingSnippet>,
    pub tip: PendingTip,
}

pub struct ConversationOrchestrator {
    gateway: Arc<dyn ModelGateway>,
    retry: RetryPolicy,
    settings: OrchestratorSettings,
    tracker: TipTracker,
}

impl ConversationOrchestrator {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        retry: RetryPolicy,
        settings: OrchestratorSettings,
        tracker: TipTracker,
    ) -> Self {
        Self {
            gateway,
            retry,
            settings,
            tracker,
        }
    }

    pub fn tracker(&self) -> &TipTracker {
        &self.tracker
    }

    /// Runs the three collaborator calls for `context`.
    ///
    /// # Errors
    ///
    /// - `ModelUnavailable` if the counterparty call fails permanently or
    ///   exhausts its retries; the pending tip is cancelled
    pub async fn run_turn(&self, context: NegotiationContext) -> Result<TurnDraft, NegotiationError> {
        let grounding = self.start_grounding(&context);
        let tip = self.start_tip(context.clone(), grounding.clone());

        let snippets = match timeout(self.settings.grounding_wait, grounding).await {
            Ok(snippets) => snippets,
            Err(_) => {
                tracing::debug!(
                    session_id = %context.session_id,
                    turn = context.turn_number.value(),
                    "Grounding not ready, counterparty proceeds without it"
                );
                Vec::new()
            }
        };
        let grounded = context.with_grounding(snippets);

        let gateway = &self.gateway;
        let ctx = &grounded;
        let result = self
            .retry
            .run(
                GatewayRole::Counterparty,
                self.settings.counterparty_timeout,
                move || gateway.generate_counterparty_response(ctx),
            )
            .await;

        match result {
            Ok(outcome) => Ok(TurnDraft {
                outcome,
                grounding: grounded.grounding,
                tip,
            }),
            Err(exhausted) => {
                tip.discard();
                tracing::warn!(
                    session_id = %grounded.session_id,
                    turn = grounded.turn_number.value(),
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Counterparty call failed, turn not committed"
                );
                Err(NegotiationError::ModelUnavailable {
                    attempts: exhausted.attempts,
                    reason: exhausted.last_error.to_string(),
                })
            }
        }
    }

    fn start_grounding(&self, context: &NegotiationContext) -> GroundingFuture {
        let gateway = Arc::clone(&self.gateway);
        let retry = self.retry.clone();
        let per_attempt = self.settings.retrieval_timeout;
        let limit = self.settings.max_grounding_snippets;
        let query = context.retrieval_query();
        let session_id = context.session_id;

        async move {
            let result = retry
                .run(GatewayRole::Retriever, per_attempt, || {
                    gateway.retrieve_grounding_context(&query, limit)
                })
                .await;
            match result {
                Ok(mut snippets) => {
                    snippets.truncate(limit);
                    snippets
                }
                Err(exhausted) => {
                    tracing::warn!(
                        session_id = %session_id,
                        attempts = exhausted.attempts,
                        error = %exhausted.last_error,
                        "Grounding retrieval failed, continuing without it"
                    );
                    Vec::new()
                }
            }
        }
        .boxed()
        .shared()
    }

    fn start_tip(&self, context: NegotiationContext, grounding: GroundingFuture) -> PendingTip {
        let (sender, receiver) = oneshot::channel();
        let gateway = Arc::clone(&self.gateway);
        let retry = self.retry.clone();
        let per_attempt = self.settings.strategy_timeout;

        let task = self.tracker.spawn(async move {
            let ctx = context.with_grounding(grounding.await);
            let result = retry
                .run(GatewayRole::Strategist, per_attempt, || {
                    gateway.generate_strategy_tip(&ctx)
                })
                .await;

            match result {
                Ok(tip) => {
                    if sender.send(tip).is_err() {
                        tracing::debug!(
                            session_id = %ctx.session_id,
                            turn = ctx.turn_number.value(),
                            "Tip arrived for a turn that was not committed, discarded"
                        );
                    }
                }
                Err(exhausted) => tracing::warn!(
                    session_id = %ctx.session_id,
                    turn = ctx.turn_number.value(),
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Strategy tip failed, turn stands without it"
                ),
            }
        });

        PendingTip { receiver, task }
    }
}
