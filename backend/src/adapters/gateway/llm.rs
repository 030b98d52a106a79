//! LLM-backed ModelGateway implementation

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::adapters::retrieval::ChunkIndex;
use crate::domain::negotiation::{
    GroundingSnippet, NegotiationContext, OutcomeKind, ProposalOutcome, StrategyTip,
};
use crate::ports::{
    AIProvider, CompletionRequest, GatewayError, MessageRole, ModelGateway, RequestMetadata,
};

const COUNTERPARTY_SYSTEM_PROMPT: &str = "You represent the other party to a contract. \
Judge each proposed change to the clause on its merits and the negotiation so far. \
Answer only with a single JSON object.";

const STRATEGIST_SYSTEM_PROMPT: &str = "You coach the party proposing changes to a contract clause. \
Give one short, concrete piece of advice for their next move. Plain text, no preamble.";

/// Gateway that asks an AI provider for counterparty and strategist output,
/// and answers grounding queries from a local chunk index.
pub struct LlmModelGateway {
    ai_provider: Arc<dyn AIProvider>,
    index: Arc<ChunkIndex>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmModelGateway {
    pub fn new(ai_provider: Arc<dyn AIProvider>, index: Arc<ChunkIndex>) -> Self {
        Self {
            ai_provider,
            index,
            max_tokens: 1024,
            temperature: 0.4,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn metadata(&self, context: &NegotiationContext, purpose: &str) -> RequestMetadata {
        RequestMetadata::new(
            context.session_id,
            purpose,
            format!("{}:{}:{}", context.session_id, context.turn_number, purpose),
        )
    }

    fn describe_clause(context: &NegotiationContext) -> String {
        format!(
            "Section: {}\nRisk: {}\nClause: {}\nTerm under negotiation: {}",
            context.section_title.as_deref().unwrap_or("(untitled)"),
            context.risk,
            context.clause_text,
            context.term
        )
    }

    fn describe_history(context: &NegotiationContext) -> String {
        if context.history.is_empty() {
            "(no prior turns)".to_string()
        } else {
            context.transcript()
        }
    }

    /// Create the prompt for the counterparty verdict
    fn create_counterparty_prompt(&self, context: &NegotiationContext) -> String {
        let grounding = if context.grounding.is_empty() {
            "(none)".to_string()
        } else {
            context
                .grounding
                .iter()
                .map(|s| format!("- [{}] {}", s.source, s.text))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"{}

Reference material:
{}

Negotiation so far:
{}

New proposal (turn {}): {}

Respond with JSON:
{{
  "outcome": "accepted" | "countered" | "rejected",
  "rationale": "one or two sentences",
  "counter_terms": "wording for the term; when countered, your replacement; when accepted, restate the exact terms being agreed"
}}

counter_terms is required for both countered and accepted."#,
            Self::describe_clause(context),
            grounding,
            Self::describe_history(context),
            context.turn_number,
            context.proposal
        )
    }

    /// Create the prompt for the strategy tip
    fn create_strategy_prompt(&self, context: &NegotiationContext) -> String {
        format!(
            "{}\n\nNegotiation so far:\n{}\n\nThe user is now proposing: {}\n\nWhat should they keep in mind?",
            Self::describe_clause(context),
            Self::describe_history(context),
            context.proposal
        )
    }

    /// Parse the counterparty verdict out of a completion.
    ///
    /// Models sometimes wrap JSON in prose or fences; the outermost braces are taken.
    fn parse_counterparty_response(content: &str) -> Result<ProposalOutcome, GatewayError> {
        let start = content
            .find('{')
            .ok_or_else(|| GatewayError::malformed("no JSON object in counterparty reply"))?;
        let end = content
            .rfind('}')
            .filter(|end| *end > start)
            .ok_or_else(|| GatewayError::malformed("unterminated JSON in counterparty reply"))?;

        let reply: CounterpartyReply = serde_json::from_str(&content[start..=end])
            .map_err(|e| GatewayError::malformed(format!("Failed to parse counterparty reply: {}", e)))?;

        let kind = match reply.outcome.trim().to_lowercase().as_str() {
            "accepted" | "accept" => OutcomeKind::Accepted,
            "countered" | "counter" => OutcomeKind::Countered,
            "rejected" | "reject" => OutcomeKind::Rejected,
            other => {
                return Err(GatewayError::malformed(format!(
                    "unknown outcome '{}'",
                    other
                )))
            }
        };

        ProposalOutcome::new(kind, reply.rationale, reply.counter_terms)
            .map_err(|e| GatewayError::malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct CounterpartyReply {
    outcome: String,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    counter_terms: Option<String>,
}

#[async_trait]
impl ModelGateway for LlmModelGateway {
    async fn generate_counterparty_response(
        &self,
        context: &NegotiationContext,
    ) -> Result<ProposalOutcome, GatewayError> {
        let request = CompletionRequest::new(self.metadata(context, "counterparty"))
            .with_system_prompt(COUNTERPARTY_SYSTEM_PROMPT)
            .with_message(MessageRole::User, self.create_counterparty_prompt(context))
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self.ai_provider.complete(request).await?;
        Self::parse_counterparty_response(&response.content)
    }

    async fn generate_strategy_tip(
        &self,
        context: &NegotiationContext,
    ) -> Result<StrategyTip, GatewayError> {
        let request = CompletionRequest::new(self.metadata(context, "strategist"))
            .with_system_prompt(STRATEGIST_SYSTEM_PROMPT)
            .with_message(MessageRole::User, self.create_strategy_prompt(context))
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self.ai_provider.complete(request).await?;
        StrategyTip::new(response.content.trim())
            .map_err(|e| GatewayError::malformed(e.to_string()))
    }

    async fn retrieve_grounding_context(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GroundingSnippet>, GatewayError> {
        Ok(self.index.search(query, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::retrieval::GroundingChunk;
    use crate::domain::clause::{Clause, RiskLabel, TextSpan};
    use crate::domain::foundation::{ClauseId, DocumentId, SessionId, TurnNumber};
    use crate::ports::AIError;

    fn context() -> NegotiationContext {
        let text = "Tenant pays a deposit of 2 months.";
        let clause = Clause::new(
            ClauseId::new("deposit").unwrap(),
            DocumentId::new("lease").unwrap(),
            text,
            TextSpan::covering(text),
            RiskLabel::High,
            true,
        )
        .unwrap()
        .with_term("2 months")
        .unwrap();
        NegotiationContext::new(
            SessionId::new(),
            &clause,
            vec![],
            TurnNumber::FIRST,
            "1 month".to_string(),
        )
        .with_grounding(vec![GroundingSnippet::new("statute", "Deposits are capped.", 1.0)])
    }

    fn gateway(provider: MockAIProvider) -> LlmModelGateway {
        LlmModelGateway::new(
            Arc::new(provider),
            Arc::new(ChunkIndex::new(vec![GroundingChunk::new(
                "statute",
                "A deposit may not exceed one month of rent.",
            )])),
        )
    }

    #[test]
    fn parses_fenced_json() {
        let content = "Sure:\n```json\n{\"outcome\":\"countered\",\"rationale\":\"too low\",\"counter_terms\":\"6 weeks\"}\n```";
        let outcome = LlmModelGateway::parse_counterparty_response(content).unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::Countered);
        assert_eq!(outcome.counter_terms(), Some("6 weeks"));
    }

    #[test]
    fn countered_without_terms_is_malformed() {
        let err = LlmModelGateway::parse_counterparty_response(
            r#"{"outcome":"countered","rationale":"no"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }

    #[test]
    fn unknown_outcome_and_prose_are_malformed() {
        assert!(LlmModelGateway::parse_counterparty_response(r#"{"outcome":"maybe"}"#).is_err());
        assert!(LlmModelGateway::parse_counterparty_response("I accept.").is_err());
    }

    #[tokio::test]
    async fn counterparty_prompt_carries_context() {
        let provider = MockAIProvider::new()
            .with_response(r#"{"outcome":"accepted","rationale":"fair"}"#);
        let gw = gateway(provider.clone());

        let outcome = gw.generate_counterparty_response(&context()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::Accepted);

        let call = &provider.get_calls()[0];
        assert_eq!(call.metadata.purpose, "counterparty");
        let prompt = &call.messages[0].content;
        assert!(prompt.contains("2 months"));
        assert!(prompt.contains("1 month"));
        assert!(prompt.contains("[statute] Deposits are capped."));
    }

    #[tokio::test]
    async fn accepted_reply_restates_agreed_terms() {
        let provider = MockAIProvider::new().with_response(
            r#"{"outcome":"accepted","rationale":"fair","counter_terms":"6 weeks"}"#,
        );
        let gw = gateway(provider.clone());

        let outcome = gw.generate_counterparty_response(&context()).await.unwrap();
        assert_eq!(outcome.kind(), OutcomeKind::Accepted);
        assert_eq!(outcome.counter_terms(), Some("6 weeks"));

        let prompt = &provider.get_calls()[0].messages[0].content;
        assert!(prompt.contains("when accepted, restate the exact terms being agreed"));
    }

    #[tokio::test]
    async fn restated_terms_become_the_negotiated_term() {
        use crate::domain::negotiation::NegotiationSession;

        let text = "Tenant pays a deposit of 2 months.";
        let clause = Clause::new(
            ClauseId::new("deposit").unwrap(),
            DocumentId::new("lease").unwrap(),
            text,
            TextSpan::covering(text),
            RiskLabel::High,
            true,
        )
        .unwrap()
        .with_term("2 months")
        .unwrap();
        let gw = gateway(
            MockAIProvider::new()
                .with_response(r#"{"outcome":"countered","rationale":"low","counter_terms":"1.5 months"}"#)
                .with_response(r#"{"outcome":"accepted","rationale":"ok","counter_terms":"6 weeks"}"#),
        );

        let mut session = NegotiationSession::open(&clause).unwrap();
        let countered = gw.generate_counterparty_response(&context()).await.unwrap();
        session.record_turn("1 month".into(), countered, vec![]).unwrap();
        let accepted = gw.generate_counterparty_response(&context()).await.unwrap();
        session.record_turn("how about 6 weeks?".into(), accepted, vec![]).unwrap();

        assert_eq!(session.agreed_change(&clause).negotiated_term, "6 weeks");
    }

    #[tokio::test]
    async fn provider_errors_keep_their_class() {
        let gw = gateway(MockAIProvider::new().with_error(AIError::unavailable("overloaded")));
        let err = gw.generate_counterparty_response(&context()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn tip_is_trimmed_plain_text() {
        let gw = gateway(MockAIProvider::new().with_response("  Cite the statutory cap.\n"));
        let tip = gw.generate_strategy_tip(&context()).await.unwrap();
        assert_eq!(tip.text(), "Cite the statutory cap.");
    }

    #[tokio::test]
    async fn grounding_comes_from_index() {
        let gw = gateway(MockAIProvider::new());
        let snippets = gw.retrieve_grounding_context("deposit rent", 3).await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].source, "statute");
    }
}
