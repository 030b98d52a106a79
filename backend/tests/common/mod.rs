//! Shared fixture for negotiation integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use clause_negotiator::adapters::{
    ClauseBundle, InMemoryClauseStore, InMemoryEventBus, InMemorySessionRepository,
    ScriptedModelGateway,
};
use clause_negotiator::application::handlers::negotiation::{
    ConversationOrchestrator, OrchestratorSettings, RetryPolicy, SessionManager, TipTracker,
};
use clause_negotiator::domain::foundation::{ClauseId, DocumentId};

pub const LEASE_BUNDLE: &str = r#"
documents:
  - id: lease
    title: Residential Lease
    text: "Tenant pays a security deposit of 2 months rent. Rent is due on the first of each month. Pets are not allowed."
    clauses:
      - id: deposit
        text: "Tenant pays a security deposit of 2 months rent."
        risk: high
        term: "2 months"
        section_title: "4. Security Deposit"
        pages: [2, 2]
      - id: rent-due
        text: "Rent is due on the first of each month."
        risk: standard
        term: "the first of each month"
      - id: pets
        text: "Pets are not allowed."
        risk: negotiable
grounding:
  - source: state-statute
    text: "A security deposit may not exceed one month of rent for residential leases."
  - source: market-survey
    text: "Most landlords accept a longer lease term in exchange for a lower deposit."
"#;

pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub gateway: ScriptedModelGateway,
    pub events: Arc<InMemoryEventBus>,
    pub sessions: Arc<InMemorySessionRepository>,
}

impl Harness {
    pub async fn new(gateway: ScriptedModelGateway) -> Self {
        let bundle = ClauseBundle::from_yaml_str(LEASE_BUNDLE).expect("fixture bundle parses");
        let clauses = InMemoryClauseStore::from_bundle(&bundle)
            .await
            .expect("fixture clauses align with their document");
        let events = Arc::new(InMemoryEventBus::new().with_retention());
        let sessions = Arc::new(InMemorySessionRepository::new());

        let orchestrator = ConversationOrchestrator::new(
            Arc::new(gateway.clone()),
            RetryPolicy::new(2, Duration::from_millis(5), Duration::from_millis(20)),
            OrchestratorSettings {
                counterparty_timeout: Duration::from_secs(2),
                strategy_timeout: Duration::from_secs(2),
                retrieval_timeout: Duration::from_secs(1),
                grounding_wait: Duration::from_millis(100),
                max_grounding_snippets: 3,
            },
            TipTracker::new(),
        );
        let manager = Arc::new(SessionManager::new(
            Arc::new(clauses),
            sessions.clone(),
            events.clone(),
            orchestrator,
        ));

        Self {
            manager,
            gateway,
            events,
            sessions,
        }
    }
}

pub fn clause(id: &str) -> ClauseId {
    ClauseId::new(id).expect("valid clause id")
}

pub fn lease() -> DocumentId {
    DocumentId::new("lease").expect("valid document id")
}
