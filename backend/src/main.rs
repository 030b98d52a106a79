//! Clause Negotiator server binary.
//!
//! Loads configuration and the clause bundle, wires the in-memory stores and
//! model gateway into a `SessionManager`, and serves the REST API until
//! Ctrl-C. Pending strategy tips are drained before exit.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clause_negotiator::adapters::ai::{AnthropicConfig, AnthropicProvider};
use clause_negotiator::adapters::http::{api_router, NegotiationAppState};
use clause_negotiator::adapters::retrieval::ChunkIndex;
use clause_negotiator::adapters::{
    ClauseBundle, InMemoryClauseStore, InMemoryEventBus, InMemorySessionRepository,
    LlmModelGateway, ScriptedModelGateway,
};
use clause_negotiator::application::handlers::negotiation::{
    ConversationOrchestrator, OrchestratorSettings, RetryPolicy, SessionManager, TipTracker,
};
use clause_negotiator::config::{AiConfig, AiProvider, AppConfig, ServerConfig};
use clause_negotiator::ports::ModelGateway;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server)?;
    config.validate()?;

    let bundle = match &config.data.bundle_path {
        Some(path) => ClauseBundle::load(path).await?,
        None => {
            tracing::warn!("No clause bundle configured, starting with an empty store");
            ClauseBundle::default()
        }
    };
    let clauses = InMemoryClauseStore::from_bundle(&bundle).await?;
    tracing::info!(
        documents = bundle.documents.len(),
        clauses = clauses.clause_count().await,
        grounding_chunks = bundle.grounding.len(),
        "Clause store ready"
    );

    let gateway = build_gateway(&config.ai, ChunkIndex::new(bundle.grounding))?;

    let negotiation = &config.negotiation;
    let events = Arc::new(InMemoryEventBus::with_capacity(
        negotiation.event_channel_capacity,
    ));
    let orchestrator = ConversationOrchestrator::new(
        gateway,
        RetryPolicy::new(
            negotiation.max_retries,
            negotiation.backoff_base(),
            negotiation.backoff_max(),
        ),
        OrchestratorSettings::from(negotiation),
        TipTracker::new(),
    );
    let manager = Arc::new(
        SessionManager::new(
            Arc::new(clauses),
            Arc::new(InMemorySessionRepository::new()),
            events.clone(),
            orchestrator,
        )
        .with_max_proposal_chars(negotiation.max_proposal_chars),
    );

    let app = api_router(
        NegotiationAppState::new(Arc::clone(&manager), events),
        &config.server,
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Clause negotiator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Draining pending strategy tips");
    manager.drain_background().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if server.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).compact())
            .try_init()?;
    }
    Ok(())
}

fn build_gateway(ai: &AiConfig, index: ChunkIndex) -> Result<Arc<dyn ModelGateway>, Box<dyn Error>> {
    match ai.provider {
        AiProvider::Anthropic => {
            let api_key = ai.anthropic_api_key.clone().unwrap_or_default();
            let provider = AnthropicProvider::new(
                AnthropicConfig::new(api_key)
                    .with_model(ai.model.clone())
                    .with_base_url(ai.base_url.clone())
                    .with_timeout(ai.timeout())
                    .with_default_max_tokens(ai.max_tokens),
            )?;
            tracing::info!(model = %ai.model, "Using Anthropic model gateway");
            Ok(Arc::new(
                LlmModelGateway::new(Arc::new(provider), Arc::new(index))
                    .with_max_tokens(ai.max_tokens)
                    .with_temperature(ai.temperature),
            ))
        }
        AiProvider::Scripted => {
            tracing::warn!("Using scripted model gateway, responses are canned");
            Ok(Arc::new(ScriptedModelGateway::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
