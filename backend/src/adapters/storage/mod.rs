//! Storage Adapters
//!
//! In-memory implementations of the clause store and session repository,
//! plus the loader that fills the clause store at startup.
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{ClauseBundle, InMemoryClauseStore, InMemorySessionRepository};
//!
//! let bundle = ClauseBundle::load("./data/bundle.yaml").await?;
//! let clauses = InMemoryClauseStore::from_bundle(&bundle).await?;
//! let sessions = InMemorySessionRepository::new();
//! ```

mod bundle;
mod in_memory_clause_store;
mod in_memory_session_repository;

pub use bundle::{BundleError, ClauseBundle};
pub use in_memory_clause_store::InMemoryClauseStore;
pub use in_memory_session_repository::InMemorySessionRepository;
