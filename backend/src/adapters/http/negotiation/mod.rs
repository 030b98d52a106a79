//! Negotiation HTTP adapter.
//!
//! Exposes session lifecycle, turn submission, history and finalization
//! under `/api/negotiations`.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::NegotiationAppState;
pub use routes::negotiation_routes;
