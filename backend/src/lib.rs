//! Clause Negotiator - negotiation session orchestration engine
//!
//! Runs clause-by-clause contract negotiations against a model-backed
//! counterparty, keeps an append-only turn history per session, and
//! reconciles terminal sessions into a redlined document and summary.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
