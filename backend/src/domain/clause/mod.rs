//! Clause domain module.
//!
//! Read-only view of ingested documents: the clauses extracted from them,
//! their risk labels, and where each clause and its negotiable term sit
//! in the document text.

#[allow(clippy::module_inception)]
mod clause;
mod document;
mod span;

pub use clause::{Clause, RiskLabel};
pub use document::SourceDocument;
pub use span::{PageRange, TextSpan};
