//! Retrieval Adapters
//!
//! Local grounding search used by the LLM-backed model gateway.

mod chunk_index;

pub use chunk_index::{ChunkIndex, GroundingChunk};
