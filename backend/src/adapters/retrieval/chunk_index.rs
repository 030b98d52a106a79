//! Term-overlap index over reference chunks.
//!
//! Scores each chunk by the share of distinct query terms it contains.
//! Good enough to ground counterparty replies in the clause bundle's
//! reference material without an embedding service.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::negotiation::GroundingSnippet;

/// A piece of reference material available for grounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub source: String,
    pub text: String,
}

impl GroundingChunk {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: GroundingChunk,
    terms: HashSet<String>,
}

/// In-memory index; immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    entries: Vec<IndexedChunk>,
}

impl ChunkIndex {
    pub fn new(chunks: impl IntoIterator<Item = GroundingChunk>) -> Self {
        let entries = chunks
            .into_iter()
            .map(|chunk| IndexedChunk {
                terms: terms(&chunk.text),
                chunk,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns at most `limit` snippets, best first. Chunks sharing no term are skipped.
    pub fn search(&self, query: &str, limit: usize) -> Vec<GroundingSnippet> {
        let query_terms = terms(query);
        if query_terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                let hits = query_terms.intersection(&entry.terms).count();
                (hits > 0).then(|| (hits as f32 / query_terms.len() as f32, idx))
            })
            .collect();

        // ties keep bundle order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        scored
            .into_iter()
            .take(limit)
            .map(|(score, idx)| {
                let chunk = &self.entries[idx].chunk;
                GroundingSnippet::new(chunk.source.clone(), chunk.text.clone(), score)
            })
            .collect()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() > 2)
        .map(str::to_lowercase)
        .collect()
}
