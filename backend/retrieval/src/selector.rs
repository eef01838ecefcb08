//! Top-K section selection over score-sorted chunks.

use docsift_core::{ScoredChunk, SectionKey};
use indexmap::IndexMap;
use serde::Serialize;

/// A section's best chunk and its 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSection {
    pub importance_rank: usize,
    #[serde(flatten)]
    pub best: ScoredChunk,
}

/// Keep the first chunk seen for each `(document, section)` until `top_k`
/// sections are collected. `ranked` must be sorted by descending score, so
/// the first chunk of a section is its highest-scoring one.
pub fn select_sections(ranked: &[ScoredChunk], top_k: usize) -> Vec<RankedSection> {
    let mut picked: IndexMap<SectionKey, &ScoredChunk> = IndexMap::new();
    for scored in ranked {
        if picked.len() >= top_k {
            break;
        }
        picked.entry(scored.chunk.section_key()).or_insert(scored);
    }

    picked
        .into_values()
        .enumerate()
        .map(|(i, best)| RankedSection {
            importance_rank: i + 1,
            best: best.clone(),
        })
        .collect()
}
