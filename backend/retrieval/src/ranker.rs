//! Multi-query scoring: each chunk's score is its best inner product with
//! any query vector.

use std::cmp::Ordering;

use docsift_core::{Chunk, DocsiftError, DocsiftResult, ScoredChunk};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::similarity::{dot, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankConfig {
    /// Number of distinct sections kept by the selector.
    pub top_k: usize,
    /// L2-normalise vectors first, turning the inner product into cosine.
    pub normalize: bool,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            normalize: false,
        }
    }
}

/// Best inner product of `chunk` against any of `queries`.
pub fn max_query_score(chunk: &[f32], queries: &[Vec<f32>]) -> f32 {
    queries
        .iter()
        .map(|q| dot(chunk, q))
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Score and sort `chunks` by descending score.
///
/// The sort is stable, so equal scores keep discovery order. Non-finite
/// scores go last.
pub fn rank_chunks(
    chunks: Vec<Chunk>,
    chunk_vectors: &[Vec<f32>],
    query_vectors: &[Vec<f32>],
    config: &RankConfig,
) -> DocsiftResult<Vec<ScoredChunk>> {
    if chunk_vectors.len() != chunks.len() {
        return Err(DocsiftError::EmbeddingFailure(format!(
            "{} chunk vectors for {} chunks",
            chunk_vectors.len(),
            chunks.len()
        )));
    }
    let Some(dim) = query_vectors.first().map(Vec::len) else {
        return Err(DocsiftError::EmbeddingFailure("no query vectors".into()));
    };
    if let Some(v) = query_vectors
        .iter()
        .chain(chunk_vectors.iter())
        .find(|v| v.len() != dim)
    {
        return Err(DocsiftError::EmbeddingFailure(format!(
            "dimension mismatch: expected {}, got {}",
            dim,
            v.len()
        )));
    }

    let prepare = |vectors: &[Vec<f32>]| -> Vec<Vec<f32>> {
        vectors
            .iter()
            .map(|v| {
                let mut v = v.clone();
                if config.normalize {
                    normalize(&mut v);
                }
                v
            })
            .collect()
    };
    let queries = prepare(query_vectors);
    let vectors = prepare(chunk_vectors);

    let mut scored: Vec<ScoredChunk> = chunks
        .into_iter()
        .zip(vectors.iter())
        .map(|(chunk, v)| ScoredChunk {
            chunk,
            score: max_query_score(v, &queries),
        })
        .collect();

    scored.sort_by(|a, b| match (a.score.is_finite(), b.score.is_finite()) {
        (true, true) => b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    });

    debug!(
        chunks = scored.len(),
        queries = queries.len(),
        top = scored.first().map(|s| s.score),
        "Chunks ranked"
    );
    Ok(scored)
}
