//! Batched embedding of chunk and query texts.

use std::sync::Arc;

use docsift_core::{DocsiftError, DocsiftResult};
use tracing::info;

use crate::embeddings::EmbeddingProvider;

pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    /// Max texts per provider request; 0 sends everything in one request.
    pub batch_size: usize,
}

impl BatchEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            batch_size: 0,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Embed `texts` in order. Any provider error, missing vector or
    /// inconsistent dimension fails the whole call.
    pub async fn embed_all(&self, texts: &[&str]) -> DocsiftResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch_size = if self.batch_size == 0 {
            texts.len()
        } else {
            self.batch_size
        };

        let mut expected_dim = self.provider.dimension();
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            info!(
                provider = self.provider.name(),
                count = batch.len(),
                "Embedding batch"
            );
            let vectors = self
                .provider
                .embed_batch(batch)
                .await
                .map_err(|e| DocsiftError::EmbeddingFailure(format!("{e:#}")))?;

            if vectors.len() != batch.len() {
                return Err(DocsiftError::EmbeddingFailure(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for v in &vectors {
                if expected_dim == 0 {
                    expected_dim = v.len();
                }
                if v.is_empty() || v.len() != expected_dim {
                    return Err(DocsiftError::EmbeddingFailure(format!(
                        "expected dimension {}, got {}",
                        expected_dim,
                        v.len()
                    )));
                }
            }
            results.extend(vectors);
        }
        Ok(results)
    }
}
