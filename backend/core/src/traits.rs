use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::RawBlock;

/// Source of positioned text blocks for a document.
///
/// Contract: the outer vector holds one entry per page, page 1 first; each
/// page's blocks are ordered top-to-bottom (ascending `y0`), left-ordered
/// within a row.
pub trait BlockSupplier: Send + Sync {
    /// Supplier name for logs (e.g., "lopdf", "layout-dump").
    fn name(&self) -> &str;

    /// Read every page of the document at `path`.
    fn pages(&self, path: &Path) -> Result<Vec<Vec<RawBlock>>>;
}

/// Trait for LLM providers used by the query expander.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openrouter", "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
