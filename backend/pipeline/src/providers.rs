//! Build embedding and expansion providers from config.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use docsift_config::defaults::{DEFAULT_EXPANSION_MAX_TOKENS, DEFAULT_EXPANSION_TIMEOUT_SECS};
use docsift_config::schema::{EmbeddingConfig, ExpansionConfig};
use docsift_llm::{OllamaProvider, OpenRouterProvider, ProviderRegistry};
use docsift_logging::redact_sensitive_data;
use docsift_retrieval::{
    create_provider, EmbeddingProvider, EmbeddingProviderKind, HeuristicQueryExpander,
    LlmQueryExpander, QueryExpander,
};
use tracing::info;

/// Dimension used for mock embeddings when none is configured.
const DEFAULT_MOCK_DIMENSION: usize = 64;

/// Translate the `embedding` config section into a provider kind.
pub fn embedding_kind(cfg: &EmbeddingConfig) -> Result<EmbeddingProviderKind> {
    let provider = cfg.provider.as_deref().unwrap_or("local");
    let kind = match provider {
        "local" => EmbeddingProviderKind::Local {
            model: cfg.model.clone(),
            cache_dir: cfg.cache_dir.as_ref().map(PathBuf::from),
        },
        "ollama" => EmbeddingProviderKind::Ollama {
            model: cfg.model.clone(),
            base_url: cfg.base_url.clone(),
            dimension: cfg.dimension,
        },
        "openai" => EmbeddingProviderKind::OpenAI {
            api_key: cfg
                .api_key
                .clone()
                .context("embedding.apiKey is required for the openai provider")?,
            model: cfg.model.clone(),
            base_url: cfg.base_url.clone(),
        },
        "mock" => EmbeddingProviderKind::Mock {
            dimension: cfg.dimension.unwrap_or(DEFAULT_MOCK_DIMENSION),
        },
        other => bail!("Unknown embedding provider '{other}'"),
    };
    Ok(kind)
}

/// Build the embedding provider. Loading a local model is blocking work and
/// runs on the blocking pool.
pub async fn build_embedding_provider(cfg: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let kind = embedding_kind(cfg)?;
    info!(
        provider = cfg.provider.as_deref().unwrap_or("local"),
        model = ?cfg.model,
        base_url = ?cfg.base_url.as_deref().map(redact_sensitive_data),
        "Loading embedding provider"
    );
    let provider = tokio::task::spawn_blocking(move || create_provider(kind))
        .await
        .context("Embedding provider loader panicked")??;
    Ok(Arc::from(provider))
}

/// Chat providers that can serve query expansion with this config.
/// OpenRouter is only registered when an API key is present.
pub fn chat_providers(cfg: &ExpansionConfig) -> ProviderRegistry {
    let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_EXPANSION_TIMEOUT_SECS));
    let mut registry = ProviderRegistry::new();

    let mut ollama = OllamaProvider::new().with_timeout(timeout);
    if cfg.provider.as_deref() == Some("ollama") {
        if let Some(url) = &cfg.base_url {
            ollama = ollama.with_base_url(url);
        }
    }
    registry.register(Arc::new(ollama));

    if let Some(key) = cfg.api_key.as_deref().filter(|k| !k.is_empty()) {
        let mut openrouter = OpenRouterProvider::new(key).with_timeout(timeout);
        if cfg.provider.as_deref() == Some("openrouter") {
            if let Some(url) = &cfg.base_url {
                openrouter = openrouter.with_base_url(url);
            }
        }
        registry.register(Arc::new(openrouter));
    }
    registry
}

/// Build the query expander; `None` means the task is the only query.
pub fn build_expander(cfg: &ExpansionConfig) -> Result<Option<Arc<dyn QueryExpander>>> {
    let provider = cfg.provider.as_deref().unwrap_or("heuristic");
    match provider {
        "none" => Ok(None),
        "heuristic" => Ok(Some(Arc::new(HeuristicQueryExpander::default()))),
        "ollama" | "openrouter" => {
            let model = cfg
                .model
                .clone()
                .with_context(|| format!("expansion.model is required for the {provider} provider"))?;
            let registry = chat_providers(cfg);
            let Some(chat) = registry.get(provider) else {
                bail!(
                    "Expansion provider '{provider}' is not available (registered: {:?}); is expansion.apiKey set?",
                    registry.list()
                );
            };
            info!(provider, model = %model, "Using LLM query expansion");
            let expander = LlmQueryExpander::new(chat, model)
                .with_max_tokens(cfg.max_tokens.unwrap_or(DEFAULT_EXPANSION_MAX_TOKENS))
                .with_temperature(cfg.temperature.unwrap_or(0.0));
            Ok(Some(Arc::new(expander)))
        }
        other => bail!("Unknown expansion provider '{other}'"),
    }
}
