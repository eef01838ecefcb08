//! Embedding providers.
//!
//! Supports: OpenAI-compatible HTTP, Ollama, in-process fastembed (feature
//! `local-embeddings`) and a deterministic mock. All providers implement
//! the `EmbeddingProvider` trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;
    /// Embedding dimension, or 0 when only known after the first call.
    fn dimension(&self) -> usize;
    /// Embed a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    /// Embed a batch of texts (default: sequential).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

async fn embed_one(provider: &(impl EmbeddingProvider + ?Sized), text: &str) -> Result<Vec<f32>> {
    provider
        .embed_batch(&[text])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty {} embedding response", provider.name()))
}

// ---------------------------------------------------------------------------
// OpenAI-compatible
// ---------------------------------------------------------------------------

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

pub struct OpenAIEmbeddings {
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
    client: Client,
}

impl OpenAIEmbeddings {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "text-embedding-3-small".to_string());
        let dimension = if model.contains("3-large") { 3072 } else { 1536 };
        Self {
            api_key,
            model,
            base_url: DEFAULT_OPENAI_URL.to_string(),
            dimension,
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct OpenAIEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct OpenAIEmbedResponse {
    data: Vec<OpenAIEmbedData>,
}

#[derive(Deserialize)]
struct OpenAIEmbedData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl OpenAIEmbedResponse {
    /// Vectors in input order; entries carry their input index.
    fn into_vectors(mut self) -> Vec<Vec<f32>> {
        self.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        self.data.into_iter().map(|d| d.embedding).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn name(&self) -> &str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_one(self, text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        debug!(model = %self.model, count = texts.len(), "OpenAI embedding request");
        let body = OpenAIEmbedRequest {
            model: &self.model,
            input: texts,
        };
        let res: OpenAIEmbedResponse = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI embedding request failed")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse OpenAI embedding response")?;
        Ok(res.into_vectors())
    }
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub struct OllamaEmbeddings {
    model: String,
    base_url: String,
    dimension: usize,
    client: Client,
}

impl OllamaEmbeddings {
    pub fn new(model: Option<String>, dimension: Option<usize>) -> Self {
        Self {
            model: model.unwrap_or_else(|| "all-minilm".to_string()),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            dimension: dimension.unwrap_or(0),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddings {
    fn name(&self) -> &str {
        "ollama"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_one(self, text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        debug!(model = %self.model, count = texts.len(), "Ollama embedding request");
        let body = OllamaEmbedRequest {
            model: &self.model,
            input: texts,
        };
        let res: OllamaEmbedResponse = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama embedding request failed")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse Ollama embedding response")?;
        Ok(res.embeddings)
    }
}

// ---------------------------------------------------------------------------
// Local fastembed
// ---------------------------------------------------------------------------

#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbeddings;

#[cfg(feature = "local-embeddings")]
mod local {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    use super::{embed_one, EmbeddingProvider};

    /// In-process sentence embeddings. Model inference is CPU-bound and runs
    /// on the blocking pool.
    pub struct LocalEmbeddings {
        model: Arc<TextEmbedding>,
        dimension: usize,
    }

    fn model_for(name: Option<&str>) -> Result<(EmbeddingModel, usize)> {
        match name.map(str::to_lowercase).as_deref() {
            None | Some("all-minilm-l6-v2") | Some("sentence-transformers/all-minilm-l6-v2") => {
                Ok((EmbeddingModel::AllMiniLML6V2, 384))
            }
            Some("bge-small-en-v1.5") | Some("baai/bge-small-en-v1.5") => {
                Ok((EmbeddingModel::BGESmallENV15, 384))
            }
            Some("bge-base-en-v1.5") | Some("baai/bge-base-en-v1.5") => {
                Ok((EmbeddingModel::BGEBaseENV15, 768))
            }
            Some(other) => anyhow::bail!("Unsupported local embedding model '{}'", other),
        }
    }

    impl LocalEmbeddings {
        /// Load the model. Blocking: may download weights on first use.
        pub fn load(model: Option<&str>, cache_dir: Option<std::path::PathBuf>) -> Result<Self> {
            let (model_name, dimension) = model_for(model)?;
            let mut options = InitOptions::default();
            options.model_name = model_name;
            options.show_download_progress = false;
            if let Some(dir) = cache_dir {
                options.cache_dir = dir;
            }
            let model = TextEmbedding::try_new(options).context("Failed to load local embedding model")?;
            Ok(Self {
                model: Arc::new(model),
                dimension,
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for LocalEmbeddings {
        fn name(&self) -> &str {
            "local"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            embed_one(self, text).await
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            let model = Arc::clone(&self.model);
            let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
            tokio::task::spawn_blocking(move || model.embed(owned, None))
                .await
                .context("Embedding task panicked")?
        }
    }
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

/// Deterministic embeddings for tests and offline runs.
///
/// With keyword axes, component `i` counts occurrences of axis `i` in the
/// lowercased text. Without axes, words are hashed into `dimension` buckets.
pub struct MockEmbeddings {
    axes: Vec<String>,
    dimension: usize,
    fail_with: Option<String>,
}

impl MockEmbeddings {
    pub fn with_axes<I, S>(axes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let axes: Vec<String> = axes.into_iter().map(|a| a.into().to_lowercase()).collect();
        let dimension = axes.len();
        Self {
            axes,
            dimension,
            fail_with: None,
        }
    }

    pub fn hashed(dimension: usize) -> Self {
        Self {
            axes: Vec::new(),
            dimension: dimension.max(1),
            fail_with: None,
        }
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        let lower = text.to_lowercase();
        let words = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty());
        if self.axes.is_empty() {
            for word in words {
                v[fnv1a(word) as usize % self.dimension] += 1.0;
            }
        } else {
            for word in words {
                for (i, axis) in self.axes.iter().enumerate() {
                    if word == axis {
                        v[i] += 1.0;
                    }
                }
            }
        }
        v
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325u64, |h, b| {
        (h ^ b as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddings {
    fn name(&self) -> &str {
        "mock"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{}", message);
        }
        Ok(self.vector(text))
    }
}

// ---------------------------------------------------------------------------
// Factory from config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum EmbeddingProviderKind {
    OpenAI {
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
    },
    Ollama {
        model: Option<String>,
        base_url: Option<String>,
        dimension: Option<usize>,
    },
    Local {
        model: Option<String>,
        cache_dir: Option<std::path::PathBuf>,
    },
    Mock {
        dimension: usize,
    },
}

/// Build a provider. Blocking for `Local`, which loads model weights.
pub fn create_provider(kind: EmbeddingProviderKind) -> Result<Box<dyn EmbeddingProvider>> {
    let provider: Box<dyn EmbeddingProvider> = match kind {
        EmbeddingProviderKind::OpenAI {
            api_key,
            model,
            base_url,
        } => {
            let mut p = OpenAIEmbeddings::new(api_key, model);
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Box::new(p)
        }
        EmbeddingProviderKind::Ollama {
            model,
            base_url,
            dimension,
        } => {
            let mut p = OllamaEmbeddings::new(model, dimension);
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Box::new(p)
        }
        #[cfg(feature = "local-embeddings")]
        EmbeddingProviderKind::Local { model, cache_dir } => {
            Box::new(LocalEmbeddings::load(model.as_deref(), cache_dir)?)
        }
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProviderKind::Local { .. } => {
            anyhow::bail!("Local embeddings require the `local-embeddings` feature")
        }
        EmbeddingProviderKind::Mock { dimension } => Box::new(MockEmbeddings::hashed(dimension)),
    };
    info!(
        provider = provider.name(),
        dimension = provider.dimension(),
        "Embedding provider ready"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn axis_mock_counts_keywords() {
        let mock = MockEmbeddings::with_axes(["risk", "market"]);
        let v = mock.embed("Market risk, credit RISK.").await.unwrap();
        assert_eq!(v, vec![2.0, 1.0]);
        assert_eq!(mock.dimension(), 2);
    }

    #[tokio::test]
    async fn hashed_mock_is_deterministic() {
        let mock = MockEmbeddings::hashed(64);
        let batch = mock.embed_batch(&["credit risk", "credit risk"]).await.unwrap();
        assert_eq!(batch[0], batch[1]);
        assert_eq!(batch[0].len(), 64);
        assert_eq!(batch[0].iter().sum::<f32>(), 2.0);
    }

    #[tokio::test]
    async fn failing_mock_errors() {
        let mock = MockEmbeddings::hashed(8).failing("model offline");
        assert!(mock.embed_batch(&["x"]).await.is_err());
    }

    #[test]
    fn openai_response_is_reordered_by_index() {
        let body = r#"{"data":[{"index":1,"embedding":[2.0]},{"index":0,"embedding":[1.0]}]}"#;
        let parsed: OpenAIEmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_vectors(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn openai_dimension_follows_model() {
        assert_eq!(OpenAIEmbeddings::new("k".into(), None).dimension(), 1536);
        let large = OpenAIEmbeddings::new("k".into(), Some("text-embedding-3-large".into()));
        assert_eq!(large.dimension(), 3072);
    }

    #[test]
    fn factory_builds_mock_and_http_providers() {
        let mock = create_provider(EmbeddingProviderKind::Mock { dimension: 16 }).unwrap();
        assert_eq!((mock.name(), mock.dimension()), ("mock", 16));

        let ollama = create_provider(EmbeddingProviderKind::Ollama {
            model: None,
            base_url: Some("http://gpu-box:11434/".into()),
            dimension: Some(384),
        })
        .unwrap();
        assert_eq!((ollama.name(), ollama.dimension()), ("ollama", 384));
    }

    #[cfg(not(feature = "local-embeddings"))]
    #[test]
    fn local_provider_needs_feature() {
        let err = create_provider(EmbeddingProviderKind::Local {
            model: None,
            cache_dir: None,
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("local-embeddings"));
    }
}
