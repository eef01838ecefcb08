//! `docsift fetch-models`: load the configured embedding model once so its
//! weights are cached for offline runs.

use anyhow::{bail, Context, Result};
use docsift_pipeline::build_embedding_provider;
use tracing::info;

use crate::config::Settings;
use crate::terminal_output::{note_info, note_success};

const SAMPLE_TEXT: &str = "docsift model warm-up";

pub async fn run(settings: &Settings) -> Result<()> {
    settings.ensure_valid()?;
    let embedding = settings.config.embedding.clone().unwrap_or_default();
    let provider_name = embedding.provider.clone().unwrap_or_default();
    if provider_name != "local" {
        note_info(&format!(
            "Embedding provider '{provider_name}' has no local weights to fetch"
        ));
        return Ok(());
    }

    note_info(&format!(
        "Fetching {} (cache: {})",
        embedding.model.as_deref().unwrap_or("default model"),
        embedding.cache_dir.as_deref().unwrap_or("default")
    ));
    let provider = build_embedding_provider(&embedding).await?;
    let vector = provider
        .embed(SAMPLE_TEXT)
        .await
        .context("Model loaded but failed to embed a sample sentence")?;
    if vector.is_empty() {
        bail!("Model returned an empty embedding");
    }
    info!(dimension = vector.len(), "Embedding model ready");
    note_success(&format!("Model ready ({} dimensions)", vector.len()));
    Ok(())
}
