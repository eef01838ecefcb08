//! `docsift inspect`: show the structure recovered from one PDF.

use std::path::PathBuf;

use anyhow::{Context, Result};
use docsift_pipeline::{chunk_config_from, parse_file};
use serde_json::{json, Value};

use crate::config::Settings;

pub async fn run(settings: &Settings, pdf: PathBuf, show_chunks: bool) -> Result<()> {
    let config = chunk_config_from(&settings.config)?;
    let parsed = tokio::task::spawn_blocking(move || parse_file(&pdf, &config))
        .await
        .context("Parser task panicked")??;

    let mut value = serde_json::to_value(&parsed)?;
    if !show_chunks {
        summarize_chunks(&mut value);
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Replace the chunk list with its length.
fn summarize_chunks(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        let count = obj
            .remove("chunks")
            .and_then(|c| c.as_array().map(Vec::len))
            .unwrap_or(0);
        obj.insert("chunk_count".to_string(), json!(count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_collapse_to_a_count() {
        let mut value = json!({
            "document": "a.pdf",
            "title": "Guide",
            "chunks": [{"content": "x"}, {"content": "y"}]
        });
        summarize_chunks(&mut value);
        assert_eq!(value["chunk_count"], 2);
        assert!(value.get("chunks").is_none());
        assert_eq!(value["title"], "Guide");
    }
}
