//! The run's input descriptor (`challenge1b_input.json`).

use std::path::Path;

use docsift_core::{DocsiftError, DocsiftResult};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescriptor {
    /// Free-form run metadata; carried but not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_info: Option<serde_json::Value>,
    pub documents: Vec<DocumentRef>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

impl InputDescriptor {
    pub fn persona(&self) -> &str {
        &self.persona.role
    }

    pub fn task(&self) -> &str {
        &self.job_to_be_done.task
    }

    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }
}

/// Read and parse the descriptor. A missing file is `MissingInput`, an
/// unreadable one `Io`, and a malformed one a `Config` error.
pub async fn load_input(path: &Path) -> DocsiftResult<InputDescriptor> {
    let is_file = fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        return Err(DocsiftError::MissingInput(format!(
            "input descriptor not found at {}",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path).await.map_err(|source| DocsiftError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        DocsiftError::Config(format!("invalid input descriptor {}: {e}", path.display()))
    })
}
