//! The run's output record and its on-disk form.

use std::path::Path;

use chrono::{DateTime, Utc};
use docsift_core::{DocsiftError, DocsiftResult};
use docsift_retrieval::RankedSection;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::fs;
use tracing::info;

use crate::input::InputDescriptor;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub metadata: Metadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    /// UTC, `YYYY-MM-DDTHH:MM:SS`.
    pub processing_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

impl OutputRecord {
    /// Build the record; both section lists are index-aligned with
    /// `sections`.
    pub fn new(input: &InputDescriptor, sections: &[RankedSection], at: DateTime<Utc>) -> Self {
        let extracted_sections = sections
            .iter()
            .map(|s| ExtractedSection {
                document: s.best.chunk.document.clone(),
                section_title: s.best.chunk.parent_section_title.clone(),
                importance_rank: s.importance_rank,
                page_number: s.best.chunk.page_num,
            })
            .collect();
        let subsection_analysis = sections
            .iter()
            .map(|s| SubsectionAnalysis {
                document: s.best.chunk.document.clone(),
                refined_text: s.best.chunk.content.clone(),
                page_number: s.best.chunk.page_num,
            })
            .collect();

        Self {
            metadata: Metadata {
                input_documents: input.filenames(),
                persona: input.persona().to_string(),
                job_to_be_done: input.task().to_string(),
                processing_timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            },
            extracted_sections,
            subsection_analysis,
        }
    }
}

/// Serialise with 4-space indentation.
pub fn to_pretty_json(record: &OutputRecord) -> DocsiftResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    record
        .serialize(&mut ser)
        .map_err(|e| DocsiftError::Other(e.into()))?;
    Ok(buf)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> DocsiftError {
    let path = path.display().to_string();
    move |source| DocsiftError::Io { path, source }
}

/// Write the record atomically: temp file in the output dir, then rename.
pub async fn write_output(path: &Path, record: &OutputRecord) -> DocsiftResult<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await.map_err(io_err(dir))?;
    }

    let json = to_pretty_json(record)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json).await.map_err(io_err(&tmp_path))?;
    fs::rename(&tmp_path, path).await.map_err(io_err(path))?;

    info!(
        path = %path.display(),
        sections = record.extracted_sections.len(),
        "Wrote output"
    );
    Ok(())
}
