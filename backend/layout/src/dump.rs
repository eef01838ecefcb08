//! Reader for JSON layout dumps written by an external layout engine.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docsift_core::{BlockSupplier, Line, RawBlock, Span};
use serde::Deserialize;

/// Span flag bit marking a bold face.
const FLAG_BOLD: u32 = 16;

#[derive(Debug, Deserialize)]
struct DumpFile {
    pages: Vec<DumpPage>,
}

#[derive(Debug, Deserialize)]
struct DumpPage {
    #[serde(default)]
    blocks: Vec<DumpBlock>,
}

#[derive(Debug, Deserialize)]
struct DumpBlock {
    bbox: [f32; 4],
    /// Image blocks have no lines.
    #[serde(default)]
    lines: Vec<DumpLine>,
}

#[derive(Debug, Deserialize)]
struct DumpLine {
    #[serde(default)]
    spans: Vec<DumpSpan>,
}

#[derive(Debug, Deserialize)]
struct DumpSpan {
    text: String,
    size: f32,
    #[serde(default)]
    font: String,
    #[serde(default)]
    flags: u32,
}

impl From<DumpSpan> for Span {
    fn from(span: DumpSpan) -> Self {
        let bold = span.flags & FLAG_BOLD != 0 || span.font.to_lowercase().contains("bold");
        Span {
            text: span.text,
            size: span.size,
            font: span.font,
            bold,
        }
    }
}

impl From<DumpBlock> for RawBlock {
    fn from(block: DumpBlock) -> Self {
        RawBlock {
            x0: block.bbox[0],
            y0: block.bbox[1],
            lines: block
                .lines
                .into_iter()
                .map(|l| Line::new(l.spans.into_iter().map(Span::from).collect()))
                .collect(),
        }
    }
}

/// Parse dump JSON into pages of raw blocks, preserving block order.
pub fn parse_dump(json: &str) -> Result<Vec<Vec<RawBlock>>> {
    let dump: DumpFile = serde_json::from_str(json).context("Invalid layout dump")?;
    Ok(dump
        .pages
        .into_iter()
        .map(|p| p.blocks.into_iter().map(RawBlock::from).collect())
        .collect())
}

/// Supplies blocks from one dump file, whatever document path it is asked
/// about.
#[derive(Debug, Clone)]
pub struct LayoutDumpReader {
    dump_path: PathBuf,
}

impl LayoutDumpReader {
    pub fn at(dump_path: impl Into<PathBuf>) -> Self {
        Self {
            dump_path: dump_path.into(),
        }
    }

    pub fn dump_path(&self) -> &Path {
        &self.dump_path
    }
}

impl BlockSupplier for LayoutDumpReader {
    fn name(&self) -> &str {
        "layout-dump"
    }

    fn pages(&self, _path: &Path) -> Result<Vec<Vec<RawBlock>>> {
        let json = fs::read_to_string(&self.dump_path)
            .with_context(|| format!("Failed to read layout dump {}", self.dump_path.display()))?;
        parse_dump(&json)
    }
}
