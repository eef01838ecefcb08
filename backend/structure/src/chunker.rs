//! Section attribution and sliding-window chunking, one page at a time.
//!
//! The active section label is threaded through the pages explicitly: each
//! call to [`chunk_page`] takes the label left over from the previous page
//! and returns the label the next page starts with.

use docsift_core::{Block, BlockRole, Chunk, Header};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::blocks::classify;

/// Window sizing for section text, in whitespace-separated words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    /// Windows must have strictly more words than this to be kept.
    pub min_words: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 150,
            overlap: 30,
            min_words: 20,
        }
    }
}

impl ChunkConfig {
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunkSize must be > 0".into());
        }
        if self.overlap >= self.chunk_size {
            return Err(format!(
                "overlap ({}) must be smaller than chunkSize ({})",
                self.overlap, self.chunk_size
            ));
        }
        Ok(())
    }
}

/// Slide a `chunk_size` window with stride `chunk_size - overlap` over
/// `tokens`, re-joining each window with single spaces.
///
/// The first window always starts at 0. A later window is produced only if
/// it reaches past the end of the previous one, which gives
/// `ceil(max(len - overlap, 1) / stride)` windows for non-empty input.
pub fn sliding_windows(tokens: &[&str], config: &ChunkConfig) -> Vec<String> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let stride = config.stride();
    let len = tokens.len();

    let mut windows = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + config.chunk_size).min(len);
        windows.push(tokens[start..end].join(" "));
        start += stride;
        if start + config.overlap >= len {
            break;
        }
    }
    windows
}

/// Result of chunking one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub chunks: Vec<Chunk>,
    /// Section label the next page starts under.
    pub carry_label: String,
}

/// Attribute a page's body blocks to sections and chunk the result.
///
/// `blocks` must be in top-to-bottom order and `headers_on_page` sorted by
/// `y0`; attribution is then a single linear merge of the two sequences.
pub fn chunk_page(
    document: &str,
    page_num: u32,
    blocks: &[Block],
    headers_on_page: &[Header],
    title: &str,
    current_label: String,
    config: &ChunkConfig,
) -> PageOutcome {
    let mut label = current_label;
    let mut next_header = 0usize;
    // Insertion order decides chunk emission order within the page.
    let mut sections: IndexMap<String, String> = IndexMap::new();

    for block in blocks {
        if block.text().is_empty() {
            continue;
        }
        if classify(block, title, headers_on_page) != BlockRole::Body {
            continue;
        }
        while next_header < headers_on_page.len() && block.y0() >= headers_on_page[next_header].y0
        {
            label = headers_on_page[next_header].title.clone();
            next_header += 1;
        }
        trace!(document, page_num, section = %label, "Body block");
        let text = sections.entry(label.clone()).or_default();
        text.push_str(block.text());
        text.push(' ');
    }

    let mut chunks = Vec::new();
    for (section, text) in &sections {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        for window in sliding_windows(&tokens, config) {
            if window.split_whitespace().count() > config.min_words {
                chunks.push(Chunk {
                    document: document.to_string(),
                    page_num,
                    parent_section_title: section.clone(),
                    content: window,
                });
            }
        }
    }

    let carry_label = headers_on_page
        .last()
        .map(|h| h.title.clone())
        .unwrap_or(label);

    PageOutcome {
        chunks,
        carry_label,
    }
}
