use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DocsiftError, DocsiftResult};

/// A run of text sharing one font and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub size: f32,
    #[serde(default)]
    pub font: String,
    #[serde(default)]
    pub bold: bool,
}

impl Span {
    pub fn new(text: impl Into<String>, size: f32, bold: bool) -> Self {
        Self {
            text: text.into(),
            size,
            font: String::new(),
            bold,
        }
    }
}

/// One visual line of a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Span texts concatenated without separators.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A block as handed over by the layout engine, before validation.
///
/// Non-text blocks (images, rules) arrive with no lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub x0: f32,
    pub y0: f32,
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl RawBlock {
    pub fn new(y0: f32, lines: Vec<Line>) -> Self {
        Self { x0: 0.0, y0, lines }
    }
}

/// A validated text block: at least one line, and every line has a span.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    page: u32,
    x0: f32,
    y0: f32,
    lines: Vec<Line>,
    text: String,
}

impl Block {
    /// Validate a raw block from page `page` (1-based).
    pub fn try_from_raw(page: u32, raw: RawBlock) -> DocsiftResult<Self> {
        if raw.lines.is_empty() {
            return Err(DocsiftError::MalformedBlock {
                page,
                reason: "block has no lines".into(),
            });
        }
        if let Some(idx) = raw.lines.iter().position(|l| l.spans.is_empty()) {
            return Err(DocsiftError::MalformedBlock {
                page,
                reason: format!("line {idx} has no spans"),
            });
        }
        if !raw.y0.is_finite() {
            return Err(DocsiftError::MalformedBlock {
                page,
                reason: "non-finite y0".into(),
            });
        }

        let text = raw
            .lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        Ok(Self {
            page,
            x0: raw.x0,
            y0: raw.y0,
            lines: raw.lines,
            text,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn x0(&self) -> f32 {
        self.x0
    }

    pub fn y0(&self) -> f32 {
        self.y0
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Lines joined by a single space, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// First span of the first line. Always present after validation.
    pub fn first_span(&self) -> &Span {
        &self.lines[0].spans[0]
    }

    pub fn max_span_size(&self) -> f32 {
        self.lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .map(|s| s.size)
            .fold(0.0f32, f32::max)
    }

    pub fn is_bold(&self) -> bool {
        self.first_span().bold
    }
}

/// Structural role of a block once title and headers are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Title,
    Header,
    Body,
}

/// A detected sub-section header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub title: String,
    pub page: u32,
    pub y0: f32,
}

/// A window of section text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub document: String,
    pub page_num: u32,
    pub parent_section_title: String,
    pub content: String,
}

impl Chunk {
    pub fn section_key(&self) -> SectionKey {
        SectionKey {
            document: self.document.clone(),
            section_title: self.parent_section_title.clone(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Deduplication unit: one representative chunk per section of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionKey {
    pub document: String,
    pub section_title: String,
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.document, self.section_title)
    }
}

/// A chunk with its retrieval score attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(parts: &[(&str, f32)]) -> Line {
        Line::new(parts.iter().map(|(t, s)| Span::new(*t, *s, false)).collect())
    }

    #[test]
    fn block_text_joins_lines_and_concatenates_spans() {
        let raw = RawBlock::new(
            10.0,
            vec![line(&[("Risk ", 11.0), ("factors", 11.0)]), line(&[("  overview ", 9.0)])],
        );
        let block = Block::try_from_raw(1, raw).unwrap();
        assert_eq!(block.text(), "Risk factors   overview");
        assert_eq!(block.line_count(), 2);
        assert_eq!(block.word_count(), 3);
        assert_eq!(block.max_span_size(), 11.0);
    }

    #[test]
    fn block_without_lines_is_rejected() {
        let err = Block::try_from_raw(3, RawBlock::new(5.0, vec![])).unwrap_err();
        assert!(matches!(err, DocsiftError::MalformedBlock { page: 3, .. }));
    }

    #[test]
    fn line_without_spans_is_rejected() {
        let raw = RawBlock::new(5.0, vec![line(&[("ok", 10.0)]), Line::default()]);
        let err = Block::try_from_raw(1, raw).unwrap_err();
        assert!(err.to_string().contains("line 1 has no spans"));
    }

    #[test]
    fn section_key_pairs_document_and_title() {
        let chunk = Chunk {
            document: "a.pdf".into(),
            page_num: 2,
            parent_section_title: "Intro".into(),
            content: "text".into(),
        };
        let key = chunk.section_key();
        assert_eq!(key.document, "a.pdf");
        assert_eq!(key.section_title, "Intro");
        assert_eq!(key.to_string(), "a.pdf / Intro");
    }
}
