//! Whole-document parsing: validation, title and header detection, then
//! page-by-page chunking with the section label carried across pages.

use docsift_core::{Chunk, Header, RawBlock};
use serde::Serialize;
use tracing::info;

use crate::blocks::validate_pages;
use crate::chunker::{chunk_page, ChunkConfig, PageOutcome};
use crate::headers::detect_headers;
use crate::title::{detect_title, fallback_label};

/// Structure recovered from one document.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedDocument {
    pub document: String,
    pub title: Option<String>,
    pub page_count: usize,
    pub headers: Vec<Header>,
    pub chunks: Vec<Chunk>,
}

/// Parse the pages of `document` into section-attributed chunks.
///
/// Reads only its own input, so documents can be parsed on independent
/// workers and their chunk lists concatenated afterwards.
pub fn parse_document(
    document: &str,
    raw_pages: Vec<Vec<RawBlock>>,
    config: &ChunkConfig,
) -> ParsedDocument {
    let pages = validate_pages(document, raw_pages);

    let title = pages.first().and_then(|p| detect_title(p));
    let headers = detect_headers(&pages, title.as_deref());
    let title_text = title.clone().unwrap_or_default();
    let initial_label = fallback_label(title.as_deref(), document);

    let (_, chunks) = pages.iter().enumerate().fold(
        (initial_label, Vec::new()),
        |(label, mut chunks), (idx, blocks)| {
            let page_num = idx as u32 + 1;
            let headers_on_page: Vec<Header> = headers
                .iter()
                .filter(|h| h.page == page_num)
                .cloned()
                .collect();
            let PageOutcome {
                chunks: page_chunks,
                carry_label,
            } = chunk_page(
                document,
                page_num,
                blocks,
                &headers_on_page,
                &title_text,
                label,
                config,
            );
            chunks.extend(page_chunks);
            (carry_label, chunks)
        },
    );

    info!(
        document,
        pages = pages.len(),
        title = ?title,
        headers = headers.len(),
        chunks = chunks.len(),
        "Parsed document structure"
    );

    ParsedDocument {
        document: document.to_string(),
        title,
        page_count: pages.len(),
        headers,
        chunks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::{Line, Span};

    fn words(prefix: &str, n: usize) -> String {
        (0..n)
            .map(|i| format!("{prefix}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn raw(y0: f32, text: &str, size: f32, bold: bool) -> RawBlock {
        RawBlock::new(y0, vec![Line::new(vec![Span::new(text, size, bold)])])
    }

    #[test]
    fn section_continues_onto_page_without_headers() {
        let pages = vec![
            vec![
                raw(40.0, "Field Guide To Risk", 24.0, true),
                raw(100.0, "Intro Section", 18.0, true),
                raw(130.0, &words("one", 30), 10.0, false),
            ],
            vec![raw(60.0, &words("two", 30), 10.0, false)],
        ];
        let parsed = parse_document("guide.pdf", pages, &ChunkConfig::default());

        assert_eq!(parsed.title.as_deref(), Some("Field Guide To Risk"));
        assert_eq!(parsed.headers.len(), 1);
        assert_eq!(parsed.headers[0].title, "Intro Section");

        let page_two: Vec<&Chunk> = parsed.chunks.iter().filter(|c| c.page_num == 2).collect();
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two[0].parent_section_title, "Intro Section");
        assert!(!parsed
            .chunks
            .iter()
            .any(|c| c.content.contains("Field Guide")));
    }

    #[test]
    fn text_before_first_header_uses_title() {
        let pages = vec![vec![
            raw(40.0, "Field Guide To Risk", 24.0, true),
            raw(80.0, &words("pre", 25), 10.0, false),
            raw(200.0, "Later Section", 18.0, true),
            raw(220.0, &words("post", 25), 10.0, false),
        ]];
        let parsed = parse_document("guide.pdf", pages, &ChunkConfig::default());
        let sections: Vec<&str> = parsed
            .chunks
            .iter()
            .map(|c| c.parent_section_title.as_str())
            .collect();
        assert_eq!(sections, vec!["Field Guide To Risk", "Later Section"]);
    }

    #[test]
    fn filename_is_the_label_without_a_title() {
        let pages = vec![vec![raw(80.0, &words("body", 40), 10.0, false)]];
        let parsed = parse_document("q3-notes.pdf", pages, &ChunkConfig::default());
        assert_eq!(parsed.title, None);
        assert_eq!(parsed.chunks.len(), 1);
        assert_eq!(parsed.chunks[0].parent_section_title, "q3-notes");
    }

    #[test]
    fn unsorted_blocks_are_attributed_by_position() {
        // Supplier order violates the top-to-bottom contract.
        let pages = vec![vec![
            raw(400.0, &words("late", 25), 10.0, false),
            raw(300.0, "Closing Remarks", 18.0, true),
            raw(100.0, &words("early", 25), 10.0, false),
            raw(20.0, "Internal Memo Draft", 24.0, true),
        ]];
        let parsed = parse_document("memo.pdf", pages, &ChunkConfig::default());
        let by_section: Vec<(&str, &str)> = parsed
            .chunks
            .iter()
            .map(|c| (c.parent_section_title.as_str(), c.content.as_str()))
            .collect();
        assert_eq!(by_section.len(), 2);
        assert_eq!(by_section[0].0, "Internal Memo Draft");
        assert!(by_section[0].1.starts_with("early0"));
        assert_eq!(by_section[1].0, "Closing Remarks");
        assert!(by_section[1].1.starts_with("late0"));
    }

    #[test]
    fn every_chunk_has_a_label_and_enough_words() {
        let pages = vec![
            vec![
                raw(40.0, "Field Guide To Risk", 24.0, true),
                raw(80.0, &words("a", 200), 10.0, false),
                raw(90.0, "short tail", 10.0, false),
            ],
            vec![
                raw(10.0, "Appendix Tables Section", 18.0, true),
                raw(30.0, &words("b", 10), 10.0, false),
            ],
        ];
        let parsed = parse_document("guide.pdf", pages, &ChunkConfig::default());
        assert!(!parsed.chunks.is_empty());
        for chunk in &parsed.chunks {
            assert!(chunk.word_count() > 20);
            assert!(!chunk.parent_section_title.is_empty());
        }
    }
}
