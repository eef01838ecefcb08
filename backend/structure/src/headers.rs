//! Sub-section header detection across all pages.

use docsift_core::{Block, Header};
use tracing::debug;

/// Bold text above this size is a header.
const BOLD_HEADER_MIN_SIZE: f32 = 13.0;

/// Any text above this size is a header.
const PLAIN_HEADER_MIN_SIZE: f32 = 16.0;

const HEADER_MIN_WORDS_EXCLUSIVE: usize = 1;
const HEADER_MAX_WORDS_EXCLUSIVE: usize = 15;

/// Whether a block looks like a sub-section header.
///
/// A header is a single line, distinct from the document title, set large
/// (or bold and moderately large), a short phrase, and not a sentence.
pub fn is_header(block: &Block, title: Option<&str>) -> bool {
    if block.line_count() != 1 {
        return false;
    }
    let text = block.text();
    if title.is_some_and(|t| t == text) {
        return false;
    }

    let span = block.first_span();
    let big_enough = (span.size > BOLD_HEADER_MIN_SIZE && span.bold)
        || span.size > PLAIN_HEADER_MIN_SIZE;
    if !big_enough {
        return false;
    }

    let words = block.word_count();
    words > HEADER_MIN_WORDS_EXCLUSIVE && words < HEADER_MAX_WORDS_EXCLUSIVE && !text.ends_with('.')
}

/// Detect headers on every page, ordered by `(page, y0)`.
pub fn detect_headers(pages: &[Vec<Block>], title: Option<&str>) -> Vec<Header> {
    let mut headers: Vec<Header> = pages
        .iter()
        .flatten()
        .filter(|b| is_header(b, title))
        .map(|b| Header {
            title: b.text().to_string(),
            page: b.page(),
            y0: b.y0(),
        })
        .collect();

    headers.sort_by(|a, b| a.page.cmp(&b.page).then(a.y0.total_cmp(&b.y0)));
    debug!(count = headers.len(), "Header detection");
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::{Line, RawBlock, Span};

    fn block(page: u32, y0: f32, lines: &[(&str, f32, bool)]) -> Block {
        let lines = lines
            .iter()
            .map(|(t, s, b)| Line::new(vec![Span::new(*t, *s, *b)]))
            .collect();
        Block::try_from_raw(page, RawBlock::new(y0, lines)).unwrap()
    }

    #[test]
    fn bold_medium_text_is_a_header() {
        assert!(is_header(&block(1, 10.0, &[("Credit Risk", 14.0, true)]), None));
        assert!(!is_header(&block(1, 10.0, &[("Credit Risk", 14.0, false)]), None));
        assert!(!is_header(&block(1, 10.0, &[("Credit Risk", 13.0, true)]), None));
    }

    #[test]
    fn large_text_is_a_header_without_bold() {
        assert!(is_header(&block(1, 10.0, &[("Market Overview", 16.5, false)]), None));
        assert!(!is_header(&block(1, 10.0, &[("Market Overview", 16.0, false)]), None));
    }

    #[test]
    fn shape_rules() {
        // multi-line
        assert!(!is_header(
            &block(1, 10.0, &[("Market", 18.0, true), ("Overview", 18.0, true)]),
            None
        ));
        // one word
        assert!(!is_header(&block(1, 10.0, &[("Overview", 18.0, true)]), None));
        // sentence
        assert!(!is_header(&block(1, 10.0, &[("This is a sentence.", 18.0, true)]), None));
        // fifteen words
        let long = vec!["w"; 15].join(" ");
        assert!(!is_header(&block(1, 10.0, &[(&long, 18.0, true)]), None));
        let ok = vec!["w"; 14].join(" ");
        assert!(is_header(&block(1, 10.0, &[(&ok, 18.0, true)]), None));
    }

    #[test]
    fn title_is_never_a_header() {
        let b = block(1, 10.0, &[("Annual Report 2024", 24.0, true)]);
        assert!(!is_header(&b, Some("Annual Report 2024")));
        assert!(is_header(&b, Some("Something Else")));
    }

    #[test]
    fn headers_are_sorted_by_page_then_y0() {
        let pages = vec![
            vec![
                block(1, 400.0, &[("Late Section", 18.0, true)]),
                block(1, 100.0, &[("Early Section", 18.0, true)]),
                block(1, 50.0, &[("Document Title Here", 24.0, true)]),
            ],
            vec![block(2, 20.0, &[("Second Page", 18.0, true)])],
        ];
        let headers = detect_headers(&pages, Some("Document Title Here"));
        let titles: Vec<&str> = headers.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Early Section", "Late Section", "Second Page"]);
        assert!(headers
            .windows(2)
            .all(|w| (w[0].page, w[0].y0) <= (w[1].page, w[1].y0)));
        assert!(headers.iter().all(|h| h.title != "Document Title Here"));
    }
}
