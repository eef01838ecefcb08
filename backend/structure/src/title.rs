//! Document title detection from page-one typography.

use std::path::Path;

use docsift_core::Block;
use tracing::debug;

/// A title candidate's first span must be within this many points of the
/// page's largest font size.
const TITLE_SIZE_TOLERANCE: f32 = 1.0;

/// Titles have more than this many words...
const TITLE_MIN_WORDS_EXCLUSIVE: usize = 1;

/// ...and fewer than this many.
const TITLE_MAX_WORDS_EXCLUSIVE: usize = 20;

/// Find the dominant title among the blocks of page one.
///
/// Returns the topmost block set in (nearly) the largest font on the page
/// whose text is a short phrase, or `None` when no block qualifies.
pub fn detect_title(first_page: &[Block]) -> Option<String> {
    let max_size = first_page
        .iter()
        .map(Block::max_span_size)
        .fold(0.0f32, f32::max);
    if max_size <= 0.0 {
        return None;
    }

    let mut candidates: Vec<&Block> = first_page
        .iter()
        .filter(|b| (b.first_span().size - max_size).abs() < TITLE_SIZE_TOLERANCE)
        .filter(|b| {
            let words = b.word_count();
            words > TITLE_MIN_WORDS_EXCLUSIVE && words < TITLE_MAX_WORDS_EXCLUSIVE
        })
        .collect();
    candidates.sort_by(|a, b| a.y0().total_cmp(&b.y0()));

    let title = candidates.first().map(|b| b.text().to_string());
    debug!(max_size, candidates = candidates.len(), title = ?title, "Title detection");
    title
}

/// Section label used for text that precedes every header: the title, or
/// the file name without its extension when no title was found.
pub fn fallback_label(title: Option<&str>, filename: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string()),
    }
}
