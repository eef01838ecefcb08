//! Block validation, reading-order enforcement, and role classification.

use docsift_core::{Block, BlockRole, Header, RawBlock};
use tracing::{debug, warn};

/// Validate every raw block, page by page.
///
/// Blocks the layout engine emits without text (images, rules) are dropped
/// here; each drop is logged at debug level.
pub fn validate_pages(document: &str, pages: Vec<Vec<RawBlock>>) -> Vec<Vec<Block>> {
    pages
        .into_iter()
        .enumerate()
        .map(|(idx, raw_blocks)| {
            let page = idx as u32 + 1;
            let mut blocks: Vec<Block> = raw_blocks
                .into_iter()
                .filter_map(|raw| match Block::try_from_raw(page, raw) {
                    Ok(block) => Some(block),
                    Err(e) => {
                        debug!(document, page, error = %e, "Skipping non-text block");
                        None
                    }
                })
                .collect();
            ensure_reading_order(document, page, &mut blocks);
            blocks
        })
        .collect()
}

/// Enforce the top-to-bottom block order the section merge relies on.
///
/// Returns `true` when the page had to be re-sorted.
pub fn ensure_reading_order(document: &str, page: u32, blocks: &mut [Block]) -> bool {
    let sorted = blocks.windows(2).all(|w| w[0].y0() <= w[1].y0());
    if sorted {
        return false;
    }
    warn!(
        document,
        page, "Blocks are not in top-to-bottom order; re-sorting by y0"
    );
    // Stable: blocks on the same row keep the supplier's left-to-right order.
    blocks.sort_by(|a, b| a.y0().total_cmp(&b.y0()));
    true
}

/// Decide whether a block is structural (title/header) or section content.
///
/// Matching is by exact text, so body text that repeats a header verbatim on
/// the same page is treated as structural too.
pub fn classify(block: &Block, title: &str, headers_on_page: &[Header]) -> BlockRole {
    let text = block.text();
    if text == title {
        BlockRole::Title
    } else if headers_on_page.iter().any(|h| h.title == text) {
        BlockRole::Header
    } else {
        BlockRole::Body
    }
}
