//! Structural parsing of positioned text blocks.
//!
//! Recovers a document's title and sub-section headers from font metrics,
//! then walks the pages in order, attributing body text to the active
//! section and slicing each section's text into overlapping word windows.

pub mod blocks;
pub mod chunker;
pub mod document;
pub mod headers;
pub mod title;

pub use blocks::{classify, ensure_reading_order, validate_pages};
pub use chunker::{chunk_page, sliding_windows, ChunkConfig, PageOutcome};
pub use document::{parse_document, ParsedDocument};
pub use headers::detect_headers;
pub use title::{detect_title, fallback_label};
