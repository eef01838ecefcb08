//! Block suppliers: turn a document on disk into pages of positioned text
//! blocks.
//!
//! - [`PdfLayoutReader`] reads PDF content streams with `lopdf`.
//! - [`LayoutDumpReader`] reads a JSON layout dump produced by an external
//!   layout engine.

pub mod decode;
pub mod dump;
pub mod grouping;
pub mod pdf;

use std::path::{Path, PathBuf};

use docsift_core::BlockSupplier;

pub use dump::LayoutDumpReader;
pub use pdf::PdfLayoutReader;

/// Extension of layout dumps stored next to their PDF.
pub const LAYOUT_DUMP_SUFFIX: &str = "layout.json";

/// Path of the layout dump that may accompany `pdf_path`.
pub fn sibling_dump_path(pdf_path: &Path) -> PathBuf {
    pdf_path.with_extension(LAYOUT_DUMP_SUFFIX)
}

/// Pick a supplier for `pdf_path`: a sibling layout dump wins over parsing
/// the PDF itself.
pub fn supplier_for(pdf_path: &Path) -> Box<dyn BlockSupplier> {
    let dump = sibling_dump_path(pdf_path);
    if dump.is_file() {
        Box::new(LayoutDumpReader::at(dump))
    } else {
        Box::new(PdfLayoutReader::default())
    }
}
