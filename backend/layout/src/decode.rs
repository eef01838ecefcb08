//! Decoding of shown strings into text.
//!
//! Strings are decoded through the font's own encoding (`/Encoding` or the
//! `/ToUnicode` CMap) as resolved by `lopdf`. Fonts without a usable encoding
//! fall back to byte-level decoding.

use lopdf::{Document, Encoding};
use tracing::debug;

/// Decode a shown string with the current font's encoding, if any.
pub fn decode_shown(encoding: Option<&Encoding>, bytes: &[u8]) -> String {
    if let Some(encoding) = encoding {
        match Document::decode_text(encoding, bytes) {
            Ok(text) => return clean(&text),
            Err(e) => debug!(error = %e, ?encoding, "Font encoding cannot decode string"),
        }
    }
    decode_pdf_string(bytes)
}

/// Decode the bytes of a PDF string operand without font information.
///
/// Handles UTF-16BE with a byte-order mark, valid UTF-8, and otherwise
/// treats each byte as a Latin-1 code point.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return clean(&String::from_utf16_lossy(&units));
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => clean(s),
        Err(_) => clean(&bytes.iter().map(|&b| b as char).collect::<String>()),
    }
}

/// Whitespace becomes a space; control and replacement characters go.
fn clean(s: &str) -> String {
    s.chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() || c == char::REPLACEMENT_CHARACTER {
                None
            } else {
                Some(c)
            }
        })
        .collect()
}
