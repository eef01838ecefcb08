//! PDF block supplier built on `lopdf` content streams.
//!
//! Only what section detection needs is tracked: text position, effective
//! font size, font name and the font's text encoding. Glyph widths are
//! estimated, so horizontal spacing is approximate.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use docsift_core::{BlockSupplier, RawBlock};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use tracing::{debug, warn};

use crate::decode::decode_shown;
use crate::grouping::{group_runs, GroupingOptions, TextRun};

/// US Letter height, used when a page carries no usable MediaBox.
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;
/// TJ adjustments below this (thousandths of an em) read as a word break.
const TJ_SPACE_THRESHOLD: f32 = -200.0;
const AVG_GLYPH_WIDTH: f32 = 0.5;
const MAX_INHERIT_DEPTH: usize = 32;

/// True when a font name suggests a heavy weight.
pub fn font_is_bold(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("bold") || lower.contains("black") || lower.contains("heavy")
}

#[derive(Debug, Clone, Default)]
pub struct PdfLayoutReader {
    options: GroupingOptions,
}

impl PdfLayoutReader {
    pub fn new(options: GroupingOptions) -> Self {
        Self { options }
    }

    pub fn pages_from_bytes(&self, bytes: &[u8]) -> Result<Vec<Vec<RawBlock>>> {
        let doc = Document::load_mem(bytes).context("Failed to load PDF from memory")?;
        Ok(self.pages_from_document(&doc))
    }

    /// One entry per page in page order. Pages whose content cannot be
    /// decoded come back empty so later page numbers stay correct.
    pub fn pages_from_document(&self, doc: &Document) -> Vec<Vec<RawBlock>> {
        doc.get_pages()
            .into_iter()
            .map(|(page_num, page_id)| match self.page_runs(doc, page_id) {
                Ok(runs) => {
                    debug!(page_num, runs = runs.len(), "Extracted text runs");
                    group_runs(runs, &self.options)
                }
                Err(e) => {
                    warn!(page_num, error = %e, "Skipping undecodable page content");
                    Vec::new()
                }
            })
            .collect()
    }

    fn page_runs(&self, doc: &Document, page_id: ObjectId) -> Result<Vec<TextRun>> {
        let bytes = doc
            .get_page_content(page_id)
            .context("Failed to read page content")?;
        let content = Content::decode(&bytes).context("Failed to decode content stream")?;
        let fonts = page_fonts(doc, page_id);
        let height = page_height(doc, page_id);

        let mut state = TextState::new(height, &fonts);
        for op in &content.operations {
            state.apply(op);
        }
        Ok(state.runs)
    }
}

impl BlockSupplier for PdfLayoutReader {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn pages(&self, path: &Path) -> Result<Vec<Vec<RawBlock>>> {
        let doc = Document::load(path)
            .with_context(|| format!("Failed to load PDF {}", path.display()))?;
        Ok(self.pages_from_document(&doc))
    }
}

/// A page font resource: its display name and text encoding.
struct PageFont<'a> {
    name: String,
    encoding: Option<Encoding<'a>>,
}

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translate(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

struct TextState<'a> {
    page_height: f32,
    fonts: &'a HashMap<Vec<u8>, PageFont<'a>>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font: String,
    encoding: Option<&'a Encoding<'a>>,
    font_size: f32,
    leading: f32,
    runs: Vec<TextRun>,
}

impl<'a> TextState<'a> {
    fn new(page_height: f32, fonts: &'a HashMap<Vec<u8>, PageFont<'a>>) -> Self {
        Self {
            page_height,
            fonts,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            font: String::new(),
            encoding: None,
            font_size: 0.0,
            leading: 0.0,
            runs: Vec::new(),
        }
    }

    fn apply(&mut self, op: &Operation) {
        let nums: Vec<f32> = op.operands.iter().filter_map(number).collect();
        match op.operator.as_str() {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(m) = self.ctm_stack.pop() {
                    self.ctm = m;
                }
            }
            "cm" => {
                if let Some(m) = matrix(&nums) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }
            "BT" => {
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    match self.fonts.get(name) {
                        Some(font) => {
                            self.font = font.name.clone();
                            self.encoding = font.encoding.as_ref();
                        }
                        None => {
                            self.font = String::from_utf8_lossy(name).into_owned();
                            self.encoding = None;
                        }
                    }
                }
                if let Some(size) = op.operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "TL" => {
                if let Some(&l) = nums.first() {
                    self.leading = l;
                }
            }
            "Td" => {
                if let [tx, ty] = nums[..] {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let [tx, ty] = nums[..] {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix(&nums) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(text) = op.operands.first().and_then(|o| self.string_operand(o)) {
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(text) = op.operands.first().and_then(|o| self.string_operand(o)) {
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(text) = op.operands.get(2).and_then(|o| self.string_operand(o)) {
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                text.push_str(&decode_shown(self.encoding, bytes))
                            }
                            other => {
                                if number(other).is_some_and(|n| n < TJ_SPACE_THRESHOLD)
                                    && !text.ends_with(' ')
                                {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                    self.show(text);
                }
            }
            _ => {}
        }
    }

    fn string_operand(&self, obj: &Object) -> Option<String> {
        match obj {
            Object::String(bytes, _) => Some(decode_shown(self.encoding, bytes)),
            _ => None,
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = multiply(&translate(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let m = multiply(&self.tm, &self.ctm);
        let scale = m[2].hypot(m[3]);
        let size = if scale > 0.0 {
            self.font_size * scale
        } else {
            self.font_size
        };
        let baseline = m[5];
        // Text-space advance; Tm and the CTM scale it like the glyphs.
        let advance = text.chars().count() as f32 * self.font_size * AVG_GLYPH_WIDTH;

        self.runs.push(TextRun {
            x: m[4],
            top: self.page_height - baseline - size,
            size,
            bold: font_is_bold(&self.font),
            font: self.font.clone(),
            text,
        });
        self.tm = multiply(&translate(advance, 0.0), &self.tm);
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn matrix(nums: &[f32]) -> Option<Matrix> {
    match nums {
        [a, b, c, d, e, f] => Some([*a, *b, *c, *d, *e, *f]),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look `key` up on the page, then on its ancestors in the page tree.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut id = page_id;
    for _ in 0..MAX_INHERIT_DEPTH {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => id = *parent,
            _ => return None,
        }
    }
    None
}

fn page_height(doc: &Document, page_id: ObjectId) -> f32 {
    let media_box = match inherited(doc, page_id, b"MediaBox") {
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| resolve(doc, o).and_then(number))
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    match media_box[..] {
        [_, y0, _, y1] if (y1 - y0).abs() > 0.0 => (y1 - y0).abs(),
        _ => DEFAULT_PAGE_HEIGHT,
    }
}

/// Page font resources keyed by resource name. The display name is the
/// base font with any subset prefix removed.
fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, PageFont<'_>> {
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(e) => {
            debug!(error = %e, "Page font resources unreadable");
            return HashMap::new();
        }
    };

    fonts
        .into_iter()
        .map(|(resource, font)| {
            let name = base_font_name(doc, font)
                .unwrap_or_else(|| String::from_utf8_lossy(&resource).into_owned());
            let encoding = match font.get_font_encoding(doc) {
                Ok(encoding) => Some(encoding),
                Err(e) => {
                    debug!(font = %name, error = %e, "No usable font encoding");
                    None
                }
            };
            (resource, PageFont { name, encoding })
        })
        .collect()
}

fn base_font_name(doc: &Document, font: &Dictionary) -> Option<String> {
    let base = font.get_deref(b"BaseFont", doc).ok()?.as_name().ok()?;
    let base = String::from_utf8_lossy(base).into_owned();
    Some(match base.split_once('+') {
        Some((prefix, rest)) if prefix.len() == 6 => rest.to_string(),
        _ => base,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream, StringFormat};

    const TO_UNICODE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo <<
/Registry (Adobe)
/Ordering (UCS)
/Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
4 beginbfchar
<0001> <0052>
<0002> <0069>
<0003> <0073>
<0004> <0020>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

    fn build_pdf(pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "ABCDEF+Helvetica-Bold",
        });
        let win_ansi = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "Georgia",
            "Encoding" => "WinAnsiEncoding",
        });
        let to_unicode = doc.add_object(Stream::new(dictionary! {}, TO_UNICODE.to_vec()));
        let composite = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ABCDEF+Calibri-Bold",
            "Encoding" => "Identity-H",
            "ToUnicode" => to_unicode,
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
                "F3" => win_ansi,
                "F4" => composite,
            },
        });

        let mut kids = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn text_at(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    #[test]
    fn heading_and_body_come_out_as_blocks() {
        let mut page = text_at("F2", 18, 72, 700, "Quarterly Risk Review");
        page.extend(text_at("F1", 10, 72, 650, "Revenue grew in every region."));
        let bytes = build_pdf(vec![page]);

        let pages = PdfLayoutReader::default().pages_from_bytes(&bytes).unwrap();
        assert_eq!(pages.len(), 1);
        let blocks = &pages[0];
        assert_eq!(blocks.len(), 2);

        let heading = &blocks[0].lines[0].spans[0];
        assert_eq!(heading.text, "Quarterly Risk Review");
        assert_eq!(heading.size, 18.0);
        assert_eq!(heading.font, "Helvetica-Bold");
        assert!(heading.bold);
        // 792 - 700 - 18
        assert_eq!(blocks[0].y0, 74.0);

        assert_eq!(blocks[1].lines[0].text(), "Revenue grew in every region.");
        assert!(!blocks[1].lines[0].spans[0].bold);
        assert!(blocks[0].y0 < blocks[1].y0);
    }

    #[test]
    fn tj_kerning_gaps_become_spaces() {
        let page = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 500.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Market"),
                    Object::Integer(-250),
                    Object::string_literal("Outlook"),
                    Object::Integer(-20),
                    Object::string_literal("s"),
                ])],
            ),
            Operation::new("ET", vec![]),
        ];
        let pages = PdfLayoutReader::default()
            .pages_from_bytes(&build_pdf(vec![page]))
            .unwrap();
        assert_eq!(pages[0][0].lines[0].text(), "Market Outlooks");
    }

    #[test]
    fn composite_font_text_decodes_through_to_unicode() {
        let page = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F4".into(), 16.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x03],
                    StringFormat::Hexadecimal,
                )],
            ),
            Operation::new("ET", vec![]),
        ];
        let pages = PdfLayoutReader::default()
            .pages_from_bytes(&build_pdf(vec![page]))
            .unwrap();
        assert_eq!(pages[0].len(), 1);
        let span = &pages[0][0].lines[0].spans[0];
        assert_eq!(span.text, "Riss");
        assert_eq!(span.font, "Calibri-Bold");
        assert!(span.bold);
    }

    #[test]
    fn win_ansi_quotes_and_dashes_are_kept() {
        let page = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F3".into(), 11.into()]),
            Operation::new("Td", vec![72.into(), 600.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    vec![0x93, b'Q', b'3', 0x94, b' ', 0x96, b' ', b'f', b'l', b'a', b't'],
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ];
        let pages = PdfLayoutReader::default()
            .pages_from_bytes(&build_pdf(vec![page]))
            .unwrap();
        assert_eq!(
            pages[0][0].lines[0].text(),
            "\u{201C}Q3\u{201D} \u{2013} flat"
        );
    }

    #[test]
    fn switching_fonts_switches_encoding() {
        let mut page = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F4".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(vec![0x00, 0x01, 0x00, 0x02], StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
        ];
        page.extend(text_at("F1", 12, 72, 600, "plain text"));
        let pages = PdfLayoutReader::default()
            .pages_from_bytes(&build_pdf(vec![page]))
            .unwrap();
        assert_eq!(pages[0][0].lines[0].text(), "Ri");
        assert_eq!(pages[0][1].lines[0].text(), "plain text");
    }

    #[test]
    fn scaled_ctm_keeps_consecutive_runs_adjacent() {
        let page = vec![
            Operation::new("cm", vec![2.into(), 0.into(), 0.into(), 2.into(), 0.into(), 0.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![36.into(), 350.into()]),
            Operation::new("Tj", vec![Object::string_literal("Net")]),
            Operation::new("Tj", vec![Object::string_literal("Profit")]),
            Operation::new("ET", vec![]),
        ];
        let pages = PdfLayoutReader::default()
            .pages_from_bytes(&build_pdf(vec![page]))
            .unwrap();
        let line = &pages[0][0].lines[0];
        assert_eq!(line.spans[0].size, 20.0);
        // Estimated end of "Net" meets the start of "Profit".
        assert_eq!(line.text(), "NetProfit");
        // 792 - 700 - 20
        assert_eq!(pages[0][0].y0, 72.0);
    }

    #[test]
    fn pages_keep_their_order() {
        let bytes = build_pdf(vec![
            text_at("F1", 10, 72, 700, "first page text"),
            Vec::new(),
            text_at("F1", 10, 72, 700, "third page text"),
        ]);
        let pages = PdfLayoutReader::default().pages_from_bytes(&bytes).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0][0].lines[0].text(), "first page text");
        assert!(pages[1].is_empty());
        assert_eq!(pages[2][0].lines[0].text(), "third page text");
    }

    #[test]
    fn non_pdf_bytes_are_an_error() {
        assert!(PdfLayoutReader::default()
            .pages_from_bytes(b"definitely not a pdf")
            .is_err());
    }

    #[test]
    fn bold_font_names() {
        assert!(font_is_bold("Arial-BoldMT"));
        assert!(font_is_bold("Lato-Black"));
        assert!(!font_is_bold("TimesNewRoman"));
    }
}
