//! Layout-preserving text extraction from PDF using lopdf
//!
//! Walks each page's content stream to collect positioned text items, then
//! renders them back into fixed-pitch lines so that the gaps between the
//! report's columns survive as whitespace runs.

use crate::ParseError;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Items whose baselines differ by less than this share a line
const LINE_Y_TOLERANCE: f32 = 3.0;

/// Average glyph advance as a fraction of the font size
const GLYPH_WIDTH_EM: f32 = 0.5;

/// `TJ` adjustments at or below this (thousandths of an em) separate words
const TJ_WORD_GAP: f32 = -200.0;

/// A run of text with its position on the page
#[derive(Debug, Clone)]
pub struct TextItem {
    pub text: String,
    /// X position on page
    pub x: f32,
    /// Y position on page (PDF coordinates, origin at bottom-left)
    pub y: f32,
    pub font_size: f32,
}

impl TextItem {
    pub fn new(text: &str, x: f32, y: f32, font_size: f32) -> Self {
        Self {
            text: text.to_string(),
            x,
            y,
            font_size,
        }
    }
}

/// Load a PDF and extract the positioned text of every page, in page order
pub fn extract_pages<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<TextItem>>, ParseError> {
    let doc = Document::load(path)?;
    extract_pages_from_doc(&doc)
}

/// Same as [`extract_pages`], from a memory buffer
pub fn extract_pages_mem(buffer: &[u8]) -> Result<Vec<Vec<TextItem>>, ParseError> {
    let doc = Document::load_mem(buffer)?;
    extract_pages_from_doc(&doc)
}

fn extract_pages_from_doc(doc: &Document) -> Result<Vec<Vec<TextItem>>, ParseError> {
    let pages = doc.get_pages();
    log::debug!("extracting text from {} pages", pages.len());

    pages
        .iter()
        .map(|(&page_num, &page_id)| extract_page_items(doc, page_id, page_num))
        .collect()
}

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Multiply two 2D transformation matrices in PDF `[a b c d e f]` form
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

/// Graphics and text state while walking a content stream
struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font: Vec<u8>,
    font_size: f32,
    in_text: bool,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            in_text: false,
        }
    }

    fn next_line(&mut self) {
        self.line_matrix[5] -= self.font_size * 1.2;
        self.text_matrix = self.line_matrix;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_matrix[4] += tx;
        self.line_matrix[5] += ty;
        self.text_matrix = self.line_matrix;
    }

    /// Rendered font size, scaled by the text matrix
    fn rendered_size(&self) -> f32 {
        let m = &self.text_matrix;
        let scale_x = (m[0].powi(2) + m[1].powi(2)).sqrt();
        let scale_y = (m[2].powi(2) + m[3].powi(2)).sqrt();
        self.font_size * scale_x.max(scale_y)
    }

    fn item(&self, text: &str) -> TextItem {
        let origin = multiply(&self.text_matrix, &self.ctm);
        TextItem::new(text, origin[4], origin[5], self.rendered_size())
    }
}

fn extract_page_items(
    doc: &Document,
    page_id: ObjectId,
    page_num: u32,
) -> Result<Vec<TextItem>, ParseError> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let content_data = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_data)?;

    let mut items = Vec::new();
    let mut state = TextState::new();

    for op in &content.operations {
        let operands = &op.operands;
        let shown = match op.operator.as_str() {
            "q" => {
                state.ctm_stack.push(state.ctm);
                None
            }
            "Q" => {
                if let Some(saved) = state.ctm_stack.pop() {
                    state.ctm = saved;
                }
                None
            }
            "cm" if operands.len() >= 6 => {
                let m = read_matrix(operands);
                state.ctm = multiply(&m, &state.ctm);
                None
            }
            "BT" => {
                state.in_text = true;
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
                None
            }
            "ET" => {
                state.in_text = false;
                None
            }
            "Tf" if operands.len() >= 2 => {
                if let Ok(name) = operands[0].as_name() {
                    state.font = name.to_vec();
                }
                if let Some(size) = number(&operands[1]) {
                    state.font_size = size;
                }
                None
            }
            "Td" | "TD" if operands.len() >= 2 => {
                state.translate(
                    number(&operands[0]).unwrap_or(0.0),
                    number(&operands[1]).unwrap_or(0.0),
                );
                None
            }
            "Tm" if operands.len() >= 6 => {
                state.text_matrix = read_matrix(operands);
                state.line_matrix = state.text_matrix;
                None
            }
            "T*" => {
                state.next_line();
                None
            }
            "Tj" if state.in_text => operands
                .first()
                .and_then(|o| decode_operand(o, doc, &fonts, &state.font)),
            "TJ" if state.in_text => operands
                .first()
                .and_then(|o| o.as_array().ok())
                .map(|parts| decode_text_array(parts, doc, &fonts, &state.font)),
            "'" => {
                state.next_line();
                operands
                    .first()
                    .and_then(|o| decode_operand(o, doc, &fonts, &state.font))
            }
            _ => None,
        };

        if let Some(text) = shown.filter(|t| !t.trim().is_empty()) {
            items.push(state.item(&text));
        }
    }

    log::trace!("page {}: {} text items", page_num, items.len());
    Ok(items)
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn read_matrix(operands: &[Object]) -> Matrix {
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        if let Some(v) = number(operand) {
            *slot = v;
        }
    }
    m
}

/// Decode a string operand with the current font's encoding
///
/// Falls back to UTF-16BE (with BOM) and then Latin-1.
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    font: &[u8],
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(font) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    if let [0xFE, 0xFF, rest @ ..] = bytes.as_slice() {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Decode a `TJ` array, turning wide negative adjustments into spaces
fn decode_text_array(
    parts: &[Object],
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    font: &[u8],
) -> String {
    let mut text = String::new();
    for part in parts {
        match number(part) {
            Some(adjust) => {
                if adjust <= TJ_WORD_GAP && !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
            None => {
                if let Some(decoded) = decode_operand(part, doc, fonts, font) {
                    text.push_str(&decoded);
                }
            }
        }
    }
    text
}

/// Most common font size on the page, ignoring footnote-sized text
fn dominant_font_size(items: &[TextItem]) -> f32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for item in items.iter().filter(|i| i.font_size >= 6.0) {
        *counts.entry((item.font_size * 10.0) as i32).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|&(size, count)| (count, size))
        .map(|(size, _)| size as f32 / 10.0)
        .unwrap_or(12.0)
}

/// Render one page's items as fixed-pitch text lines, top to bottom
///
/// Each item starts at the character column nearest its X position, so
/// wide horizontal gaps on the page become runs of spaces.
pub fn layout_lines(items: &[TextItem]) -> Vec<String> {
    if items.is_empty() {
        return Vec::new();
    }

    let char_width = dominant_font_size(items) * GLYPH_WIDTH_EM;
    let x_origin = items.iter().map(|i| i.x).fold(f32::INFINITY, f32::min);

    let mut sorted: Vec<&TextItem> = items.iter().collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<&TextItem>> = Vec::new();
    for item in sorted {
        let same_row = rows
            .last()
            .map_or(false, |row| (row[0].y - item.y).abs() < LINE_Y_TOLERANCE);
        match rows.last_mut() {
            Some(row) if same_row => row.push(item),
            _ => rows.push(vec![item]),
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            render_row(&row, x_origin, char_width)
        })
        .collect()
}

fn render_row(row: &[&TextItem], x_origin: f32, char_width: f32) -> String {
    let mut line = String::new();
    let mut len = 0usize;

    for item in row {
        let column = ((item.x - x_origin) / char_width).round().max(0.0) as usize;
        if column > len {
            line.extend(std::iter::repeat(' ').take(column - len));
            len = column;
        } else if len > 0 && !line.ends_with(' ') {
            line.push(' ');
            len += 1;
        }
        line.push_str(&item.text);
        len += item.text.chars().count();
    }

    line
}
