//! Positioned text spans from page content streams.
//!
//! Only the text-showing and text-positioning operators are interpreted.
//! That is enough to know what was drawn, in which order, and how large.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};

use super::source::PdfSource;

/// A run of text drawn with one font at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The decoded text
    pub text: String,
    /// X position of the text origin
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Rendered font size in points (font size × text and graphics scale)
    pub font_size: f32,
}

impl TextSpan {
    /// Create a new text span.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size,
        }
    }
}

/// Reads text spans from the pages of a [`PdfSource`].
pub struct SpanExtractor<'a> {
    source: &'a PdfSource,
}

impl<'a> SpanExtractor<'a> {
    /// Create an extractor over an opened document.
    pub fn new(source: &'a PdfSource) -> Self {
        Self { source }
    }

    /// Spans of a 1-based page, in content-stream order.
    pub fn page_spans(&self, page_num: u32) -> Result<Vec<TextSpan>> {
        let doc = self.source.raw_doc();
        let page_id = self.source.page_id(page_num)?;

        let fonts = doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let content = doc
            .get_page_content(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        parse_content_stream(doc, &content, &fonts)
    }
}

/// Interpret a decoded content stream and collect its text spans.
fn parse_content_stream(
    doc: &LopdfDocument,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
) -> Result<Vec<TextSpan>> {
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut state = TextState::default();
    let mut graphics_scale: Vec<f32> = vec![1.0];
    let mut in_text_block = false;

    for op in content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => {
                let current = graphics_scale.last().copied().unwrap_or(1.0);
                graphics_scale.push(current);
            }
            "Q" => {
                if graphics_scale.len() > 1 {
                    graphics_scale.pop();
                }
            }
            "cm" => {
                if operands.len() >= 4 {
                    let a = get_number(&operands[0]).unwrap_or(1.0);
                    let c = get_number(&operands[2]).unwrap_or(0.0);
                    if let Some(scale) = graphics_scale.last_mut() {
                        *scale *= (a * a + c * c).sqrt();
                    }
                }
            }
            "BT" => {
                in_text_block = true;
                state.matrix = TextMatrix::default();
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Object::Name(name) = &operands[0] {
                        state.font = name.clone();
                    }
                    state.font_size = get_number(&operands[1]).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(get_number) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    state.matrix.translate(tx, ty);
                }
            }
            "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    state.leading = -ty;
                    state.matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let v: Vec<f32> = operands
                        .iter()
                        .take(6)
                        .map(|o| get_number(o).unwrap_or(0.0))
                        .collect();
                    state.matrix.set(v[0], v[1], v[2], v[3], v[4], v[5]);
                }
            }
            "T*" => state.matrix.translate(0.0, -state.leading),
            "Tj" | "TJ" | "'" | "\"" => {
                if !in_text_block {
                    continue;
                }
                if op.operator == "'" || op.operator == "\"" {
                    state.matrix.translate(0.0, -state.leading);
                }

                let text_operand = match op.operator.as_str() {
                    "\"" => operands.get(2),
                    _ => operands.first(),
                };
                let Some(text_operand) = text_operand else {
                    continue;
                };

                let font = fonts.get(&state.font).copied();
                let text = show_text(doc, font, text_operand);
                if text.trim().is_empty() {
                    continue;
                }

                let (x, y) = state.matrix.position();
                let scale = graphics_scale.last().copied().unwrap_or(1.0);
                spans.push(TextSpan::new(
                    text,
                    x,
                    y,
                    state.font_size * state.matrix.scale() * scale,
                ));
            }
            _ => {}
        }
    }

    Ok(spans)
}

/// Decode the operand of a text-showing operator.
///
/// For `TJ` arrays, a large negative kerning adjustment is read as a word
/// space, which is how many generators encode inter-word gaps.
fn show_text(doc: &LopdfDocument, font: Option<&Dictionary>, operand: &Object) -> String {
    const SPACE_ADJUSTMENT: f32 = 200.0;

    let encoding = font.and_then(|f| f.get_font_encoding(doc).ok());
    let decode = |bytes: &[u8]| match encoding {
        Some(ref enc) => LopdfDocument::decode_text(enc, bytes).unwrap_or_default(),
        None => decode_text_simple(bytes),
    };

    match operand {
        Object::String(bytes, _) => decode(bytes),
        Object::Array(items) => {
            let mut combined = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => combined.push_str(&decode(bytes)),
                    other => {
                        let adjustment = -get_number(other).unwrap_or(0.0);
                        if adjustment > SPACE_ADJUSTMENT
                            && !combined.is_empty()
                            && !combined.ends_with(' ')
                        {
                            combined.push(' ');
                        }
                    }
                }
            }
            combined
        }
        _ => String::new(),
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
    matrix: TextMatrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 12.0,
            leading: 12.0,
            matrix: TextMatrix::default(),
        }
    }
}

/// Text line matrix; only the parts that affect position and size.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        *self = Self { a, b, c, d, e, f };
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Fallback decoding when a font has no usable encoding.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_of(content: &str) -> Vec<TextSpan> {
        let doc = LopdfDocument::with_version("1.5");
        let fonts = BTreeMap::new();
        parse_content_stream(&doc, content.as_bytes(), &fonts).unwrap()
    }

    #[test]
    fn test_font_size_and_position() {
        let spans = spans_of(
            "BT /F1 24 Tf 72 700 Td (Big Title) Tj ET \
             BT /F1 10 Tf 72 600 Td (body) Tj ET",
        );
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Big Title");
        assert_eq!(spans[0].font_size, 24.0);
        assert_eq!((spans[0].x, spans[0].y), (72.0, 700.0));
        assert_eq!(spans[1].font_size, 10.0);
    }

    #[test]
    fn test_text_matrix_scales_font_size() {
        let spans = spans_of("BT /F1 1 Tf 18 0 0 18 50 500 Tm (Scaled) Tj ET");
        assert_eq!(spans[0].font_size, 18.0);
        assert_eq!((spans[0].x, spans[0].y), (50.0, 500.0));
    }

    #[test]
    fn test_cm_scales_font_size() {
        let spans =
            spans_of("q 2 0 0 2 0 0 cm BT /F1 9 Tf (Doubled) Tj ET Q BT /F1 9 Tf (Plain) Tj ET");
        assert_eq!(spans[0].font_size, 18.0);
        assert_eq!(spans[1].font_size, 9.0);
    }

    #[test]
    fn test_tj_array_spacing() {
        let spans = spans_of("BT /F1 12 Tf [(Hello) -300 (World) -20 (!)] TJ ET");
        assert_eq!(spans[0].text, "Hello World!");
    }

    #[test]
    fn test_next_line_operators_use_leading() {
        let spans = spans_of("BT /F1 10 Tf 14 TL 0 100 Td (one) Tj T* (two) Tj (three) ' ET");
        let ys: Vec<f32> = spans.iter().map(|s| s.y).collect();
        assert_eq!(ys, vec![100.0, 86.0, 72.0]);
    }

    #[test]
    fn test_text_outside_block_ignored() {
        assert!(spans_of("(stray) Tj").is_empty());
    }

    #[test]
    fn test_decode_text_simple() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
        assert_eq!(decode_text_simple(&[0x48, 0xE9]), "Hé");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x48]), "H");
    }
}
