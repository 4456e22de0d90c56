//! Content-stream interpretation into positioned text, line grouping, and
//! heading classification.
//!
//! The pipeline per page is:
//!
//! ```text
//! operations  ->  TextSpan[]  ->  TextLine[]  (heading levels assigned
//!                 extract         group           document-wide)
//! ```
//!
//! Heading classification is driven purely by font size: a document-wide
//! character-weighted histogram yields the body size, and lines rendered
//! clearly above it are ranked into heading levels 1..=6 by descending size.

use std::collections::HashMap;

use lopdf::content::Operation;

use super::backend::{operand_number, PageId, PdfBackend};
use crate::PdfError;

/// A single run of text at a specific position on the page.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
}

/// A horizontal line of text assembled from spans sharing (approximately)
/// the same Y coordinate.  `heading_level` is 0 for body text.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub heading_level: u8,
}

/// Document-wide font-size statistics.
#[derive(Debug, Clone)]
pub struct FontStatistics {
    /// The most common font size, weighted by character count.
    pub body_size: f32,
    /// Sizes strictly above this value are heading candidates.
    pub heading_threshold: f32,
}

/// Two spans whose Y coordinates differ by less than this share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate character width as a fraction of font size.  We have no glyph
/// metrics, so 0.5 stands in for proportional fonts.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Minimum gap (in points) between adjacent spans before a space is inserted.
const MIN_WORD_GAP: f32 = 1.5;

/// Quantisation bucket width for font sizes (points).
const FONT_SIZE_BUCKET: f32 = 0.5;

/// Candidate sizes must exceed the body size by at least this many points.
const HEADING_SIZE_MARGIN: f32 = 1.5;

/// Lines longer than this are never classified as headings.
const MAX_HEADING_CHARS: usize = 200;

const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource name (the `/F1`-style key).
    font_key: Vec<u8>,
    /// Current font size in text-space units.
    font_size: f32,
    /// Elements [a, b, c, d, tx, ty] of the current text matrix.
    text_matrix: [f32; 6],
    /// Text line matrix, set by BT and updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scale: f32,
    text_rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
            text_rise: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5]
    }

    /// Effective font size accounting for the text matrix vertical scale:
    /// `font_size * sqrt(b^2 + d^2)`.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Translate the text line matrix (used by Td, TD, T*, ', ").
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    /// Width a string would occupy at the current state, spacing included.
    fn advance_for(&self, text: &str) -> f32 {
        let mut dx = 0.0;
        for ch in text.chars() {
            dx += self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale + self.char_spacing;
            if ch == ' ' {
                dx += self.word_spacing;
            }
        }
        dx
    }
}

/// Walk a single page's content stream and produce a flat list of
/// [`TextSpan`]s.
///
/// Implements a simplified PDF text-rendering state machine covering the
/// text operators: `BT`/`ET`, `Tf`, `Tm`, `Td`, `TD`, `T*`, `TL`, `Tc`,
/// `Tw`, `Tz`, `Ts`, `Tj`, `TJ`, `'`, and `"`.  Graphics operators are
/// ignored.
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let ops = backend.page_operations(page_id)?;

    let mut state = TextState::default();
    let mut spans: Vec<TextSpan> = Vec::new();

    for op in &ops {
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            // Font state is kept across text objects; some producers set the
            // font once and reuse it.
            "ET" => {}

            "Tf" => {
                if op.operands.len() >= 2 {
                    if let lopdf::Object::Name(key) = &op.operands[0] {
                        state.font_key = key.clone();
                    }
                    state.font_size = operand_number(&op.operands[1]).unwrap_or(0.0);
                }
            }

            "Tm" => {
                let vals: Vec<f32> = op.operands.iter().take(6).filter_map(operand_number).collect();
                if vals.len() == 6 {
                    state.text_matrix = [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]];
                    state.line_matrix = state.text_matrix;
                }
            }
            "Td" => {
                if let [Some(tx), Some(ty)] = two_numbers(&op.operands) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                // Equivalent to: -ty TL ; tx ty Td
                if let [Some(tx), Some(ty)] = two_numbers(&op.operands) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => {
                state.translate_line(0.0, -state.leading);
            }
            "TL" => {
                if let Some(v) = op.operands.first().and_then(operand_number) {
                    state.leading = v;
                }
            }

            "Tc" => {
                if let Some(v) = op.operands.first().and_then(operand_number) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = op.operands.first().and_then(operand_number) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = op.operands.first().and_then(operand_number) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = op.operands.first().and_then(operand_number) {
                    state.text_rise = v;
                }
            }

            "Tj" => {
                if let Some(obj) = op.operands.first() {
                    show_string(obj, backend, page_id, &mut state, &mut spans);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(obj) = op.operands.first() {
                    show_string(obj, backend, page_id, &mut state, &mut spans);
                }
            }
            "\"" => {
                // aw ac string: set Tw and Tc, move to next line, show.
                if op.operands.len() >= 3 {
                    if let Some(aw) = operand_number(&op.operands[0]) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = operand_number(&op.operands[1]) {
                        state.char_spacing = ac;
                    }
                    state.translate_line(0.0, -state.leading);
                    show_string(&op.operands[2], backend, page_id, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(lopdf::Object::Array(elems)) = op.operands.first() {
                    show_adjusted_array(elems, backend, page_id, &mut state, &mut spans);
                }
            }

            _ => {}
        }
    }

    Ok(spans)
}

fn two_numbers(operands: &[lopdf::Object]) -> [Option<f32>; 2] {
    if operands.len() < 2 {
        return [None, None];
    }
    [operand_number(&operands[0]), operand_number(&operands[1])]
}

/// Decode an operand as a string, emit a [`TextSpan`], and advance the text
/// position.  Shared by `Tj`, `'`, and `"`.
fn show_string(
    obj: &lopdf::Object,
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let lopdf::Object::String(bytes, _) = obj else {
        return;
    };
    let text = backend.decode_text(page_id, &state.font_key, bytes);
    if text.is_empty() {
        return;
    }

    let width = state.advance_for(&text);
    spans.push(TextSpan {
        x: state.x(),
        y: state.y() + state.text_rise,
        width,
        font_size: state.effective_font_size(),
        text,
    });
    state.advance_x(width);
}

/// Process a `TJ` array: strings to render interleaved with numeric kerning
/// adjustments in thousandths of a text-space unit.  Contiguous fragments
/// accumulate into one span; adjustments large enough to look like word gaps
/// insert a space.
fn show_adjusted_array(
    elems: &[lopdf::Object],
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let span_x = state.x();
    let span_y = state.y() + state.text_rise;
    let mut buf = String::new();

    for elem in elems {
        match elem {
            lopdf::Object::String(bytes, _) => {
                let fragment = backend.decode_text(page_id, &state.font_key, bytes);
                let width = state.advance_for(&fragment);
                buf.push_str(&fragment);
                state.advance_x(width);
            }
            other => {
                // Negative adjustment moves the pen right.
                if let Some(adj) = operand_number(other) {
                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                    let gap_threshold =
                        state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;
                    if dx > gap_threshold && !buf.is_empty() && !buf.ends_with(' ') {
                        buf.push(' ');
                    }
                    state.advance_x(dx);
                }
            }
        }
    }

    let text = buf.trim_end();
    if text.is_empty() {
        return;
    }
    spans.push(TextSpan {
        x: span_x,
        y: span_y,
        width: state.x() - span_x,
        font_size: state.effective_font_size(),
        text: text.to_string(),
    });
}

/// Extract text spans from every page, in page order.
pub fn extract_all_pages(backend: &dyn PdfBackend) -> Result<Vec<(u32, Vec<TextSpan>)>, PdfError> {
    let page_map = backend.pages();
    let mut result = Vec::with_capacity(page_map.len());
    for (&page_num, &page_id) in &page_map {
        result.push((page_num, extract_page_spans(backend, page_id)?));
    }
    Ok(result)
}

fn bucket(size: f32) -> f32 {
    (size / FONT_SIZE_BUCKET).round() * FONT_SIZE_BUCKET
}

/// Build document-wide font-size statistics from all extracted spans.
///
/// The histogram counts characters (not spans) per quantised size, so a few
/// large words cannot outvote pages of body text.  Falls back to a 12pt body
/// when no sized text exists.
pub fn font_statistics(pages: &[(u32, Vec<TextSpan>)]) -> FontStatistics {
    let mut histogram: HashMap<i32, usize> = HashMap::new();

    for (_page, spans) in pages {
        for span in spans {
            if span.font_size <= 0.0 {
                continue;
            }
            let key = (bucket(span.font_size) * 100.0).round() as i32;
            *histogram.entry(key).or_insert(0) += span.text.chars().count();
        }
    }

    let body_size = histogram
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(k, _)| k as f32 / 100.0)
        .unwrap_or(12.0);

    FontStatistics {
        body_size,
        heading_threshold: body_size + HEADING_SIZE_MARGIN,
    }
}

/// Group a page's spans into [`TextLine`]s.
///
/// Spans within [`Y_TOLERANCE`] points of each other share a line.  Within a
/// line, spans are ordered left to right and joined, inserting a space when
/// the horizontal gap between them is at least [`MIN_WORD_GAP`] points.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return Vec::new();
    }

    // Top of page first, then left to right.
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut group: Vec<TextSpan> = vec![spans.remove(0)];
    let mut group_y = group[0].y;

    for span in spans {
        if (span.y - group_y).abs() <= Y_TOLERANCE {
            group.push(span);
        } else {
            lines.push(assemble_line(std::mem::take(&mut group)));
            group_y = span.y;
            group.push(span);
        }
    }
    lines.push(assemble_line(group));

    lines
}

/// Join spans known to share a Y coordinate into a single [`TextLine`].
fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let x = spans.first().map(|s| s.x).unwrap_or(0.0);
    let y = spans.first().map(|s| s.y).unwrap_or(0.0);
    let font_size = dominant_font_size(&spans);

    let mut text = String::new();
    let mut end_x = x;
    for span in &spans {
        if !text.is_empty() && span.x - end_x >= MIN_WORD_GAP && !text.ends_with(' ') {
            text.push(' ');
        }
        text.push_str(&span.text);
        end_x = span.x + span.width;
    }

    TextLine {
        text,
        x,
        y,
        font_size,
        heading_level: 0,
    }
}

/// The font size covering the most characters across the spans.
fn dominant_font_size(spans: &[TextSpan]) -> f32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for s in spans {
        let key = (s.font_size * 100.0).round() as i32;
        *counts.entry(key).or_insert(0) += s.text.chars().count();
    }
    counts
        .into_iter()
        .max_by_key(|(_, c)| *c)
        .map(|(k, _)| k as f32 / 100.0)
        .unwrap_or(0.0)
}

/// Assign heading levels to lines, document-wide.
///
/// A line is a heading candidate when its dominant size exceeds the heading
/// threshold and it is at most [`MAX_HEADING_CHARS`] characters long.
/// Distinct candidate sizes are ranked descending; the largest maps to level
/// 1, down to at most level 6.  Everything else stays body text.
pub fn assign_heading_levels(pages: &mut [(u32, Vec<TextLine>)], stats: &FontStatistics) {
    let mut sizes: Vec<f32> = Vec::new();
    for (_page, lines) in pages.iter() {
        for line in lines {
            if is_heading_candidate(line, stats) {
                let b = bucket(line.font_size);
                if !sizes.iter().any(|&s| (s - b).abs() < FONT_SIZE_BUCKET) {
                    sizes.push(b);
                }
            }
        }
    }

    sizes.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    sizes.truncate(6);

    for (_page, lines) in pages.iter_mut() {
        for line in lines.iter_mut() {
            if is_heading_candidate(line, stats) {
                let b = bucket(line.font_size);
                if let Some(pos) = sizes.iter().position(|&s| (s - b).abs() < FONT_SIZE_BUCKET) {
                    line.heading_level = pos as u8 + 1;
                }
            }
        }
    }
}

fn is_heading_candidate(line: &TextLine, stats: &FontStatistics) -> bool {
    line.font_size > stats.heading_threshold && line.text.chars().count() <= MAX_HEADING_CHARS
}

/// Run the full layout pipeline: extract spans from every page, compute
/// document-wide statistics, group into lines, and classify headings.
pub fn analyze_pages(backend: &dyn PdfBackend) -> Result<Vec<(u32, Vec<TextLine>)>, PdfError> {
    let span_pages = extract_all_pages(backend)?;
    let stats = font_statistics(&span_pages);

    let mut pages: Vec<(u32, Vec<TextLine>)> = span_pages
        .into_iter()
        .map(|(page, spans)| (page, group_spans_into_lines(spans)))
        .collect();

    assign_heading_levels(&mut pages, &stats);
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lopdf::content::Operation;
    use lopdf::{Object, StringFormat};

    use super::super::backend::decode_text_simple;
    use super::*;

    fn span(text: &str, x: f32, y: f32, font_size: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            y,
            width: text.chars().count() as f32 * font_size * APPROX_CHAR_WIDTH_RATIO,
            font_size,
        }
    }

    fn line(text: &str, y: f32, font_size: f32) -> TextLine {
        TextLine {
            text: text.to_string(),
            x: 0.0,
            y,
            font_size,
            heading_level: 0,
        }
    }

    /// Backend serving a canned operation list for a single page.
    struct FixtureBackend {
        ops: Vec<Operation>,
    }

    impl PdfBackend for FixtureBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            let mut m = BTreeMap::new();
            m.insert(1, (1, 0));
            m
        }

        fn page_operations(&self, _page: PageId) -> Result<Vec<Operation>, PdfError> {
            Ok(self.ops.clone())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }
    }

    fn lit(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    // -- span extraction ----------------------------------------------------

    #[test]
    fn extract_spans_basic_tj() {
        let backend = FixtureBackend {
            ops: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(24)]),
                Operation::new(
                    "Tm",
                    vec![
                        Object::Integer(1),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(1),
                        Object::Integer(72),
                        Object::Integer(700),
                    ],
                ),
                Operation::new("Tj", vec![lit("Title")]),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = extract_page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Title");
        assert!((spans[0].x - 72.0).abs() < 0.01);
        assert!((spans[0].y - 700.0).abs() < 0.01);
        assert!((spans[0].font_size - 24.0).abs() < 0.01);
    }

    #[test]
    fn extract_spans_td_moves_lines() {
        let backend = FixtureBackend {
            ops: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new("Tj", vec![lit("First")]),
                Operation::new("Td", vec![Object::Integer(0), Object::Integer(-14)]),
                Operation::new("Tj", vec![lit("Second")]),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = extract_page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans.len(), 2);
        assert!((spans[0].y - 700.0).abs() < 0.01);
        assert!((spans[1].y - 686.0).abs() < 0.01);
    }

    #[test]
    fn extract_spans_tl_and_tstar() {
        let backend = FixtureBackend {
            ops: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
                Operation::new("TL", vec![Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(0), Object::Integer(500)]),
                Operation::new("Tj", vec![lit("a")]),
                Operation::new("T*", vec![]),
                Operation::new("Tj", vec![lit("b")]),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = extract_page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans.len(), 2);
        assert!((spans[0].y - spans[1].y - 12.0).abs() < 0.01);
    }

    #[test]
    fn extract_spans_tj_array_inserts_word_gap_space() {
        // -500/1000 * 12pt = 6pt rightward jump, well above the gap threshold.
        let backend = FixtureBackend {
            ops: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new(
                    "TJ",
                    vec![Object::Array(vec![
                        lit("Hello"),
                        Object::Integer(-500),
                        lit("world"),
                    ])],
                ),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = extract_page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Hello world");
    }

    #[test]
    fn extract_spans_tj_array_small_kern_no_space() {
        let backend = FixtureBackend {
            ops: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new(
                    "TJ",
                    vec![Object::Array(vec![
                        lit("ker"),
                        Object::Integer(-20),
                        lit("ning"),
                    ])],
                ),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = extract_page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "kerning");
    }

    #[test]
    fn extract_spans_quote_advances_line() {
        let backend = FixtureBackend {
            ops: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("TL", vec![Object::Integer(14)]),
                Operation::new("Td", vec![Object::Integer(0), Object::Integer(700)]),
                Operation::new("'", vec![lit("next line")]),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = extract_page_spans(&backend, (1, 0)).unwrap();
        assert_eq!(spans.len(), 1);
        assert!((spans[0].y - 686.0).abs() < 0.01);
    }

    #[test]
    fn extract_spans_tm_scales_font_size() {
        // 2x vertical scale doubles the effective size.
        let backend = FixtureBackend {
            ops: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new(
                    "Tm",
                    vec![
                        Object::Integer(2),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(2),
                        Object::Integer(72),
                        Object::Integer(700),
                    ],
                ),
                Operation::new("Tj", vec![lit("big")]),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = extract_page_spans(&backend, (1, 0)).unwrap();
        assert!((spans[0].font_size - 24.0).abs() < 0.01);
    }

    #[test]
    fn extract_spans_ignores_graphics_operators() {
        let backend = FixtureBackend {
            ops: vec![
                Operation::new("q", vec![]),
                Operation::new("re", vec![Object::Integer(0), Object::Integer(0), Object::Integer(10), Object::Integer(10)]),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ],
        };

        let spans = extract_page_spans(&backend, (1, 0)).unwrap();
        assert!(spans.is_empty());
    }

    // -- font statistics ----------------------------------------------------

    #[test]
    fn statistics_body_size_is_char_weighted_mode() {
        let pages = vec![(
            1,
            vec![
                span(&"a".repeat(500), 0.0, 700.0, 12.0),
                span(&"b".repeat(40), 0.0, 680.0, 18.0),
                span(&"c".repeat(8), 0.0, 660.0, 24.0),
            ],
        )];

        let stats = font_statistics(&pages);
        assert!((stats.body_size - 12.0).abs() < FONT_SIZE_BUCKET);
        assert!((stats.heading_threshold - 13.5).abs() < FONT_SIZE_BUCKET);
    }

    #[test]
    fn statistics_fallback_without_spans() {
        let stats = font_statistics(&[]);
        assert!((stats.body_size - 12.0).abs() < 0.01);
    }

    #[test]
    fn statistics_ignore_zero_sized_text() {
        let pages = vec![(
            1,
            vec![
                span("visible", 0.0, 700.0, 10.0),
                span("phantom", 0.0, 680.0, 0.0),
            ],
        )];

        let stats = font_statistics(&pages);
        assert!((stats.body_size - 10.0).abs() < 0.01);
    }

    // -- line grouping ------------------------------------------------------

    #[test]
    fn group_same_y_single_line() {
        let lines = group_spans_into_lines(vec![
            span("Hello", 0.0, 700.0, 12.0),
            span("world", 40.0, 700.0, 12.0),
        ]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
    }

    #[test]
    fn group_within_tolerance_merges() {
        let lines = group_spans_into_lines(vec![
            span("A", 0.0, 700.0, 12.0),
            span("B", 50.0, 700.5, 12.0),
        ]);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn group_outside_tolerance_splits() {
        let lines = group_spans_into_lines(vec![
            span("A", 0.0, 700.0, 12.0),
            span("B", 50.0, 697.5, 12.0),
        ]);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn group_orders_top_to_bottom() {
        let lines = group_spans_into_lines(vec![
            span("bottom", 0.0, 600.0, 12.0),
            span("top", 0.0, 700.0, 12.0),
            span("middle", 0.0, 650.0, 12.0),
        ]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "top");
        assert_eq!(lines[1].text, "middle");
        assert_eq!(lines[2].text, "bottom");
    }

    #[test]
    fn group_sorts_spans_left_to_right() {
        let lines = group_spans_into_lines(vec![
            span("world", 100.0, 700.0, 12.0),
            span("Hello", 0.0, 700.0, 12.0),
        ]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
    }

    #[test]
    fn group_adjacent_spans_concatenate_without_space() {
        // Second span starts exactly where the first ends.
        let first = span("over", 0.0, 700.0, 12.0);
        let end = first.x + first.width;
        let lines = group_spans_into_lines(vec![first, span("lap", end, 700.0, 12.0)]);
        assert_eq!(lines[0].text, "overlap");
    }

    #[test]
    fn group_empty_input() {
        assert!(group_spans_into_lines(vec![]).is_empty());
    }

    #[test]
    fn dominant_size_weighted_by_chars() {
        let spans = vec![
            span("lots of body text here", 0.0, 700.0, 11.0),
            span("X", 200.0, 700.0, 30.0),
        ];
        assert!((dominant_font_size(&spans) - 11.0).abs() < 0.01);
    }

    // -- heading classification ---------------------------------------------

    #[test]
    fn headings_ranked_largest_first() {
        let stats = FontStatistics {
            body_size: 12.0,
            heading_threshold: 13.5,
        };
        let mut pages = vec![(
            1,
            vec![
                line("Title", 750.0, 24.0),
                line("Subtitle", 720.0, 18.0),
                line("Body text here.", 700.0, 12.0),
            ],
        )];

        assign_heading_levels(&mut pages, &stats);

        let lines = &pages[0].1;
        assert_eq!(lines[0].heading_level, 1);
        assert_eq!(lines[1].heading_level, 2);
        assert_eq!(lines[2].heading_level, 0);
    }

    #[test]
    fn headings_same_size_same_level() {
        let stats = FontStatistics {
            body_size: 12.0,
            heading_threshold: 13.5,
        };
        let mut pages = vec![(
            1,
            vec![line("Section A", 750.0, 18.0), line("Section B", 700.0, 18.0)],
        )];

        assign_heading_levels(&mut pages, &stats);
        assert_eq!(pages[0].1[0].heading_level, 1);
        assert_eq!(pages[0].1[1].heading_level, 1);
    }

    #[test]
    fn headings_long_lines_stay_body() {
        let stats = FontStatistics {
            body_size: 12.0,
            heading_threshold: 13.5,
        };
        let long = "A".repeat(MAX_HEADING_CHARS + 1);
        let mut pages = vec![(1, vec![line(&long, 750.0, 18.0)])];

        assign_heading_levels(&mut pages, &stats);
        assert_eq!(pages[0].1[0].heading_level, 0);
    }

    #[test]
    fn headings_capped_at_six_levels() {
        let stats = FontStatistics {
            body_size: 10.0,
            heading_threshold: 11.5,
        };
        let sizes = [30.0, 26.0, 22.0, 18.0, 16.0, 14.0, 12.0];
        let mut pages = vec![(
            1,
            vec![],
        )];
        for (i, &sz) in sizes.iter().enumerate() {
            pages[0].1.push(line(&format!("H{}", i), 700.0 - i as f32 * 20.0, sz));
        }

        assign_heading_levels(&mut pages, &stats);

        for (i, l) in pages[0].1[..6].iter().enumerate() {
            assert_eq!(l.heading_level, i as u8 + 1);
        }
        // The 7th distinct size falls off the end of the ranking.
        assert_eq!(pages[0].1[6].heading_level, 0);
    }

    #[test]
    fn headings_ranked_across_pages() {
        let stats = FontStatistics {
            body_size: 12.0,
            heading_threshold: 13.5,
        };
        let mut pages = vec![
            (1, vec![line("Chapter", 750.0, 20.0)]),
            (2, vec![line("Appendix", 750.0, 24.0)]),
        ];

        assign_heading_levels(&mut pages, &stats);
        // The 24pt line on page 2 outranks the 20pt line on page 1.
        assert_eq!(pages[1].1[0].heading_level, 1);
        assert_eq!(pages[0].1[0].heading_level, 2);
    }

    // -- full pipeline ------------------------------------------------------

    #[test]
    fn analyze_pages_classifies_title() {
        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(24)]),
            Operation::new("Td", vec![Object::Integer(72), Object::Integer(750)]),
            Operation::new("Tj", vec![lit("Document Title")]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
            Operation::new("Td", vec![Object::Integer(0), Object::Integer(-50)]),
        ];
        for _ in 0..10 {
            ops.push(Operation::new(
                "Tj",
                vec![lit("Plenty of body text to anchor the statistics.")],
            ));
            ops.push(Operation::new(
                "Td",
                vec![Object::Integer(0), Object::Integer(-14)],
            ));
        }
        ops.push(Operation::new("ET", vec![]));

        let backend = FixtureBackend { ops };
        let pages = analyze_pages(&backend).unwrap();
        assert_eq!(pages.len(), 1);

        let lines = &pages[0].1;
        assert_eq!(lines[0].text, "Document Title");
        assert_eq!(lines[0].heading_level, 1);
        assert!(lines[1..].iter().all(|l| l.heading_level == 0));
    }
}
