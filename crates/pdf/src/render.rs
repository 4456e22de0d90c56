//! Markdown rendering of an analyzed document.
//!
//! Heading lines are emitted with a run of `#` matching their detected
//! level; body lines pass through after text cleanup, with blank lines
//! marking paragraph and page boundaries.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::parser::backend::PdfBackend;
use crate::parser::layout::{self, TextLine};
use crate::PdfError;

/// Vertical gap, in multiples of the font size, that separates paragraphs.
const PARAGRAPH_GAP_FACTOR: f32 = 1.6;

/// Typographic ligatures expanded to their letter sequences.  NFC leaves
/// these alone, so they are replaced explicitly.
const LIGATURES: &[(&str, &str)] = &[
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
];

/// Render the whole document as markdown-with-headings text.
pub fn render_markdown(backend: &dyn PdfBackend) -> Result<String, PdfError> {
    let pages = layout::analyze_pages(backend)?;
    Ok(cleanup_text(&render_pages(&pages)))
}

/// Render pre-analyzed pages.  Pages are separated by blank lines.
pub fn render_pages(pages: &[(u32, Vec<TextLine>)]) -> String {
    let rendered: Vec<String> = pages
        .iter()
        .map(|(_page, lines)| render_page(lines))
        .filter(|p| !p.is_empty())
        .collect();
    rendered.join("\n\n")
}

fn render_page(lines: &[TextLine]) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut prev: Option<&TextLine> = None;

    for line in lines {
        let text = line.text.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(p) = prev {
            let gap = (p.y - line.y).abs();
            let paragraph_break = gap > p.font_size.max(line.font_size) * PARAGRAPH_GAP_FACTOR;
            if line.heading_level > 0 || p.heading_level > 0 || paragraph_break {
                out.push(String::new());
            }
        }

        if line.heading_level > 0 {
            out.push(format!(
                "{} {}",
                "#".repeat(line.heading_level as usize),
                text
            ));
        } else {
            out.push(text.to_string());
        }
        prev = Some(line);
    }

    out.join("\n")
}

/// Normalize extracted text for presentation.
///
/// - NFC normalization, with typographic ligatures expanded.
/// - Replacement characters (U+FFFD) removed.
/// - Words hyphenated across a line break rejoined.
/// - Runs of spaces and tabs collapsed to one space.
pub fn cleanup_text(text: &str) -> String {
    let mut s: String = text.nfc().collect();

    for (ligature, replacement) in LIGATURES {
        if s.contains(ligature) {
            s = s.replace(ligature, replacement);
        }
    }

    s = s.replace('\u{FFFD}', "");

    static HYPHENATION: OnceLock<Regex> = OnceLock::new();
    let hyphenation = HYPHENATION.get_or_init(|| {
        Regex::new(r"([A-Za-z])-\n[ \t]*([a-z])").expect("valid hyphenation regex")
    });
    s = hyphenation.replace_all(&s, "$1$2").into_owned();

    static SPACE_RUNS: OnceLock<Regex> = OnceLock::new();
    let space_runs =
        SPACE_RUNS.get_or_init(|| Regex::new(r"[ \t]{2,}").expect("valid whitespace regex"));
    s = space_runs.replace_all(&s, " ").into_owned();

    s
}
