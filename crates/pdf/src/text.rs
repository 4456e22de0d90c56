//! Raw text extraction, without heading markup.

use crate::parser::backend::PdfBackend;
use crate::parser::layout::{self, TextLine};
use crate::render;
use crate::PdfError;

/// Plain text of a single pre-analyzed page, one extracted line per output
/// line.
pub fn page_text(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain text of the whole document.  Pages are separated by blank lines and
/// the result passes through the same cleanup as the markdown renderer.
pub fn document_text(backend: &dyn PdfBackend) -> Result<String, PdfError> {
    let span_pages = layout::extract_all_pages(backend)?;

    let pages: Vec<String> = span_pages
        .into_iter()
        .map(|(_page, spans)| page_text(&layout::group_spans_into_lines(spans)))
        .filter(|p| !p.is_empty())
        .collect();

    Ok(render::cleanup_text(&pages.join("\n\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, y: f32) -> TextLine {
        TextLine {
            text: text.to_string(),
            x: 72.0,
            y,
            font_size: 12.0,
            heading_level: 0,
        }
    }

    #[test]
    fn page_text_joins_lines() {
        let lines = vec![line("first", 700.0), line("second", 686.0)];
        assert_eq!(page_text(&lines), "first\nsecond");
    }

    #[test]
    fn page_text_drops_blank_lines() {
        let lines = vec![line("first", 700.0), line("   ", 686.0), line("last", 672.0)];
        assert_eq!(page_text(&lines), "first\nlast");
    }

    #[test]
    fn page_text_empty() {
        assert_eq!(page_text(&[]), "");
    }
}
