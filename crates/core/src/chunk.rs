//! Paragraph-aware text chunking for the summarization pipeline.
//!
//! Chunks are measured in characters, not model tokens: the budget only has
//! to keep each model call comfortably inside the context window, and a
//! character budget keeps this module free of any tokenizer dependency.

/// Default chunk budget in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 8_000;

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Splits on blank-line paragraph boundaries first, packing whole paragraphs
/// greedily. A single paragraph larger than the budget is hard-split on the
/// last whitespace inside the budget (or mid-word if there is none).
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if paragraph.chars().count() > max_chars {
            flush(&mut chunks, &mut current);
            chunks.extend(split_oversized(paragraph, max_chars));
            continue;
        }

        let needed = paragraph.chars().count()
            + if current.is_empty() { 0 } else { 2 };
        if current.chars().count() + needed > max_chars {
            flush(&mut chunks, &mut current);
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    flush(&mut chunks, &mut current);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
}

/// Hard-split one oversized paragraph, preferring whitespace boundaries.
fn split_oversized(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = paragraph;

    while rest.chars().count() > max_chars {
        let cut_bytes = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..cut_bytes];
        let split_at = window.rfind(char::is_whitespace).unwrap_or(cut_bytes);
        let (head, tail) = rest.split_at(split_at.max(1));
        pieces.push(head.trim().to_string());
        rest = tail.trim_start();
    }

    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}
