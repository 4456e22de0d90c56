//! Prompt assembly for the summarization agent.
//!
//! The map-reduce shape lives in the shell: each chunk is summarized with
//! [`build_chunk_prompt`], and when more than one chunk summary exists they
//! are consolidated with [`build_consolidation_prompt`]. This module only
//! assembles strings.

/// System preamble for the summarization agent.
pub const SYSTEM_PREAMBLE: &str = "\
You are a document summarizer. You receive extracted PDF text and produce a
concise, faithful summary.

Rules:
- Summarize only what the text states. Do not add outside knowledge.
- Preserve key terms, names, and figures from the source.
- Write flowing prose, not bullet fragments, unless the source is a list.
- Do not mention that you are summarizing or refer to 'the text'.";

/// Build the prompt for summarizing a single chunk of document text.
pub fn build_chunk_prompt(chunk: &str) -> String {
    format!(
        "Summarize the following document excerpt in a short paragraph:\n\n{}",
        chunk.trim()
    )
}

/// Build the prompt that consolidates per-chunk summaries into one summary.
pub fn build_consolidation_prompt(summaries: &[String]) -> String {
    let mut parts = Vec::with_capacity(summaries.len() + 1);
    for (i, summary) in summaries.iter().enumerate() {
        parts.push(format!("Part {}:\n{}", i + 1, summary.trim()));
    }
    parts.push(
        "Combine the parts above into a single coherent summary of the whole \
         document. Remove repetition and keep the part order."
            .to_string(),
    );
    parts.join("\n\n")
}
