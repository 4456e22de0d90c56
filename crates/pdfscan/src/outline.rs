//! Heading outline reconstruction.

use std::path::{Path, PathBuf};

use pdf::PdfDocument;
use pdfscan_core::outline::{build_outline, Outline, NO_HEADERS_MESSAGE};
use serde::Serialize;

use crate::prelude::{eprintln, println, *};

#[derive(Debug, Clone, clap::Parser)]
pub struct Options {
    /// Path to the PDF document
    pub file: PathBuf,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlineOutput {
    pub file: String,
    pub outline: Option<Outline>,
}

impl OutlineOutput {
    /// Plain-text rendering of the outline.
    pub fn text(&self) -> String {
        match &self.outline {
            Some(outline) => outline.to_text(),
            None => NO_HEADERS_MESSAGE.to_string(),
        }
    }
}

/// Reconstruct the heading outline from an already-open document.
pub fn collect(document: &PdfDocument, path: &Path) -> Result<OutlineOutput> {
    let markdown = document
        .render_markdown()
        .map_err(|e| eyre!("Failed to analyze layout: {}", e))?;

    Ok(OutlineOutput {
        file: path.display().to_string(),
        outline: build_outline(&markdown),
    })
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    log::info!("outline: {}", options.file.display());

    let output = tokio::task::spawn_blocking({
        let path = options.file.clone();
        move || collect(&crate::doc::open_document(&path)?, &path)
    })
    .await??;

    if global.verbose {
        let entries = output.outline.as_ref().map_or(0, |o| o.entries.len());
        eprintln!("Found {} headings", entries);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", output.text());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_falls_back_when_no_headings() {
        let output = OutlineOutput {
            file: "empty.pdf".to_string(),
            outline: None,
        };
        assert_eq!(output.text(), NO_HEADERS_MESSAGE);
    }

    #[test]
    fn text_renders_title_and_numbered_entries() {
        let output = OutlineOutput {
            file: "doc.pdf".to_string(),
            outline: build_outline("# Intro\n\nbody\n\n## Scope\n\n## Results"),
        };
        let text = output.text();
        assert!(text.contains("Title: Intro"));
        assert!(text.contains("1. Scope"));
        assert!(text.contains("2. Results"));
    }

    #[test]
    fn json_keeps_missing_outline_null() {
        let output = OutlineOutput {
            file: "empty.pdf".to_string(),
            outline: None,
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"outline\":null"));
    }
}
