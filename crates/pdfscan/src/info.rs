//! Document metadata and word statistics.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use colored::Colorize;
use pdf::PdfDocument;
use pdfscan_core::stats::{self, WordFrequency};
use prettytable::row;
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
pub struct InfoOutput {
    pub file: String,
    pub file_size: u64,
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub word_count: usize,
    pub vocabulary_size: usize,
    pub top_words: Vec<WordFrequency>,
}

/// Gather metadata and text statistics from an already-open document.
pub fn collect(document: &PdfDocument, path: &Path) -> Result<InfoOutput> {
    let info = document.info();
    let text = document
        .extract_text()
        .map_err(|e| eyre!("Failed to extract text: {}", e))?;

    Ok(InfoOutput {
        file: path.display().to_string(),
        file_size: crate::doc::file_size(path)?,
        page_count: info.page_count,
        title: info.title,
        author: info.author,
        creator: info.creator,
        producer: info.producer,
        word_count: stats::word_count(&text),
        vocabulary_size: stats::vocabulary_size(&text),
        top_words: stats::top_words(&text, stats::TOP_WORDS_DEFAULT),
    })
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    log::info!("info: {}", options.file.display());

    let output = tokio::task::spawn_blocking({
        let path = options.file.clone();
        move || collect(&crate::doc::open_document(&path)?, &path)
    })
    .await??;

    if global.verbose {
        eprintln!("Analyzed {} pages", output.page_count);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_info(&output);
    Ok(())
}

fn print_info(output: &InfoOutput) {
    let is_tty = std::io::stdout().is_terminal();

    if is_tty {
        eprintln!("{}", output.file.bold());
        eprintln!();
    }

    let mut table = new_table();
    table.add_row(row!["Pages", output.page_count]);
    table.add_row(row!["Size", f!("{} bytes", output.file_size)]);
    if let Some(title) = &output.title {
        table.add_row(row!["Title", title]);
    }
    if let Some(author) = &output.author {
        table.add_row(row!["Author", author]);
    }
    if let Some(creator) = &output.creator {
        table.add_row(row!["Creator", creator]);
    }
    if let Some(producer) = &output.producer {
        table.add_row(row!["Producer", producer]);
    }
    table.add_row(row!["Words", output.word_count]);
    table.add_row(row!["Vocabulary", output.vocabulary_size]);
    println!("{}", table);

    if !output.top_words.is_empty() {
        if is_tty {
            eprintln!("{}", "Top words".bold());
        }
        let mut words = new_table();
        for entry in &output.top_words {
            words.add_row(row![entry.word, entry.count]);
        }
        println!("{}", words);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output() -> InfoOutput {
        InfoOutput {
            file: "report.pdf".to_string(),
            file_size: 10_240,
            page_count: 3,
            title: Some("Quarterly Report".to_string()),
            author: None,
            creator: None,
            producer: None,
            word_count: 1200,
            vocabulary_size: 450,
            top_words: vec![WordFrequency {
                word: "revenue".to_string(),
                count: 17,
            }],
        }
    }

    #[test]
    fn json_output_has_expected_fields() {
        let json = serde_json::to_string_pretty(&sample_output()).unwrap();
        assert!(json.contains("\"file\""));
        assert!(json.contains("report.pdf"));
        assert!(json.contains("\"page_count\": 3"));
        assert!(json.contains("\"word_count\": 1200"));
        assert!(json.contains("\"vocabulary_size\": 450"));
        assert!(json.contains("revenue"));
    }

    #[test]
    fn json_output_keeps_absent_metadata_null() {
        let json = serde_json::to_string(&sample_output()).unwrap();
        assert!(json.contains("\"author\":null"));
    }
}
