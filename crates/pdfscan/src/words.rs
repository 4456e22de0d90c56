//! Word frequency ranking.

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

    /// Number of words to show
    #[clap(long, short = 'n', default_value = "10")]
    pub count: usize,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordsOutput {
    pub file: String,
    pub count: usize,
    pub words: Vec<WordFrequency>,
}

/// Rank the most frequent non-stopword words of an already-open document.
pub fn collect(document: &PdfDocument, path: &Path, count: usize) -> Result<WordsOutput> {
    let text = document
        .extract_text()
        .map_err(|e| eyre!("Failed to extract text: {}", e))?;

    Ok(WordsOutput {
        file: path.display().to_string(),
        count,
        words: stats::top_words(&text, count),
    })
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    log::info!("words: {}", options.file.display());

    let output = tokio::task::spawn_blocking({
        let path = options.file.clone();
        let count = options.count;
        move || collect(&crate::doc::open_document(&path)?, &path, count)
    })
    .await??;

    if global.verbose {
        eprintln!("Ranked {} words", output.words.len());
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if output.words.is_empty() {
        println!("No words found.");
        return Ok(());
    }

    if std::io::stdout().is_terminal() {
        eprintln!("{}", f!("Top {} words", output.words.len()).bold());
    }

    let mut table = new_table();
    table.add_row(row!["#", "Word", "Count"]);
    for (rank, entry) in output.words.iter().enumerate() {
        table.add_row(row![rank + 1, entry.word, entry.count]);
    }
    println!("{}", table);

    Ok(())
}
