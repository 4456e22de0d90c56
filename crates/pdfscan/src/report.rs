//! Combined report: metadata, statistics, outline, and an optional summary.

use std::io::IsTerminal;
use std::path::PathBuf;

use colored::Colorize;
use pdfscan_core::chunk::DEFAULT_CHUNK_CHARS;
use pdfscan_core::outline::NO_HEADERS_MESSAGE;
use prettytable::row;
use serde::Serialize;

use crate::info::InfoOutput;
use crate::outline::OutlineOutput;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, Clone, clap::Parser)]
pub struct Options {
    /// Path to the PDF document
    pub file: PathBuf,

    /// Skip the LLM summary section
    #[clap(long)]
    pub no_summary: bool,

    /// Base URL of the Ollama server
    #[clap(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model to prompt for the summary
    #[clap(long, env = "PDFSCAN_MODEL", default_value = "qwen2.5:3b")]
    pub model: String,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    #[serde(flatten)]
    pub info: InfoOutput,
    pub outline: OutlineOutput,
    pub summary: Option<String>,
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    log::info!("report: {}", options.file.display());

    let (info, outline, text) = tokio::task::spawn_blocking({
        let path = options.file.clone();
        move || -> Result<(InfoOutput, OutlineOutput, String)> {
            let document = crate::doc::open_document(&path)?;
            let info = crate::info::collect(&document, &path)?;
            let outline = crate::outline::collect(&document, &path)?;
            let text = document
                .extract_text()
                .map_err(|e| eyre!("Failed to extract text: {}", e))?;
            Ok((info, outline, text))
        }
    })
    .await??;

    let summary = if options.no_summary {
        None
    } else {
        let (chunks, summary) = crate::summarize::summarize_text(
            &text,
            &options.ollama_url,
            &options.model,
            DEFAULT_CHUNK_CHARS,
        )
        .await?;
        if global.verbose {
            eprintln!("Summarized {} chunks with {}", chunks, options.model);
        }
        Some(summary)
    };

    let output = ReportOutput {
        info,
        outline,
        summary,
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_report(&output);
    Ok(())
}

fn section(title: &str) {
    if std::io::stdout().is_terminal() {
        eprintln!("{}", title.bold());
    } else {
        println!("## {}", title);
    }
}

fn print_report(output: &ReportOutput) {
    section("Document");
    let mut table = new_table();
    table.add_row(row!["File", output.info.file]);
    table.add_row(row!["Pages", output.info.page_count]);
    table.add_row(row!["Size", f!("{} bytes", output.info.file_size)]);
    if let Some(title) = &output.info.title {
        table.add_row(row!["Title", title]);
    }
    if let Some(author) = &output.info.author {
        table.add_row(row!["Author", author]);
    }
    table.add_row(row!["Words", output.info.word_count]);
    table.add_row(row!["Vocabulary", output.info.vocabulary_size]);
    println!("{}", table);

    if !output.info.top_words.is_empty() {
        section("Top words");
        let mut words = new_table();
        for entry in &output.info.top_words {
            words.add_row(row![entry.word, entry.count]);
        }
        println!("{}", words);
    }

    section("Outline");
    match &output.outline.outline {
        Some(outline) => println!("{}", outline.to_text().trim_start()),
        None => println!("{}", NO_HEADERS_MESSAGE),
    }

    if let Some(summary) = &output.summary {
        println!();
        section("Summary");
        println!("{}", summary);
    }
}
