//! LLM summarization via a local Ollama server.

use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pdfscan_core::chunk::{chunk_text, DEFAULT_CHUNK_CHARS};
use pdfscan_core::summarize::{build_chunk_prompt, build_consolidation_prompt, SYSTEM_PREAMBLE};
use rig::client::{CompletionClient, Nothing};
use rig::completion::Prompt;
use rig::providers::ollama;
use serde::Serialize;

use crate::prelude::{eprintln, println, *};

#[derive(Debug, Clone, clap::Parser)]
pub struct Options {
    /// Path to the PDF document
    pub file: PathBuf,

    /// Base URL of the Ollama server
    #[clap(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model to prompt
    #[clap(long, env = "PDFSCAN_MODEL", default_value = "qwen2.5:3b")]
    pub model: String,

    /// Maximum characters per chunk sent to the model
    #[clap(long, default_value_t = DEFAULT_CHUNK_CHARS)]
    pub chunk_chars: usize,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeOutput {
    pub file: String,
    pub model: String,
    pub chunks: usize,
    pub summary: String,
}

fn create_client(ollama_url: &str) -> Result<ollama::Client> {
    ollama::Client::builder()
        .api_key(Nothing)
        .base_url(ollama_url)
        .build()
        .map_err(|e| eyre!("Failed to create Ollama client: {}", e))
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_message(message);
    bar
}

/// Summarize `text` chunk by chunk, then consolidate the partial summaries
/// into a single one. Single-chunk documents skip the consolidation round.
pub async fn summarize_text(
    text: &str,
    ollama_url: &str,
    model: &str,
    chunk_chars: usize,
) -> Result<(usize, String)> {
    let chunks = chunk_text(text, chunk_chars);
    if chunks.is_empty() {
        return Err(eyre!("Document contains no extractable text"));
    }

    let client = create_client(ollama_url)?;
    let agent = client.agent(model).preamble(SYSTEM_PREAMBLE).build();
    let total = chunks.len();
    let mut parts = Vec::with_capacity(total);

    for (i, chunk) in chunks.iter().enumerate() {
        let bar = spinner(f!("Summarizing part {}/{}", i + 1, total));
        let prompt = build_chunk_prompt(chunk);
        let summary = agent
            .prompt(&prompt)
            .await
            .map_err(|e| eyre!("Failed to summarize part {}/{}: {}", i + 1, total, e))?;
        bar.finish_and_clear();
        parts.push(summary);
    }

    if total == 1 {
        return Ok((1, parts.remove(0)));
    }

    let bar = spinner("Consolidating summary".to_string());
    let prompt = build_consolidation_prompt(&parts);
    let summary = agent
        .prompt(&prompt)
        .await
        .map_err(|e| eyre!("Failed to consolidate partial summaries: {}", e))?;
    bar.finish_and_clear();

    Ok((total, summary))
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    log::info!(
        "summarize: {} via {} ({})",
        options.file.display(),
        options.model,
        options.ollama_url
    );

    let text = tokio::task::spawn_blocking({
        let path = options.file.clone();
        move || -> Result<String> {
            crate::doc::open_document(&path)?
                .extract_text()
                .map_err(|e| eyre!("Failed to extract text: {}", e))
        }
    })
    .await??;

    let (chunks, summary) = summarize_text(
        &text,
        &options.ollama_url,
        &options.model,
        options.chunk_chars,
    )
    .await?;

    if global.verbose {
        eprintln!("Summarized {} chunks with {}", chunks, options.model);
    }

    let output = SummarizeOutput {
        file: options.file.display().to_string(),
        model: options.model,
        chunks,
        summary,
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", output.summary);
    Ok(())
}
