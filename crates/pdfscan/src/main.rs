use crate::prelude::*;
use clap::Parser;

mod doc;
mod images;
mod info;
mod outline;
mod prelude;
mod report;
mod summarize;
mod words;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Analyze PDF documents: metadata, word statistics, numbered outlines, embedded images, and local-model summaries"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "PDFSCAN_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Show document metadata and word statistics
    Info(info::Options),

    /// Reconstruct the numbered heading outline
    Outline(outline::Options),

    /// Rank the most frequent meaningful words
    Words(words::Options),

    /// List or extract embedded images
    Images(images::Options),

    /// Summarize the document with a local Ollama model
    Summarize(summarize::Options),

    /// Full report: metadata, statistics, outline, and summary
    Report(report::Options),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Info(options) => info::run(options, app.global).await,
        SubCommands::Outline(options) => outline::run(options, app.global).await,
        SubCommands::Words(options) => words::run(options, app.global).await,
        SubCommands::Images(options) => images::run(options, app.global).await,
        SubCommands::Summarize(options) => summarize::run(options, app.global).await,
        SubCommands::Report(options) => report::run(options, app.global).await,
    }
}
