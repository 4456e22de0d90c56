//! Embedded image listing and extraction.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use colored::Colorize;
use pdf::images::{ExtractOptions, ExtractReport, PageImage};
use pdf::PdfDocument;
use prettytable::row;
use serde::Serialize;

use crate::prelude::{eprintln, println, *};

#[derive(Debug, Clone, clap::Parser)]
pub struct Options {
    /// Path to the PDF document
    pub file: PathBuf,

    /// Extract images to disk instead of listing them
    #[clap(long)]
    pub extract: bool,

    /// Output directory for extracted images (defaults to `<file>_images`)
    #[clap(long)]
    pub out: Option<PathBuf>,

    /// Skip images whose smaller dimension is at or below this many pixels
    #[clap(long, default_value = "50")]
    pub min_dim: u32,

    /// Skip image payloads of at most this many bytes
    #[clap(long, default_value = "1024")]
    pub min_bytes: usize,

    /// Skip images whose bytes-per-component density is at or below this
    #[clap(long, default_value = "0.0")]
    pub min_density: f32,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListOutput {
    pub file: String,
    pub images: Vec<PageImage>,
}

/// List every image XObject referenced by the document's pages.
pub fn collect(document: &PdfDocument, path: &Path) -> Result<ListOutput> {
    let images = document
        .list_images()
        .map_err(|e| eyre!("Failed to list images: {}", e))?;

    Ok(ListOutput {
        file: path.display().to_string(),
        images,
    })
}

/// Default output directory: the document's stem with an `_images` suffix,
/// next to the document itself.
fn default_out_dir(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());
    file.with_file_name(f!("{}_images", stem))
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    log::info!("images: {}", options.file.display());

    if options.extract {
        return run_extract(options, global).await;
    }

    let output = tokio::task::spawn_blocking({
        let path = options.file.clone();
        move || collect(&crate::doc::open_document(&path)?, &path)
    })
    .await??;

    if global.verbose {
        eprintln!("Found {} images", output.images.len());
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if output.images.is_empty() {
        println!("No images found.");
        return Ok(());
    }

    if std::io::stdout().is_terminal() {
        eprintln!("{}", output.file.bold());
    }

    let mut table = new_table();
    table.add_row(row!["Page", "#", "Name", "Dimensions", "Format"]);
    for image in &output.images {
        table.add_row(row![
            image.page,
            image.index,
            image.name,
            f!("{}x{}", image.width, image.height),
            f!("{:?}", image.format).to_lowercase(),
        ]);
    }
    println!("{}", table);

    Ok(())
}

async fn run_extract(options: Options, global: crate::Global) -> Result<()> {
    let out_dir = options
        .out
        .clone()
        .unwrap_or_else(|| default_out_dir(&options.file));

    let extract_options = ExtractOptions {
        dim_limit: options.min_dim,
        abs_size: options.min_bytes,
        rel_size: options.min_density,
    };

    let report: ExtractReport = tokio::task::spawn_blocking({
        let path = options.file.clone();
        let out_dir = out_dir.clone();
        move || -> Result<ExtractReport> {
            let document = crate::doc::open_document(&path)?;
            document
                .extract_images(&out_dir, &extract_options)
                .map_err(|e| eyre!("Failed to extract images: {}", e))
        }
    })
    .await??;

    if global.verbose {
        eprintln!(
            "Found {}, extracted {}, skipped {}",
            report.found, report.extracted, report.skipped
        );
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Extracted {} of {} images to {} ({} skipped by size filters)",
        report.extracted,
        report.found,
        report.output_dir.display(),
        report.skipped
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_out_dir_uses_file_stem() {
        let dir = default_out_dir(Path::new("/tmp/report.pdf"));
        assert_eq!(dir, PathBuf::from("/tmp/report_images"));
    }

    #[test]
    fn default_out_dir_stays_next_to_file() {
        let dir = default_out_dir(Path::new("docs/paper.pdf"));
        assert_eq!(dir, PathBuf::from("docs/paper_images"));
    }

    #[test]
    fn default_flags_match_library_filter_defaults() {
        use clap::Parser;

        let options = Options::try_parse_from(["images", "doc.pdf"]).unwrap();
        let defaults = ExtractOptions::default();
        assert_eq!(options.min_dim, defaults.dim_limit);
        assert_eq!(options.min_bytes, defaults.abs_size);
        assert_eq!(options.min_density, defaults.rel_size);
    }
}
