//! PDF document access: parsing, text extraction, markdown rendering with
//! detected headings, and embedded image recovery.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use parser::backend::LopdfBackend;

pub mod images;
pub mod parser;
pub mod render;
pub mod text;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document metadata from the trailer Info dictionary, plus the page count.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
}

/// A parsed PDF document.
///
/// Constructed via [`PdfDocument::open`] or [`PdfDocument::from_bytes`];
/// encrypted documents are rejected at construction.  All reads operate on
/// the already-parsed document without touching the source again.
pub struct PdfDocument {
    backend: LopdfBackend,
}

impl PdfDocument {
    /// Open and parse a PDF file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        Ok(Self {
            backend: LopdfBackend::load(path)?,
        })
    }

    /// Parse a PDF from an in-memory byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        Ok(Self {
            backend: LopdfBackend::load_bytes(bytes)?,
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }

    /// Document metadata.
    pub fn info(&self) -> DocumentInfo {
        let meta = self.backend.metadata();
        DocumentInfo {
            title: meta.get("Title").cloned(),
            author: meta.get("Author").cloned(),
            creator: meta.get("Creator").cloned(),
            producer: meta.get("Producer").cloned(),
            page_count: self.backend.page_count(),
        }
    }

    /// Plain document text, pages separated by blank lines.
    pub fn extract_text(&self) -> Result<String, PdfError> {
        text::document_text(&self.backend)
    }

    /// Document text rendered as markdown, with detected headings prefixed
    /// by `#` runs matching their level.
    pub fn render_markdown(&self) -> Result<String, PdfError> {
        render::render_markdown(&self.backend)
    }

    /// List every embedded image, page by page.
    pub fn list_images(&self) -> Result<Vec<images::PageImage>, PdfError> {
        images::list_images(&self.backend)
    }

    /// Extract embedded images into `out_dir`, applying the given size
    /// filters.
    pub fn extract_images(
        &self,
        out_dir: &Path,
        options: &images::ExtractOptions,
    ) -> Result<images::ExtractReport, PdfError> {
        images::extract_images(&self.backend, out_dir, options)
    }
}
