//! Shared document access for the command handlers.

use std::path::Path;

use pdf::PdfDocument;

use crate::prelude::*;

/// Open a document, mapping backend errors to user-facing messages.
/// Callers run this inside `spawn_blocking`; lopdf parsing is synchronous.
pub fn open_document(path: &Path) -> Result<PdfDocument> {
    PdfDocument::open(path).map_err(|e| eyre!("Failed to open '{}': {}", path.display(), e))
}

/// On-disk size of the document in bytes.
pub fn file_size(path: &Path) -> Result<u64> {
    let meta = std::fs::metadata(path)
        .map_err(|e| eyre!("Failed to stat '{}': {}", path.display(), e))?;
    Ok(meta.len())
}
