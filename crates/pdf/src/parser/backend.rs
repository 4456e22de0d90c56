use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};

use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// Extract an `f32` from a content-stream operand, accepting both integer and
/// real PDF numbers.
pub fn operand_number(obj: &lopdf::Object) -> Option<f32> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f32),
        lopdf::Object::Real(f) => Some(*f),
        _ => None,
    }
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// Handles three cases in order:
/// 1. UTF-16BE with BOM (`\xFE\xFF` prefix) -- strips BOM and decodes.
/// 2. Valid UTF-8 -- returned as-is.
/// 3. Fallback to Latin-1 (ISO 8859-1) -- each byte mapped to its Unicode
///    code point.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let code_units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1: byte value == code point.
    bytes.iter().map(|&b| b as char).collect()
}

/// Abstraction over a PDF parsing backend (currently backed by `lopdf`).
///
/// Higher-level modules -- the layout interpreter in particular -- depend on
/// this trait rather than on `lopdf::Document` directly, so they can be
/// exercised against fixture backends in tests.
pub trait PdfBackend {
    /// Mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Decode a page's content stream into its sequence of operations.
    fn page_operations(&self, page: PageId) -> Result<Vec<Operation>, PdfError>;

    /// Decode raw string bytes from a text-showing operator, using any
    /// font-specific encoding information available for the given page and
    /// font resource name.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Load a PDF from a file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::from_document(doc)
    }

    fn from_document(doc: lopdf::Document) -> Result<Self, PdfError> {
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &lopdf::Document {
        &self.doc
    }

    /// Total number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Extract metadata from the PDF trailer's Info dictionary.
    ///
    /// Returns a `BTreeMap` of keys such as `"Title"`, `"Author"`,
    /// `"Creator"`, `"Producer"`, `"Subject"`, `"CreationDate"`.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();

        let info_ref = match self.doc.trailer.get(b"Info") {
            Ok(obj) => obj,
            Err(_) => return meta,
        };

        let info_dict = match info_ref {
            lopdf::Object::Reference(id) => match self.doc.get_object(*id) {
                Ok(lopdf::Object::Dictionary(d)) => d,
                _ => return meta,
            },
            lopdf::Object::Dictionary(d) => d,
            _ => return meta,
        };

        let keys: &[&[u8]] = &[
            b"Title",
            b"Author",
            b"Creator",
            b"Producer",
            b"Subject",
            b"Keywords",
            b"CreationDate",
            b"ModDate",
        ];

        for key in keys {
            if let Ok(obj) = info_dict.get(key) {
                let value = match obj {
                    lopdf::Object::String(bytes, _) => decode_text_simple(bytes),
                    lopdf::Object::Name(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    _ => continue,
                };
                if !value.is_empty() {
                    meta.insert(String::from_utf8_lossy(key).into_owned(), value);
                }
            }
        }

        meta
    }

    /// Look up the encoding name declared for a font on a page.
    fn font_encoding_name(&self, page: PageId, font_name: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font_dict = fonts.get(font_name)?;
        match font_dict.get(b"Encoding").ok()? {
            lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_operations(&self, page: PageId) -> Result<Vec<Operation>, PdfError> {
        let raw = self
            .doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))?;

        let content = Content::decode(&raw)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content.operations)
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        // Identity-H / Identity-V fonts typically use 2-byte CID codes that
        // map to Unicode.  Try UTF-16BE decoding before the generic path.
        if let Some(enc) = self.font_encoding_name(page, font_name) {
            if enc.contains("Identity") && bytes.len() >= 2 && bytes.len() % 2 == 0 {
                let code_units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                let decoded = String::from_utf16_lossy(&code_units);
                if !decoded.is_empty() && !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                    return decoded;
                }
            }
        }

        decode_text_simple(bytes)
    }
}
