//! Embedded image listing and extraction.
//!
//! Images live in each page's `Resources -> XObject` dictionary.  Listing
//! reports every image XObject with its dimensions and detected format.
//! Extraction writes recovered files to an output directory, applying size
//! filters to skip decorative fragments, and re-encodes streams that are not
//! already a self-contained format (raw pixel data, CCITT G4 fax) as PNG.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::parser::backend::{LopdfBackend, PageId};
use crate::PdfError;

/// Recognized embedded image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Jpeg2000,
    Png,
    Gif,
    Tiff,
    Bmp,
    Unknown,
}

impl ImageFormat {
    /// File extension used when writing extracted images.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Jpeg2000 => "jp2",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Tiff => "tif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Unknown => "bin",
        }
    }

    /// Detect the format from magic byte signatures.
    pub fn detect(bytes: &[u8]) -> ImageFormat {
        if bytes.len() < 8 {
            return ImageFormat::Unknown;
        }
        if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
            return ImageFormat::Jpeg;
        }
        if bytes[..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
            return ImageFormat::Png;
        }
        if bytes[..8] == [0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20] {
            return ImageFormat::Jpeg2000;
        }
        if &bytes[..6] == b"GIF87a" || &bytes[..6] == b"GIF89a" {
            return ImageFormat::Gif;
        }
        if bytes[..4] == [0x49, 0x49, 0x2A, 0x00] || bytes[..4] == [0x4D, 0x4D, 0x00, 0x2A] {
            return ImageFormat::Tiff;
        }
        if bytes[0] == b'B' && bytes[1] == b'M' {
            return ImageFormat::Bmp;
        }
        ImageFormat::Unknown
    }

    /// Map a PDF stream filter name to the format of its encoded payload.
    pub fn from_filter(filter_name: &str) -> ImageFormat {
        match filter_name {
            "DCTDecode" => ImageFormat::Jpeg,
            "JPXDecode" => ImageFormat::Jpeg2000,
            _ => ImageFormat::Unknown,
        }
    }
}

/// An image XObject as referenced from a page.
#[derive(Debug, Clone, Serialize)]
pub struct PageImage {
    /// 1-based page number.
    pub page: u32,
    /// Position of the image among the page's image XObjects.
    pub index: usize,
    /// Resource name in the XObject dictionary (e.g. `Im1`).
    pub name: String,
    /// Object id, used to suppress duplicate extraction of shared images.
    #[serde(skip)]
    pub id: PageId,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Size filters applied during extraction.  Defaults follow the original
/// recovery heuristics: drop icons, rules, and other decorative fragments.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Images whose smaller dimension is at or below this are skipped.
    pub dim_limit: u32,
    /// Payloads at or below this many bytes are skipped.
    pub abs_size: usize,
    /// Payloads whose bytes per pixel component fall at or below this are
    /// skipped; filters out near-empty masks.
    pub rel_size: f32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dim_limit: 50,
            abs_size: 1024,
            rel_size: 0.0,
        }
    }
}

/// Outcome of an extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub found: usize,
    pub extracted: usize,
    pub skipped: usize,
    pub output_dir: PathBuf,
}

/// List every image XObject in the document, page by page.
pub fn list_images(backend: &LopdfBackend) -> Result<Vec<PageImage>, PdfError> {
    let doc = backend.raw_doc();
    let mut images = Vec::new();

    for (&page_num, &page_id) in &doc.get_pages() {
        for (index, (name, stream, id)) in page_image_streams(doc, page_id)?.into_iter().enumerate()
        {
            let (width, height) = stream_dimensions(&stream.dict);
            let filter = filter_name(&stream.dict);
            let format = match filter.as_deref() {
                Some("CCITTFaxDecode") => ImageFormat::Png,
                Some(f) if ImageFormat::from_filter(f) != ImageFormat::Unknown => {
                    ImageFormat::from_filter(f)
                }
                _ => {
                    let detected = ImageFormat::detect(&stream.content);
                    if detected == ImageFormat::Unknown && parse_raw_meta(&stream.dict).is_some() {
                        ImageFormat::Png
                    } else {
                        detected
                    }
                }
            };

            images.push(PageImage {
                page: page_num,
                index,
                name,
                id,
                width,
                height,
                format,
            });
        }
    }

    Ok(images)
}

/// Extract the document's images into `out_dir`.
///
/// Files are named `page_{page}_img_{index}_{name}.{ext}`.  Images shared
/// between pages are written once (first occurrence wins); filtered or
/// undecodable streams count as skipped.
pub fn extract_images(
    backend: &LopdfBackend,
    out_dir: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport, PdfError> {
    let doc = backend.raw_doc();
    std::fs::create_dir_all(out_dir)?;

    let mut seen: HashSet<PageId> = HashSet::new();
    let mut report = ExtractReport {
        found: 0,
        extracted: 0,
        skipped: 0,
        output_dir: out_dir.to_path_buf(),
    };

    for (&page_num, &page_id) in &doc.get_pages() {
        for (index, (name, stream, id)) in page_image_streams(doc, page_id)?.into_iter().enumerate()
        {
            report.found += 1;

            if !seen.insert(id) {
                report.skipped += 1;
                continue;
            }

            let (width, height) = stream_dimensions(&stream.dict);
            let Some((bytes, format)) = recover_payload(&stream) else {
                report.skipped += 1;
                continue;
            };

            let components = color_components(&stream.dict);
            if !passes_filters(width, height, components, bytes.len(), options) {
                report.skipped += 1;
                continue;
            }

            let file_name = format!(
                "page_{}_img_{}_{}.{}",
                page_num,
                index,
                name,
                format.extension()
            );
            std::fs::write(out_dir.join(file_name), &bytes)?;
            report.extracted += 1;
        }
    }

    Ok(report)
}

/// Apply the size filters to a candidate image.  All three boundaries are
/// inclusive: an image exactly at a limit is skipped.
fn passes_filters(
    width: u32,
    height: u32,
    components: u32,
    byte_len: usize,
    options: &ExtractOptions,
) -> bool {
    if width.min(height) <= options.dim_limit {
        return false;
    }
    if byte_len <= options.abs_size {
        return false;
    }
    let denominator = (width as f32) * (height as f32) * (components as f32);
    if denominator > 0.0 && (byte_len as f32) / denominator <= options.rel_size {
        return false;
    }
    true
}

/// Color component count for the density filter.  Unrecognized or indirect
/// color spaces count as a single component.
fn color_components(dict: &lopdf::Dictionary) -> u32 {
    match dict.get(b"ColorSpace").ok().and_then(|o| o.as_name().ok()) {
        Some(b"DeviceRGB") | Some(b"CalRGB") => 3,
        Some(b"DeviceCMYK") => 4,
        _ => 1,
    }
}

/// Recover the writable payload for an image stream.
///
/// JPEG and JPEG2000 streams are written verbatim.  CCITT G4 fax data is
/// decoded and re-encoded as PNG, as is raw pixel data in a device color
/// space.  Anything else falls back to magic-byte detection of the
/// decompressed stream.
fn recover_payload(stream: &lopdf::Stream) -> Option<(Vec<u8>, ImageFormat)> {
    let filter = filter_name(&stream.dict);

    match filter.as_deref() {
        Some("DCTDecode") => return Some((stream.content.clone(), ImageFormat::Jpeg)),
        Some("JPXDecode") => return Some((stream.content.clone(), ImageFormat::Jpeg2000)),
        Some("CCITTFaxDecode") => {
            return decode_ccitt_g4(&stream.dict, &stream.content)
                .map(|png| (png, ImageFormat::Png));
        }
        _ => {}
    }

    let bytes = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let detected = ImageFormat::detect(&bytes);
    if detected != ImageFormat::Unknown {
        return Some((bytes, detected));
    }

    let meta = parse_raw_meta(&stream.dict)?;
    let png = encode_raw_as_png(&meta, &bytes)?;
    Some((png, ImageFormat::Png))
}

// ---------------------------------------------------------------------------
// Page walking
// ---------------------------------------------------------------------------

/// Collect `(name, stream, object id)` for every image XObject on a page.
fn page_image_streams(
    doc: &lopdf::Document,
    page_id: PageId,
) -> Result<Vec<(String, lopdf::Stream, PageId)>, PdfError> {
    let page_obj = doc
        .get_object(page_id)
        .map_err(|e| PdfError::Parse(format!("cannot get page object: {}", e)))?;
    let page_dict = page_obj
        .as_dict()
        .map_err(|e| PdfError::Parse(format!("page object is not a dictionary: {}", e)))?;

    let Some(xobjects) = resolve_xobject_dict(doc, page_dict) else {
        return Ok(Vec::new());
    };

    let mut result = Vec::new();
    for (name, obj) in xobjects.iter() {
        let id = obj.as_reference().unwrap_or((0, 0));
        let resolved = resolve_object(doc, obj);
        let lopdf::Object::Stream(stream) = resolved else {
            continue;
        };

        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Image");
        if !is_image {
            continue;
        }

        result.push((
            String::from_utf8_lossy(name).into_owned(),
            stream.clone(),
            id,
        ));
    }

    Ok(result)
}

fn resolve_object<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict<'a>(
    doc: &'a lopdf::Document,
    obj: &'a lopdf::Object,
) -> Option<&'a lopdf::Dictionary> {
    match obj {
        lopdf::Object::Dictionary(d) => Some(d),
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        _ => None,
    }
}

fn resolve_xobject_dict<'a>(
    doc: &'a lopdf::Document,
    page_dict: &'a lopdf::Dictionary,
) -> Option<&'a lopdf::Dictionary> {
    let resources = resolve_dict(doc, page_dict.get(b"Resources").ok()?)?;
    resolve_dict(doc, resources.get(b"XObject").ok()?)
}

/// First filter name of a stream; `Filter` may be a name or an array.
fn filter_name(dict: &lopdf::Dictionary) -> Option<String> {
    match dict.get(b"Filter").ok()? {
        lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        lopdf::Object::Array(arr) => arr.first().and_then(|o| match o {
            lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }),
        _ => None,
    }
}

fn stream_dimensions(dict: &lopdf::Dictionary) -> (u32, u32) {
    let dim = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|o| o.as_i64().ok())
            .map(|v| v.max(0) as u32)
            .unwrap_or(0)
    };
    (dim(b"Width"), dim(b"Height"))
}

// ---------------------------------------------------------------------------
// Raw pixel data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

/// Metadata needed to interpret raw (already-decompressed) pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawImageMeta {
    width: u32,
    height: u32,
    bits_per_component: u8,
    channels: u8,
    color_space: ColorSpace,
}

impl RawImageMeta {
    /// Expected raw byte count, accounting for sub-byte pixel packing with
    /// per-row byte alignment.
    fn expected_byte_count(&self) -> usize {
        let bits_per_row =
            self.width as usize * self.channels as usize * self.bits_per_component as usize;
        bits_per_row.div_ceil(8) * self.height as usize
    }
}

/// Parse raw-image metadata from a stream dictionary.  Only device color
/// spaces are supported.
fn parse_raw_meta(dict: &lopdf::Dictionary) -> Option<RawImageMeta> {
    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

    let bits_per_component = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .map(|v| v as u8)
        .unwrap_or(8);

    let (color_space, channels) = match dict.get(b"ColorSpace").ok()?.as_name().ok()? {
        b"DeviceGray" => (ColorSpace::Gray, 1),
        b"DeviceRGB" => (ColorSpace::Rgb, 3),
        b"DeviceCMYK" => (ColorSpace::Cmyk, 4),
        _ => return None,
    };

    Some(RawImageMeta {
        width,
        height,
        bits_per_component,
        channels,
        color_space,
    })
}

/// Re-encode raw pixel data as PNG.
fn encode_raw_as_png(meta: &RawImageMeta, raw_bytes: &[u8]) -> Option<Vec<u8>> {
    if raw_bytes.len() != meta.expected_byte_count() {
        return None;
    }

    let expanded = if meta.bits_per_component < 8 {
        expand_sub_byte_pixels(raw_bytes, meta)
    } else {
        raw_bytes.to_vec()
    };

    let dyn_image = match meta.color_space {
        ColorSpace::Gray => {
            image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(
                meta.width,
                meta.height,
                expanded,
            )?)
        }
        ColorSpace::Rgb => {
            image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(
                meta.width,
                meta.height,
                expanded,
            )?)
        }
        ColorSpace::Cmyk => {
            image::DynamicImage::ImageRgb8(image::RgbImage::from_raw(
                meta.width,
                meta.height,
                cmyk_to_rgb(&expanded),
            )?)
        }
    };

    let mut buf = Vec::new();
    dyn_image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .ok()?;
    Some(buf)
}

/// Expand sub-byte packed components (1, 2, or 4 bits) to 8 bits.
fn expand_sub_byte_pixels(raw_bytes: &[u8], meta: &RawImageMeta) -> Vec<u8> {
    let components_per_row = meta.width as usize * meta.channels as usize;
    let bpc = meta.bits_per_component;
    let bytes_per_row = (components_per_row * bpc as usize).div_ceil(8);
    let max_val = (1u16 << bpc) - 1;

    let mut result = Vec::with_capacity(components_per_row * meta.height as usize);

    for row in 0..meta.height as usize {
        let row_bytes = &raw_bytes[row * bytes_per_row..(row + 1) * bytes_per_row];
        let mut emitted = 0;

        for &byte in row_bytes {
            for i in 0..(8 / bpc as usize) {
                if emitted >= components_per_row {
                    break;
                }
                let shift = 8 - bpc * (i as u8 + 1);
                let val = (byte >> shift) & (max_val as u8);
                result.push((val as u16 * 255 / max_val) as u8);
                emitted += 1;
            }
        }
    }

    result
}

fn cmyk_to_rgb(cmyk_bytes: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk_bytes.len() / 4 * 3);
    for pixel in cmyk_bytes.chunks_exact(4) {
        let (c, m, y, k) = (
            pixel[0] as u16,
            pixel[1] as u16,
            pixel[2] as u16,
            pixel[3] as u16,
        );
        rgb.push(255u16.saturating_sub((c + k).min(255)) as u8);
        rgb.push(255u16.saturating_sub((m + k).min(255)) as u8);
        rgb.push(255u16.saturating_sub((y + k).min(255)) as u8);
    }
    rgb
}

// ---------------------------------------------------------------------------
// CCITT Group 4
// ---------------------------------------------------------------------------

/// Decode CCITT Group 4 fax data into a PNG image.
///
/// lopdf does not decompress this filter, so the raw stream bytes are fed to
/// the `fax` decoder.  Group 3 (K >= 0) is not handled.
fn decode_ccitt_g4(dict: &lopdf::Dictionary, raw_bytes: &[u8]) -> Option<Vec<u8>> {
    let parms = decode_parms(dict)?;

    let width = u16::try_from(parms.get(b"Columns").ok()?.as_i64().ok()?).ok()?;
    if width == 0 {
        return None;
    }
    let height = parms
        .get(b"Rows")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .and_then(|v| u16::try_from(v).ok());
    let k = parms
        .get(b"K")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0);

    if k >= 0 {
        return None;
    }

    let bytes_per_row = (width as usize).div_ceil(8);
    let mut rows: Vec<Vec<u8>> = Vec::new();

    fax::decoder::decode_g4(raw_bytes.iter().copied(), width, height, |transitions| {
        let mut row = pack_row_bits(transitions, width);
        row.resize(bytes_per_row, 0);
        rows.push(row);
    })?;

    if rows.is_empty() {
        return None;
    }

    let pixel_data: Vec<u8> = rows.into_iter().flatten().collect();
    let meta = RawImageMeta {
        width: width as u32,
        height: pixel_data.len() as u32 / bytes_per_row as u32,
        bits_per_component: 1,
        channels: 1,
        color_space: ColorSpace::Gray,
    };

    encode_raw_as_png(&meta, &pixel_data)
}

fn decode_parms(dict: &lopdf::Dictionary) -> Option<&lopdf::Dictionary> {
    match dict.get(b"DecodeParms").ok()? {
        lopdf::Object::Dictionary(d) => Some(d),
        lopdf::Object::Array(arr) => arr.first().and_then(|o| o.as_dict().ok()),
        _ => None,
    }
}

/// Convert fax transition positions into a packed 1-bit row.  Transitions
/// alternate white/black runs starting with white.
fn pack_row_bits(transitions: &[u16], width: u16) -> Vec<u8> {
    let mut row = vec![0u8; (width as usize).div_ceil(8)];

    let mut set_black_run = |start: u16, end: u16| {
        for col in start..end.min(width) {
            row[col as usize / 8] |= 1 << (7 - (col as usize % 8));
        }
    };

    let mut is_black = false;
    let mut prev_pos: u16 = 0;

    for &pos in transitions {
        if is_black {
            set_black_run(prev_pos, pos);
        }
        prev_pos = pos;
        is_black = !is_black;
    }
    if is_black {
        set_black_run(prev_pos, width);
    }

    row
}
