//! Core format detection functions.
//!
//! Detection inspects only the first bytes of the buffer: a zip local-file
//! header means a modern container, the OLE2 compound-binary header means a
//! legacy document (explicitly unsupported, never parsed), and anything else
//! is sniffed as text for an HTML prefix.

use super::types::SourceFormat;

/// Zip local-file-header signature ("PK").
pub const ZIP_SIGNATURE: &[u8; 2] = b"PK";

/// OLE2 compound-binary-file signature.
pub const OLE2_SIGNATURE: &[u8; 8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Check for the zip local-file-header signature.
#[inline]
pub fn is_zip_container(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && &bytes[..2] == ZIP_SIGNATURE
}

/// Check for the OLE2 compound-binary signature used by legacy documents.
#[inline]
pub fn is_legacy_binary(bytes: &[u8]) -> bool {
    bytes.len() >= 8 && &bytes[..8] == &OLE2_SIGNATURE[..]
}

/// Sniff decoded text for an HTML or DOCTYPE prefix.
///
/// Tolerates a leading byte-order mark and leading whitespace. The decoder
/// falls back to lossy UTF-8 so that mislabeled single-byte encodings still
/// classify correctly.
pub fn is_html_text(bytes: &[u8]) -> bool {
    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();

    let head: String = trimmed.chars().take(64).collect::<String>().to_lowercase();
    if head.starts_with("<!doctype") || head.starts_with("<html") {
        return true;
    }
    // BOM-prefixed fragments produced by some exporters put markup later in
    // the prologue.
    text.starts_with('\u{feff}') && text.to_lowercase().contains("<html")
}

/// Detect the format of an input buffer.
///
/// The optional filename hint only matters when the signature check is
/// inconclusive; a buffer whose bytes identify it always wins over its name.
///
/// # Examples
///
/// ```
/// use longan::common::detection::{SourceFormat, detect_format};
///
/// assert_eq!(detect_format(b"PK\x03\x04rest", None), SourceFormat::ZipContainer);
/// assert_eq!(detect_format(b"<!DOCTYPE html><html>", None), SourceFormat::HtmlText);
/// ```
pub fn detect_format(bytes: &[u8], filename: Option<&str>) -> SourceFormat {
    if is_zip_container(bytes) {
        return SourceFormat::ZipContainer;
    }
    if is_legacy_binary(bytes) {
        return SourceFormat::LegacyBinary;
    }
    if is_html_text(bytes) {
        return SourceFormat::HtmlText;
    }

    if let Some(name) = filename {
        let ext = name.rsplit('.').next().map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("docx") => return SourceFormat::ZipContainer,
            Some("doc") => return SourceFormat::LegacyBinary,
            Some("htm") | Some("html") => return SourceFormat::HtmlText,
            _ => {},
        }
    }

    SourceFormat::Unknown
}
