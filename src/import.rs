//! Top-level import pipeline.
//!
//! Detection first, then container validation, then the strategy chain,
//! then heading normalization. Progress callbacks arrive in order with
//! non-decreasing percentages and terminate at 100; the callback runs on
//! the calling thread even when the conversion itself was offloaded.

use crate::common::detection::{SourceFormat, detect_format};
use crate::common::diagnostics::{Diagnostic, DiagnosticKind};
use crate::common::error::{Error, Result};
use crate::docx::package::{ContainerManifest, DocxPackage};
use crate::html::escape::escape_html;
use crate::html::headings::normalize_headings;
use crate::letterhead::extract_document_content;
use crate::strategy::{ConvertRequest, StrategySelector};

pub use crate::strategy::ConversionResult;

/// Default size threshold above which structural conversion is offloaded
/// to the background worker (and high fidelity stops participating).
pub const DEFAULT_WORKER_THRESHOLD: usize = 2 * 1024 * 1024;

/// Options for one import call.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Inputs larger than this run structural conversion on the worker.
    pub worker_threshold: usize,
    /// Inputs at or above this size skip the high-fidelity renderer.
    pub high_fidelity_max: usize,
    /// Optional filename, used only when signatures are inconclusive.
    pub filename_hint: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            worker_threshold: DEFAULT_WORKER_THRESHOLD,
            high_fidelity_max: DEFAULT_WORKER_THRESHOLD,
            filename_hint: None,
        }
    }
}

/// Convert a document buffer to rich-text HTML.
///
/// See [`convert_to_html_with_progress`] for the progress-reporting
/// variant.
pub fn convert_to_html(bytes: &[u8], options: &ImportOptions) -> Result<ConversionResult> {
    convert_to_html_with_progress(bytes, options, &mut |_, _| {})
}

/// Convert a document buffer to rich-text HTML, reporting progress.
///
/// Only two conditions surface as errors: a legacy binary input
/// ([`Error::UnsupportedFormat`]) and exhaustion of every applicable
/// strategy. Everything else lands in the result's diagnostics.
pub fn convert_to_html_with_progress(
    bytes: &[u8],
    options: &ImportOptions,
    progress: &mut dyn FnMut(u8, &str),
) -> Result<ConversionResult> {
    // Strategies may restart their own stage numbering when the selector
    // advances; the caller only ever sees a non-decreasing sequence.
    let mut high_water = 0u8;
    let mut progress = move |percent: u8, label: &str| {
        high_water = high_water.max(percent);
        progress(high_water, label);
    };

    progress(5, "detecting input format");
    match detect_format(bytes, options.filename_hint.as_deref()) {
        SourceFormat::LegacyBinary => Err(Error::UnsupportedFormat(
            "legacy compound binary document (.doc); convert it to .docx first".to_string(),
        )),
        SourceFormat::HtmlText => {
            progress(80, "processing HTML content");
            let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
            let body = extract_document_content(text.trim_start_matches('\u{feff}'));
            progress(100, "conversion complete");
            Ok(ConversionResult {
                html: body.trim().to_string(),
                strategy: "html-text",
                fell_back: false,
                diagnostics: Vec::new(),
            })
        },
        SourceFormat::Unknown => convert_plain_text(bytes, &mut progress),
        SourceFormat::ZipContainer => convert_container(bytes, options, &mut progress),
    }
}

fn convert_container(
    bytes: &[u8],
    options: &ImportOptions,
    progress: &mut dyn FnMut(u8, &str),
) -> Result<ConversionResult> {
    progress(8, "validating container");

    // The manifest is built before any registry or strategy runs. A failed
    // validation is recorded, not fatal: it advances the selector, and only
    // full exhaustion is an error.
    let mut pre_diagnostics: Vec<Diagnostic> = Vec::new();
    let manifest: ContainerManifest = match DocxPackage::from_bytes(bytes) {
        Ok(pkg) => {
            let manifest = pkg.manifest();
            if let Err(e) = pkg.validate() {
                log::warn!("container validation failed: {e}");
                pre_diagnostics.push(Diagnostic::new(
                    DiagnosticKind::ParseDegraded,
                    format!("container validation failed: {e}"),
                ));
            }
            manifest
        },
        Err(e) => {
            log::warn!("container unreadable: {e}");
            pre_diagnostics.push(Diagnostic::new(
                DiagnosticKind::ParseDegraded,
                format!("container unreadable: {e}"),
            ));
            ContainerManifest::default()
        },
    };

    let request = ConvertRequest {
        bytes,
        manifest: &manifest,
        options,
    };
    let selector = StrategySelector::for_request(&request);
    let mut result = selector.run(&request, progress)?;

    if !pre_diagnostics.is_empty() {
        pre_diagnostics.append(&mut result.diagnostics);
        result.diagnostics = pre_diagnostics;
    }

    // Heading promotion applies to the structurally derived outputs; the
    // letterhead chunk is presentation-faithful by definition and the
    // lightweight pass already mapped heading styles to tags.
    if matches!(result.strategy, "structural" | "high-fidelity") {
        result.html = normalize_headings(&result.html);
    }

    progress(100, "conversion complete");
    Ok(result)
}

/// Best-effort handling for unrecognized input: printable text becomes a
/// sequence of paragraphs, anything else is refused.
fn convert_plain_text(
    bytes: &[u8],
    progress: &mut dyn FnMut(u8, &str),
) -> Result<ConversionResult> {
    let looks_binary = bytes.contains(&0);
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    let trimmed = text.trim();

    if looks_binary || had_errors || trimmed.is_empty() {
        return Err(Error::UnsupportedFormat(
            "unrecognized input format".to_string(),
        ));
    }

    progress(80, "processing plain text content");
    let mut html = String::with_capacity(trimmed.len() + 64);
    for line in trimmed.lines() {
        html.push_str("<p>");
        if line.trim().is_empty() {
            html.push_str("<br>");
        } else {
            html.push_str(&escape_html(line));
        }
        html.push_str("</p>");
    }

    progress(100, "conversion complete");
    Ok(ConversionResult {
        html,
        strategy: "plain-text",
        fell_back: false,
        diagnostics: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_binary_is_fatal() {
        let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        bytes.extend_from_slice(&[0u8; 128]);
        match convert_to_html(&bytes, &ImportOptions::default()) {
            Err(Error::UnsupportedFormat(msg)) => assert!(msg.contains(".doc")),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_html_text_passthrough() {
        let html = b"<!DOCTYPE html><html><body><p>Hi</p></body></html>";
        let result = convert_to_html(html, &ImportOptions::default()).unwrap();
        assert_eq!(result.strategy, "html-text");
        assert_eq!(result.html, "<p>Hi</p>");
    }

    #[test]
    fn test_plain_text_wrapping() {
        let result =
            convert_to_html(b"first line\nsecond line", &ImportOptions::default()).unwrap();
        assert_eq!(result.strategy, "plain-text");
        assert_eq!(result.html, "<p>first line</p><p>second line</p>");
    }

    #[test]
    fn test_binary_garbage_is_unsupported() {
        let bytes = [0x00, 0x01, 0x02, 0xFF, 0x00];
        assert!(matches!(
            convert_to_html(&bytes, &ImportOptions::default()),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_progress_is_monotonic_even_across_fallbacks() {
        // A zip-signature buffer that is not a readable container makes
        // every strategy fail; the percentages the caller sees must still
        // be non-decreasing.
        let mut seen = Vec::new();
        let result = convert_to_html_with_progress(
            b"PK\x03\x04 broken container bytes",
            &ImportOptions::default(),
            &mut |p, _| seen.push(p),
        );
        assert!(matches!(result, Err(Error::StrategiesExhausted { .. })));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }
}
