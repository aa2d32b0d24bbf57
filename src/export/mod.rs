//! Export pipeline: editor HTML to a .docx package.
//!
//! The composer walks the editor's HTML tree into a block sequence; the
//! writers turn that sequence into the container parts (document body,
//! styles, generated numbering definitions, relationships, media) and the
//! package module zips everything up with fixed page geometry. Export is
//! always synchronous on the calling thread.

pub mod composer;
pub mod numbering;
pub mod package;
pub mod writer;

use crate::common::error::Result;

/// Options for one export call.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Document title metadata
    pub title: Option<String>,
}

/// Convert editor HTML into a complete .docx package buffer.
///
/// Unsupported nodes degrade to plain paragraphs and are recorded in the
/// composer's diagnostics; the export itself never aborts on content.
///
/// # Examples
///
/// ```
/// use longan::export::{ExportOptions, html_to_docx};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = html_to_docx("<h1>Report</h1><p>Body</p>", &ExportOptions::default())?;
/// assert_eq!(&bytes[..2], b"PK");
/// # Ok(())
/// # }
/// ```
pub fn html_to_docx(html: &str, options: &ExportOptions) -> Result<Vec<u8>> {
    let mut diagnostics = Vec::new();
    let blocks = composer::compose(html, &mut diagnostics);
    for diagnostic in &diagnostics {
        log::warn!("export degradation: {diagnostic}");
    }

    let (document_xml, media) = writer::write_document_xml(&blocks);
    package::write_package(
        &document_xml,
        options.title.as_deref(),
        &media,
    )
}
