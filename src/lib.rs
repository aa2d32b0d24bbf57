//! Longan - a Rust engine for importing Word documents into rich-text HTML
//! and exporting edited HTML back into Word document packages.
//!
//! The import pipeline parses the zip-based OOXML container (document body,
//! styles, numbering, font table, image relationships) and converts it to an
//! HTML fragment suitable for a rich-text editor. Several strategies compete,
//! ordered by a selector that advances on failure:
//!
//! - **Letterhead extraction** for containers carrying a pre-rendered
//!   HTML/MHT chunk (always preferred when present)
//! - **High-fidelity rendering** through an HTML DOM surface for small and
//!   medium inputs
//! - **Structural conversion**, the general registry-driven strategy, which
//!   is also the only one that can run on a background worker thread
//! - **Lightweight conversion**, a style-name-map fallback with reduced
//!   fidelity
//!
//! The export pipeline walks editor HTML and emits a complete .docx package:
//! paragraphs, headings, runs with accumulated marks, tables, nested lists
//! backed by generated numbering definitions, images, blockquotes, code
//! blocks and page breaks.
//!
//! # Example - importing a document
//!
//! ```no_run
//! use longan::import::{convert_to_html, ImportOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("document.docx")?;
//! let result = convert_to_html(&bytes, &ImportOptions::default())?;
//!
//! println!("strategy: {}", result.strategy);
//! println!("{}", result.html);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - exporting editor content
//!
//! ```no_run
//! use longan::export::{html_to_docx, ExportOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let html = "<h1>Title</h1><p>Body text</p>";
//! let bytes = html_to_docx(html, &ExportOptions::default())?;
//! std::fs::write("out.docx", bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - watching progress
//!
//! ```no_run
//! use longan::import::{convert_to_html_with_progress, ImportOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("document.docx")?;
//! let result = convert_to_html_with_progress(
//!     &bytes,
//!     &ImportOptions::default(),
//!     &mut |percent, label| eprintln!("{percent:>3}% {label}"),
//! )?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

/// Shared infrastructure: error taxonomy, diagnostics, format detection and
/// measurement unit conversions.
pub mod common;

/// OOXML container access: package validation, the normalized XML tree, the
/// four registries and the structural document converter.
pub mod docx;

/// Arena-backed HTML DOM used wherever the crate needs to parse or rewrite
/// HTML (high-fidelity rendering, heading promotion, export composition).
pub mod dom;

/// HTML output: escaping, color tables, the document renderer and the
/// heading heuristic normalizer.
pub mod html;

/// Letterhead (altChunk) extraction: MHT envelope decoding and sanitizing.
pub mod letterhead;

/// Import strategies and the ordered selector that drives them.
pub mod strategy;

/// Background-worker offload for structural conversion of large inputs.
pub mod offload;

/// Top-level import pipeline.
pub mod import;

/// Export pipeline: editor HTML to a .docx package.
pub mod export;

// Re-export commonly used types for convenience
pub use common::error::{Error, Result};
pub use export::{ExportOptions, html_to_docx};
pub use import::{ConversionResult, ImportOptions, convert_to_html};
