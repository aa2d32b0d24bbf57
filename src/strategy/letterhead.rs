//! The letterhead extraction strategy.
//!
//! Bypasses structural parsing entirely: the pre-rendered HTML/MHT chunk is
//! decoded and sanitized as-is, which preserves the exact letterhead layout
//! official documents care about. A missing chunk despite the detector flag
//! is a recoverable failure, so the selector falls through to structural
//! conversion.

use crate::common::diagnostics::Diagnostic;
use crate::common::error::{Error, Result};
use crate::docx::package::DocxPackage;
use crate::letterhead::extract_letterhead;
use crate::strategy::{ConvertRequest, ImportStrategy};

/// Direct extraction of the pre-rendered letterhead chunk.
pub struct LetterheadStrategy;

impl ImportStrategy for LetterheadStrategy {
    fn name(&self) -> &'static str {
        "letterhead"
    }

    fn attempt(
        &self,
        request: &ConvertRequest<'_>,
        progress: &mut dyn FnMut(u8, &str),
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String> {
        progress(30, "extracting letterhead content");
        let pkg = DocxPackage::from_bytes(request.bytes)?;

        match extract_letterhead(&pkg)? {
            Some(html) => {
                progress(80, "optimizing letterhead styles");
                Ok(html)
            },
            None => Err(Error::CorruptContainer(
                "letterhead chunk not found despite detector flag".to_string(),
            )),
        }
    }
}
