//! The structural conversion strategy.
//!
//! Primary and most general: open the container, build the four registries,
//! walk the body, render HTML. Above the worker threshold the work is
//! offloaded; a worker fallback or error re-runs the same input
//! synchronously on the calling thread.

use crate::common::diagnostics::{Diagnostic, DiagnosticKind};
use crate::common::error::Result;
use crate::docx::document::convert_package;
use crate::docx::package::DocxPackage;
use crate::html::render::render_document;
use crate::offload::{OffloadOutcome, offload_structural};
use crate::strategy::{ConvertRequest, ImportStrategy};

/// Registry-driven structural conversion.
pub struct StructuralStrategy;

impl ImportStrategy for StructuralStrategy {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn attempt(
        &self,
        request: &ConvertRequest<'_>,
        progress: &mut dyn FnMut(u8, &str),
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String> {
        if request.bytes.len() > request.options.worker_threshold {
            log::debug!(
                "input of {} bytes exceeds worker threshold, offloading",
                request.bytes.len()
            );
            match offload_structural(request.bytes, progress) {
                OffloadOutcome::Completed(html) => return Ok(html),
                OffloadOutcome::NeedsSync(reason) => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::WorkerFallback,
                        format!("worker fell back ({reason}); converting synchronously"),
                    ));
                },
            }
        }

        convert_sync(request.bytes, progress, diagnostics)
    }
}

/// Synchronous structural pipeline, shared by the calling-thread path and
/// the worker body.
pub(crate) fn convert_sync(
    bytes: &[u8],
    progress: &mut dyn FnMut(u8, &str),
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<String> {
    progress(10, "decompressing container");
    let pkg = DocxPackage::from_bytes(bytes)?;

    let (model, mut convert_diags) = convert_package(&pkg, progress)?;
    diagnostics.append(&mut convert_diags);

    progress(70, "generating HTML");
    let html = render_document(&model);

    progress(90, "optimizing output");
    Ok(html)
}
