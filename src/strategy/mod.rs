//! Import strategies and the selector that drives them.
//!
//! The fallback chain is an ordered collection of strategy objects sharing
//! one `attempt` capability, not nested error handling: the selector builds
//! the applicable order once (letterhead first when the container carries a
//! chunk, high-fidelity below the size threshold, structural - offloaded
//! above the threshold - then lightweight) and advances past any strategy
//! that fails or produces near-empty output. The first acceptable output
//! wins; exhaustion of the whole chain is the only failure.

pub mod high_fidelity;
pub mod letterhead;
pub mod lightweight;
pub mod structural;

use crate::common::diagnostics::{Diagnostic, DiagnosticKind};
use crate::common::error::{Error, Result};
use crate::docx::package::ContainerManifest;
use crate::import::ImportOptions;
use once_cell::sync::Lazy;
use regex::Regex;

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag strip regex"));

/// Everything a strategy needs to attempt a conversion.
pub struct ConvertRequest<'a> {
    /// The raw input buffer
    pub bytes: &'a [u8],
    /// Manifest built by the container validator
    pub manifest: &'a ContainerManifest,
    /// Caller options (thresholds, image cap)
    pub options: &'a ImportOptions,
}

/// The final product of an import.
#[derive(Debug)]
pub struct ConversionResult {
    /// UTF-8 HTML fragment
    pub html: String,
    /// Name of the strategy that produced the output
    pub strategy: &'static str,
    /// Whether at least one earlier strategy failed first
    pub fell_back: bool,
    /// Conditions tolerated along the way
    pub diagnostics: Vec<Diagnostic>,
}

/// One import strategy in the fallback chain.
pub trait ImportStrategy {
    /// Stable name, used in diagnostics and the conversion result.
    fn name(&self) -> &'static str;

    /// Attempt the conversion. Recoverable failures advance the selector;
    /// anything tolerated goes into `diagnostics`.
    fn attempt(
        &self,
        request: &ConvertRequest<'_>,
        progress: &mut dyn FnMut(u8, &str),
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String>;
}

/// Ordered strategy chain for one conversion call.
pub struct StrategySelector {
    strategies: Vec<Box<dyn ImportStrategy>>,
}

impl StrategySelector {
    /// Build the applicable, ordered chain for a request.
    ///
    /// A letterhead chunk forces the letterhead extractor to the front
    /// regardless of file size; high fidelity only participates below the
    /// size threshold.
    pub fn for_request(request: &ConvertRequest<'_>) -> Self {
        let mut strategies: Vec<Box<dyn ImportStrategy>> = Vec::with_capacity(4);

        if request.manifest.has_letterhead() {
            strategies.push(Box::new(letterhead::LetterheadStrategy));
        }
        if request.bytes.len() < request.options.high_fidelity_max {
            strategies.push(Box::new(high_fidelity::HighFidelityStrategy));
        }
        strategies.push(Box::new(structural::StructuralStrategy));
        strategies.push(Box::new(lightweight::LightweightStrategy));

        Self { strategies }
    }

    /// Names of the strategies in attempt order.
    pub fn order(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain until one strategy yields acceptable output.
    pub fn run(
        &self,
        request: &ConvertRequest<'_>,
        progress: &mut dyn FnMut(u8, &str),
    ) -> Result<ConversionResult> {
        let mut diagnostics = Vec::new();

        for (index, strategy) in self.strategies.iter().enumerate() {
            log::debug!("attempting import strategy '{}'", strategy.name());

            match strategy.attempt(request, progress, &mut diagnostics) {
                Ok(html) if output_is_acceptable(&html) => {
                    return Ok(ConversionResult {
                        html,
                        strategy: strategy.name(),
                        fell_back: index > 0,
                        diagnostics,
                    });
                },
                Ok(_) => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::StrategyFailed,
                        format!("strategy '{}' produced near-empty output", strategy.name()),
                    ));
                },
                Err(e) if e.is_recoverable() => {
                    log::debug!("strategy '{}' failed: {e}", strategy.name());
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::StrategyFailed,
                        format!("strategy '{}' failed: {e}", strategy.name()),
                    ));
                },
                Err(e) => return Err(e),
            }
        }

        Err(Error::StrategiesExhausted {
            attempted: self.strategies.len(),
        })
    }
}

/// Whether a strategy's output clears the minimal floor: any visible text,
/// or at least an image or table element.
pub fn output_is_acceptable(html: &str) -> bool {
    if html.contains("<img") || html.contains("<table") {
        return true;
    }
    let text = TAGS.replace_all(html, "");
    !text.replace("&nbsp;", " ").trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_parts(
        letterhead: bool,
        size: usize,
    ) -> (Vec<u8>, ContainerManifest, ImportOptions) {
        let manifest = ContainerManifest {
            letterhead_part: letterhead.then(|| "word/afchunk.mht".to_string()),
            ..ContainerManifest::default()
        };
        (vec![0u8; size], manifest, ImportOptions::default())
    }

    #[test]
    fn test_letterhead_goes_first_regardless_of_size() {
        let (bytes, manifest, options) = request_parts(true, 64 * 1024 * 1024);
        let request = ConvertRequest {
            bytes: &bytes,
            manifest: &manifest,
            options: &options,
        };
        let selector = StrategySelector::for_request(&request);
        assert_eq!(
            selector.order(),
            vec!["letterhead", "structural", "lightweight"]
        );
    }

    #[test]
    fn test_small_file_order() {
        let (bytes, manifest, options) = request_parts(false, 1024);
        let request = ConvertRequest {
            bytes: &bytes,
            manifest: &manifest,
            options: &options,
        };
        let selector = StrategySelector::for_request(&request);
        assert_eq!(
            selector.order(),
            vec!["high-fidelity", "structural", "lightweight"]
        );
    }

    #[test]
    fn test_large_file_skips_high_fidelity() {
        let (bytes, manifest, options) = request_parts(false, 8 * 1024 * 1024);
        let request = ConvertRequest {
            bytes: &bytes,
            manifest: &manifest,
            options: &options,
        };
        let selector = StrategySelector::for_request(&request);
        assert_eq!(selector.order(), vec!["structural", "lightweight"]);
    }

    #[test]
    fn test_acceptability_floor() {
        assert!(output_is_acceptable("<p>hello</p>"));
        assert!(output_is_acceptable(r#"<img src="data:image/png;base64,AA==" />"#));
        assert!(!output_is_acceptable(""));
        assert!(!output_is_acceptable("<p></p>"));
        assert!(!output_is_acceptable("<p><br></p>"));
        assert!(!output_is_acceptable("<p>&nbsp;</p>"));
    }
}
