//! Diagnostics collected during a conversion.
//!
//! The pipeline absorbs most anomalies instead of failing; each tolerated
//! condition is recorded here and returned on the conversion result.

/// Category of a tolerated anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A strategy was attempted and failed; the selector advanced.
    StrategyFailed,
    /// The background worker could not complete and the conversion was
    /// re-run synchronously.
    WorkerFallback,
    /// A structural XML anomaly was tolerated with a default substituted.
    ParseDegraded,
    /// An image referenced a relationship id with no media behind it;
    /// the image was omitted.
    ImageMissing,
    /// An HTML node had no export mapping and degraded to a plain paragraph.
    UnsupportedNode,
}

/// A single diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// What kind of condition was tolerated
    pub kind: DiagnosticKind,
    /// Human-readable detail
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
