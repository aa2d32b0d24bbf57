//! Unified error types for the conversion engine.
//!
//! Only two conditions ever surface to callers as hard failures: an input
//! classified as a legacy binary document (`UnsupportedFormat`) and the
//! exhaustion of every applicable import strategy. Everything else is either
//! absorbed into diagnostics on the conversion result or used internally to
//! advance the strategy selector.
use thiserror::Error;

/// Main error type for conversion operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input format is recognized but deliberately unsupported
    /// (legacy OLE2 compound binary). Fatal, no fallback is attempted.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A required container part is missing or the archive cannot be read.
    /// Non-fatal: advances the strategy selector.
    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    /// XML parsing error in a container part
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(String),

    /// Structural anomaly that could not be tolerated in place
    #[error("Parse error: {0}")]
    Parse(String),

    /// Background worker failed and the synchronous retry failed too
    #[error("Worker error: {0}")]
    Worker(String),

    /// Export composition failure
    #[error("Export error: {0}")]
    Export(String),

    /// Every applicable import strategy was tried and none produced output
    #[error("All {attempted} import strategies failed")]
    StrategiesExhausted {
        /// Number of strategies that were attempted
        attempted: usize,
    },
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error allows the strategy selector to advance to the
    /// next strategy rather than aborting the whole conversion.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::UnsupportedFormat(_) | Error::StrategiesExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_is_fatal() {
        assert!(!Error::UnsupportedFormat("legacy binary".into()).is_recoverable());
        assert!(!Error::StrategiesExhausted { attempted: 4 }.is_recoverable());
    }

    #[test]
    fn test_corrupt_container_is_recoverable() {
        assert!(Error::CorruptContainer("no document body".into()).is_recoverable());
        assert!(Error::Xml("unexpected EOF".into()).is_recoverable());
    }
}
