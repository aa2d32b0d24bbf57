//! Source format classification.

/// Classification of an input byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Zip container (modern word-processor package)
    ZipContainer,
    /// OLE2 compound binary (legacy word-processor format, unsupported)
    LegacyBinary,
    /// HTML-like text, possibly with a leading byte-order mark
    HtmlText,
    /// Unrecognized input
    Unknown,
}

impl SourceFormat {
    /// Whether this format can be opened as a container.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, SourceFormat::ZipContainer)
    }
}
