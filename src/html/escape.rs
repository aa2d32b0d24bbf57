//! HTML escaping.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static HTML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build HTML escaper")
});

/// Escape HTML special characters.
///
/// # Examples
///
/// ```
/// use longan::html::escape_html;
/// assert_eq!(escape_html("a & b"), "a &amp; b");
/// assert_eq!(escape_html("<p>\"x\"</p>"), "&lt;p&gt;&quot;x&quot;&lt;/p&gt;");
/// ```
#[inline]
pub fn escape_html(s: &str) -> String {
    HTML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&#039;"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_all_specials() {
        assert_eq!(escape_html("&<>\"'"), "&amp;&lt;&gt;&quot;&#039;");
    }
}
