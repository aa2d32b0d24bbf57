//! Letterhead chunk extraction.
//!
//! Official letterhead documents embed a pre-rendered HTML or MHT part in
//! the container so the letterhead layout survives exactly. This module
//! reads that part directly, bypassing structural parsing: split the MIME
//! envelope when there is one, undo the transfer encoding, pull out the
//! document body (or the `<pre>`-wrapped variant some producers emit) and
//! sanitize the result down to what the rich-text model accepts.

use crate::common::error::Result;
use crate::docx::package::DocxPackage;
use crate::html::color::NAMED_COLORS;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use memchr::memmem;
use once_cell::sync::Lazy;
use regex::Regex;

static BODY_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").expect("body regex"));
static PRE_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").expect("pre regex"));
static DIRECT_HTML: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<html.*?</html>").expect("html regex"));
static TRANSFER_ENCODING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Content-Transfer-Encoding:\s*([\w-]+)").expect("encoding regex")
});

/// Extract and sanitize the letterhead chunk of a container.
///
/// Returns `Ok(None)` when no chunk part exists despite the caller's
/// expectations; the strategy selector then falls back to structural
/// conversion rather than failing.
pub fn extract_letterhead(pkg: &DocxPackage) -> Result<Option<String>> {
    let manifest = pkg.manifest();
    let Some(part_name) = manifest.letterhead_part else {
        return Ok(None);
    };
    let Some(bytes) = pkg.part(&part_name) else {
        return Ok(None);
    };

    let (content, _, _) = encoding_rs::UTF_8.decode(bytes);

    let html = if is_mime_envelope(&content) {
        mht_to_html(&content)
    } else {
        extract_document_content(&content)
    };

    Ok(Some(sanitize_letterhead_html(&html)))
}

/// Whether the chunk is a multi-part MIME envelope rather than bare HTML.
fn is_mime_envelope(content: &str) -> bool {
    content.contains("MIME-Version:") || content.contains("Content-Type: multipart")
}

/// Pull the HTML sub-part out of an MHT envelope and undo its transfer
/// encoding.
fn mht_to_html(mht: &str) -> String {
    let Some(section) = find_html_section(mht) else {
        // No declared HTML part; try the raw markup before giving up.
        if let Some(m) = DIRECT_HTML.find(mht) {
            return extract_document_content(m.as_str());
        }
        return mht.to_string();
    };

    let encoding = TRANSFER_ENCODING
        .captures(mht)
        .map(|caps| caps[1].to_ascii_lowercase())
        .unwrap_or_default();

    let decoded = match encoding.as_str() {
        "base64" => {
            let stripped: String = section.split_whitespace().collect();
            match BASE64.decode(stripped.as_bytes()) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => section.to_string(),
            }
        },
        "quoted-printable" => decode_quoted_printable(section),
        _ => section.to_string(),
    };

    extract_document_content(&decoded)
}

/// Locate the body of the `text/html` sub-part: from its headers' end to
/// the next envelope boundary.
fn find_html_section(mht: &str) -> Option<&str> {
    let bytes = mht.as_bytes();
    let html_header = memmem::find(bytes, b"Content-Type: text/html")
        .or_else(|| memmem::find(bytes, b"Content-Type:text/html"))?;

    // Headers end at the first blank line after the content-type header.
    let after_headers = memmem::find(&bytes[html_header..], b"\r\n\r\n")
        .map(|pos| html_header + pos + 4)
        .or_else(|| {
            memmem::find(&bytes[html_header..], b"\n\n").map(|pos| html_header + pos + 2)
        })?;

    let rest = &bytes[after_headers..];
    let end = memmem::find(rest, b"\n------=")
        .or_else(|| memmem::find(rest, b"\n--=_NextPart"))
        .unwrap_or(rest.len());

    std::str::from_utf8(&rest[..end]).ok()
}

/// Decode quoted-printable content: soft line breaks removed, `=XX` hex
/// escapes decoded, then reinterpreted as UTF-8.
fn decode_quoted_printable(input: &str) -> String {
    let mut bytes = Vec::with_capacity(input.len());
    let mut iter = input.bytes().peekable();

    while let Some(b) = iter.next() {
        if b != b'=' {
            bytes.push(b);
            continue;
        }
        // Soft line break: "=\r\n" or "=\n" vanishes.
        match iter.peek() {
            Some(b'\r') => {
                iter.next();
                if iter.peek() == Some(&b'\n') {
                    iter.next();
                }
            },
            Some(b'\n') => {
                iter.next();
            },
            _ => {
                let high = iter.next();
                let low = iter.next();
                match (high, low) {
                    (Some(h), Some(l)) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => {
                        let hex = [h, l];
                        let value = u8::from_str_radix(
                            std::str::from_utf8(&hex).unwrap_or("00"),
                            16,
                        )
                        .unwrap_or(b'=');
                        bytes.push(value);
                    },
                    _ => {
                        // Malformed escape: keep it verbatim.
                        bytes.push(b'=');
                        if let Some(h) = high {
                            bytes.push(h);
                        }
                        if let Some(l) = low {
                            bytes.push(l);
                        }
                    },
                }
            },
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Extract the document body, or the `<pre>`-wrapped variant some
/// producers use, falling back to the input itself.
pub(crate) fn extract_document_content(html: &str) -> String {
    if let Some(caps) = BODY_CONTENT.captures(html) {
        return caps[1].to_string();
    }
    if let Some(caps) = PRE_CONTENT.captures(html) {
        return caps[1].to_string();
    }
    html.to_string()
}

static EDITOR_DATA_ATTRS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s*data-ea-[^=\s>]*="[^"]*""#).expect("data attr regex"));
static NOISE_ATTRS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s*(?:id|contenteditable|role|aria-[^=\s>]*)="[^"]*""#)
        .expect("noise attr regex")
});
static MSO_CLASSES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)class="[^"]*Mso[^"]*""#).expect("mso class regex"));
static XML_DECLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\?xml[^>]*\?>").expect("xml decl regex"));
static XMLNS_ATTRS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)xmlns[^=\s>]*="[^"]*""#).expect("xmlns regex"));
static OFFICE_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(o|v|w):[^>]*>.*?</(?:o|v|w):[^>]*>").expect("office tag regex")
});
static COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));
static MSO_PROPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)mso-[^;:"']+:[^;:"']+;?\s*"#).expect("mso prop regex"));
static EMPTY_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\s*style="\s*""#).expect("empty style regex"));
static FONT_COLOR_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<font([^>]*?)\s*color\s*=\s*["']?([^"'\s>]+)["']?([^>]*)>"#)
        .expect("font color regex")
});
static FONT_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</font>").expect("font close"));
static BARE_HEX6: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)color:\s*([A-F0-9]{6})([^A-F0-9])").expect("hex6 regex")
});
static BARE_HEX3: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)color:\s*([A-F0-9]{3})([^A-F0-9])").expect("hex3 regex")
});
static NAMED_COLOR_PROP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)color:\s*(red|blue|green|yellow|black|white|gray|grey|orange|purple|pink|brown|navy|teal|maroon|olive|aqua|fuchsia|silver|lime)([;\s"'])"#,
    )
    .expect("named color regex")
});
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank lines"));
static EMPTY_SPANS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<span>\s*</span>").expect("empty span regex"));
static BREAK_ONLY_SPANS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<span[^>]*>[\s\u{FEFF}]*<br\s*/?>\s*</span>").expect("break span regex")
});

/// Sanitize extracted letterhead HTML for the rich-text model.
///
/// Strips editor-internal data attributes, office-namespaced tags, XML
/// declarations, comments and vendor-prefixed style properties; converts
/// legacy `<font color>` markup into styled spans; normalizes hex and
/// named colors to canonical `#RRGGBB` form.
pub fn sanitize_letterhead_html(html: &str) -> String {
    let html = EDITOR_DATA_ATTRS.replace_all(html, "");
    let html = NOISE_ATTRS.replace_all(&html, "");
    let html = MSO_CLASSES.replace_all(&html, "");
    let html = XML_DECLS.replace_all(&html, "");
    let html = XMLNS_ATTRS.replace_all(&html, "");
    let html = OFFICE_TAGS.replace_all(&html, "");
    let html = COMMENTS.replace_all(&html, "");
    let html = MSO_PROPS.replace_all(&html, "");
    let html = EMPTY_STYLE.replace_all(&html, "");

    // Legacy font tags become styled spans; the editor model has no font
    // element.
    let html = FONT_COLOR_OPEN.replace_all(&html, r#"<span style="color: $2"$1$3>"#);
    let html = FONT_CLOSE.replace_all(&html, "</span>");

    // Canonical hex form for colors that lost their # along the way.
    let html = BARE_HEX6.replace_all(&html, "color: #$1$2");
    let html = BARE_HEX3.replace_all(&html, "color: #$1$2");
    let html = NAMED_COLOR_PROP.replace_all(&html, |caps: &regex::Captures<'_>| {
        let name = caps[1].to_ascii_lowercase();
        let hex = NAMED_COLORS.get(name.as_str()).copied().unwrap_or("#000000");
        format!("color: {hex}{}", &caps[2])
    });

    let html = BLANK_LINES.replace_all(&html, "\n");
    let html = EMPTY_SPANS.replace_all(&html, "");
    let html = BREAK_ONLY_SPANS.replace_all(&html, "<br>");

    html.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_printable() {
        assert_eq!(decode_quoted_printable("a=3Db"), "a=b");
        assert_eq!(decode_quoted_printable("soft=\r\nbreak"), "softbreak");
        assert_eq!(decode_quoted_printable("soft=\nbreak"), "softbreak");
        // UTF-8 escape pair
        assert_eq!(decode_quoted_printable("=C3=A9"), "é");
    }

    #[test]
    fn test_mht_quoted_printable_envelope() {
        let mht = "MIME-Version: 1.0\r\n\
                   Content-Type: multipart/related; boundary=\"----=_NextPart_01\"\r\n\
                   \r\n\
                   ------=_NextPart_01\r\n\
                   Content-Type: text/html; charset=\"utf-8\"\r\n\
                   Content-Transfer-Encoding: quoted-printable\r\n\
                   \r\n\
                   <html><body><p style=3D\"color: red\">Letterhead</p></body></html>\r\n\
                   ------=_NextPart_01--";
        let html = mht_to_html(mht);
        assert!(html.contains("Letterhead"));
        assert!(html.contains("style=\"color: red\""));
        assert!(!html.contains("<body"));
    }

    #[test]
    fn test_mht_base64_envelope() {
        let payload = BASE64.encode("<html><body><p>Encoded</p></body></html>");
        let mht = format!(
            "MIME-Version: 1.0\r\n\
             Content-Type: text/html\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             {payload}\r\n"
        );
        assert_eq!(mht_to_html(&mht), "<p>Encoded</p>");
    }

    #[test]
    fn test_pre_wrapped_variant() {
        let html = "<html><pre><p>wrapped</p></pre></html>";
        assert_eq!(extract_document_content(html), "<p>wrapped</p>");
    }

    #[test]
    fn test_sanitize_strips_office_noise() {
        let dirty = r#"<?xml version="1.0"?>
            <p xmlns:o="urn:o" class="MsoNormal" style="mso-fareast-language: ZH-CN; color: red">
              <o:p>office</o:p>keep
            </p><!-- comment -->"#;
        let clean = sanitize_letterhead_html(dirty);
        assert!(!clean.contains("<?xml"));
        assert!(!clean.contains("xmlns"));
        assert!(!clean.contains("MsoNormal"));
        assert!(!clean.contains("mso-"));
        assert!(!clean.contains("<o:p>"));
        assert!(!clean.contains("comment"));
        assert!(clean.contains("keep"));
        // Named color canonicalized
        assert!(clean.contains("color: #FF0000"));
    }

    #[test]
    fn test_font_tag_conversion() {
        let dirty = r#"<font color="navy" size="3">old markup</font>"#;
        let clean = sanitize_letterhead_html(dirty);
        assert!(clean.contains(r#"<span style="color: #000080""#), "got: {clean}");
        assert!(clean.contains("</span>"));
        assert!(!clean.to_lowercase().contains("<font"));
    }

    #[test]
    fn test_bare_hex_gets_prefix() {
        let clean = sanitize_letterhead_html(r#"<p style="color: FF0000;">x</p>"#);
        assert!(clean.contains("color: #FF0000"));
    }

    #[test]
    fn test_editor_attrs_removed() {
        let clean = sanitize_letterhead_html(
            r#"<p data-ea-id="42" contenteditable="true" style="color: #1A2B3C">x</p>"#,
        );
        assert!(!clean.contains("data-ea-"));
        assert!(!clean.contains("contenteditable"));
        assert!(clean.contains("color: #1A2B3C"));
    }
}
