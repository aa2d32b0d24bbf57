//! The lightweight conversion strategy.
//!
//! Last in the chain and deliberately modest: a style-name map turns named
//! paragraph styles into semantic tags (headings, blockquotes, code), runs
//! keep only their basic toggles as `<strong>`/`<em>`/`<u>`/`<s>` wrappers,
//! and tables come through as bare rows and cells. No colors, no sizes, no
//! images - but it succeeds on documents the richer strategies choke on.

use crate::common::diagnostics::Diagnostic;
use crate::common::error::Result;
use crate::docx::package::{DocxPackage, part_names};
use crate::docx::styles::{StyleRegistry, parse_run_props};
use crate::docx::xmltree::XmlElement;
use crate::html::escape::escape_html;
use crate::strategy::{ConvertRequest, ImportStrategy};

/// Style-name-map fallback conversion.
pub struct LightweightStrategy;

impl ImportStrategy for LightweightStrategy {
    fn name(&self) -> &'static str {
        "lightweight"
    }

    fn attempt(
        &self,
        request: &ConvertRequest<'_>,
        progress: &mut dyn FnMut(u8, &str),
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String> {
        progress(40, "running lightweight conversion");
        let pkg = DocxPackage::from_bytes(request.bytes)?;

        let styles = match pkg.part(part_names::STYLES) {
            Some(xml) => StyleRegistry::from_part(xml).unwrap_or_else(|_| StyleRegistry::empty()),
            None => StyleRegistry::empty(),
        };

        let document_xml = pkg.part(part_names::DOCUMENT).ok_or_else(|| {
            crate::common::error::Error::CorruptContainer(
                "missing document body part".to_string(),
            )
        })?;
        let root = XmlElement::parse(document_xml)?;
        let body = root
            .child("body")
            .or_else(|| root.descendant("body"))
            .ok_or_else(|| {
                crate::common::error::Error::Parse("document has no body element".to_string())
            })?;

        let mut out = String::with_capacity(2048);
        for child in body.elements() {
            match child.name.as_str() {
                "p" => render_paragraph(child, &styles, &mut out),
                "tbl" => render_table(child, &mut out),
                _ => {},
            }
        }

        progress(90, "optimizing output");
        Ok(out)
    }
}

/// Map a style id or display name to the semantic tag it stands for.
fn map_style_to_tag(name: &str) -> Option<&'static str> {
    let squashed: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match squashed.as_str() {
        "heading1" | "标题1" => Some("h1"),
        "heading2" | "标题2" => Some("h2"),
        "heading3" | "标题3" => Some("h3"),
        "heading4" | "标题4" => Some("h4"),
        "heading5" | "标题5" => Some("h5"),
        "heading6" | "标题6" => Some("h6"),
        "quote" | "blocktext" => Some("blockquote"),
        "code" => Some("pre"),
        _ => None,
    }
}

fn paragraph_tag(p: &XmlElement, styles: &StyleRegistry) -> &'static str {
    let style_id = p
        .child("pPr")
        .and_then(|ppr| ppr.child("pStyle"))
        .and_then(|s| s.val());

    if let Some(style_id) = style_id {
        if let Some(tag) = map_style_to_tag(style_id) {
            return tag;
        }
        if let Some(name) = styles.style_name(style_id)
            && let Some(tag) = map_style_to_tag(name)
        {
            return tag;
        }
    }
    "p"
}

fn render_paragraph(p: &XmlElement, styles: &StyleRegistry, out: &mut String) {
    let tag = paragraph_tag(p, styles);

    out.push('<');
    out.push_str(tag);
    out.push('>');
    render_runs(p, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_runs(parent: &XmlElement, out: &mut String) {
    for child in parent.elements() {
        match child.name.as_str() {
            "r" => render_run(child, out),
            "hyperlink" => render_runs(child, out),
            _ => {},
        }
    }
}

fn render_run(run: &XmlElement, out: &mut String) {
    let props = run.child("rPr").map(parse_run_props).unwrap_or_default();

    let mut open = Vec::new();
    if props.bold == Some(true) {
        open.push(("strong", "</strong>"));
    }
    if props.italic == Some(true) {
        open.push(("em", "</em>"));
    }
    if props.underline == Some(true) {
        open.push(("u", "</u>"));
    }
    if props.strike == Some(true) {
        open.push(("s", "</s>"));
    }

    for child in run.elements() {
        match child.name.as_str() {
            "t" => {
                let text = child.text();
                if text.is_empty() {
                    continue;
                }
                for (tag, _) in &open {
                    out.push('<');
                    out.push_str(tag);
                    out.push('>');
                }
                out.push_str(&escape_html(&text));
                for (_, close) in open.iter().rev() {
                    out.push_str(close);
                }
            },
            "br" => out.push_str("<br>"),
            _ => {},
        }
    }
}

fn render_table(tbl: &XmlElement, out: &mut String) {
    out.push_str("<table>");
    for tr in tbl.children_named("tr") {
        out.push_str("<tr>");
        for tc in tr.children_named("tc") {
            out.push_str("<td>");
            for p in tc.children_named("p") {
                render_runs(p, out);
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_map() {
        assert_eq!(map_style_to_tag("Heading 1"), Some("h1"));
        assert_eq!(map_style_to_tag("heading2"), Some("h2"));
        assert_eq!(map_style_to_tag("标题 3"), Some("h3"));
        assert_eq!(map_style_to_tag("Block Text"), Some("blockquote"));
        assert_eq!(map_style_to_tag("Code"), Some("pre"));
        assert_eq!(map_style_to_tag("Normal"), None);
    }
}
