//! Heading heuristic normalizer.
//!
//! Many authoring tools write "headings" as plain paragraphs with a big
//! bold font and never set a heading style, so the structural pass finds no
//! heading to emit. When the converted output contains no heading element
//! at all, this pass promotes visually prominent paragraphs to semantic
//! headings based on their largest font size, boldness and centering.
//!
//! The pass is idempotent by construction: promoted output contains heading
//! tags, so a second run takes the early return.

use crate::common::units::{css_length_to_px, points_to_px};
use crate::dom::{Dom, NodeData, NodeId, parse_fragment, serialize_children};
use crate::html::css;
use once_cell::sync::Lazy;
use regex::Regex;

static HAS_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<h[1-6][\s>]").expect("heading presence regex"));

// Pixel thresholds, established empirically. Tunable in principle but
// deliberately not exposed as configuration.
const H1_MIN_PX: f64 = 29.0;
const H2_MIN_PX: f64 = 24.0;
const H3_MIN_PX: f64 = 20.0;
const H3_BOLD_MIN_PX: f64 = 18.0;
const H4_BOLD_MIN_PX: f64 = 17.0;
const H4_CENTERED_MIN_PX: f64 = 16.0;
const H5_BOLD_MIN_PX: f64 = 15.0;
const H6_BOLD_MIN_PX: f64 = 14.0;

/// Visual facts about one paragraph.
#[derive(Debug, Default)]
struct Prominence {
    /// Largest font size found anywhere inside, in pixels
    max_px: f64,
    /// Whether any contained run is bold
    bold: bool,
    /// Whether the paragraph is centered
    centered: bool,
}

/// Promote visually prominent paragraphs to headings when the fragment has
/// none. Returns the input unchanged when headings are already present.
pub fn normalize_headings(html: &str) -> String {
    if HAS_HEADING.is_match(html) {
        return html.to_string();
    }

    let mut dom = parse_fragment(html);
    let Some(body) = dom.body() else {
        return html.to_string();
    };

    let paragraphs: Vec<NodeId> = dom
        .children(body)
        .filter(|&id| dom.element_name(id) == Some("p"))
        .collect();

    let mut promoted_any = false;
    for p in paragraphs {
        let prominence = measure(&dom, p);
        if let Some(level) = heading_level(&prominence) {
            promote(&mut dom, p, level);
            promoted_any = true;
        }
    }

    if !promoted_any {
        return html.to_string();
    }
    serialize_children(&dom, body)
}

/// Map visual prominence to a heading level per the fixed thresholds.
fn heading_level(p: &Prominence) -> Option<u8> {
    let px = p.max_px;
    if px >= H1_MIN_PX {
        Some(1)
    } else if px >= H2_MIN_PX {
        Some(2)
    } else if px >= H3_MIN_PX || (px >= H3_BOLD_MIN_PX && p.bold) {
        Some(3)
    } else if (px >= H4_BOLD_MIN_PX && p.bold) || (px >= H4_CENTERED_MIN_PX && p.centered) {
        Some(4)
    } else if px >= H5_BOLD_MIN_PX && p.bold {
        Some(5)
    } else if px >= H6_BOLD_MIN_PX && p.bold {
        Some(6)
    } else {
        None
    }
}

/// Collect the maximum font size, boldness and centering of a paragraph.
fn measure(dom: &Dom, p: NodeId) -> Prominence {
    let mut prominence = Prominence::default();

    if let Some(style) = dom.get_attr(p, "style") {
        if let Some(align) = css::get_prop(style, "text-align") {
            prominence.centered = align.eq_ignore_ascii_case("center");
        }
    }
    if !prominence.centered && dom.get_attr(p, "data-text-align").is_some_and(|a| a == "center")
    {
        prominence.centered = true;
    }

    // Skip image-only paragraphs: they have no text to promote.
    if dom.text_of_subtree(p).trim().is_empty() {
        return prominence;
    }

    visit(dom, p, &mut prominence);
    prominence
}

fn visit(dom: &Dom, id: NodeId, prominence: &mut Prominence) {
    if let Some(node) = dom.get(id)
        && let NodeData::Element { name, .. } = &node.data
    {
        let tag = name.local.as_ref();
        if matches!(tag, "b" | "strong") {
            prominence.bold = true;
        }
        if let Some(style) = dom.get_attr(id, "style") {
            if let Some(size) = css::get_prop(style, "font-size")
                && let Some(px) = font_size_to_px(&size)
            {
                prominence.max_px = prominence.max_px.max(px);
            }
            if let Some(weight) = css::get_prop(style, "font-weight")
                && is_bold_weight(&weight)
            {
                prominence.bold = true;
            }
        }
    }

    for child in dom.children(id) {
        visit(dom, child, prominence);
    }
}

fn font_size_to_px(value: &str) -> Option<f64> {
    // Points dominate converted output; css_length_to_px handles the rest.
    if let Some(pt) = value.trim().strip_suffix("pt") {
        return pt.trim().parse::<f64>().ok().map(points_to_px);
    }
    css_length_to_px(value)
}

fn is_bold_weight(weight: &str) -> bool {
    match weight.trim() {
        "bold" | "bolder" => true,
        numeric => numeric.parse::<u32>().is_ok_and(|w| w >= 600),
    }
}

/// Rewrite a paragraph as the given heading: rename the tag, keep
/// alignment/color/font-family, and drop the now-redundant explicit font
/// sizes from the paragraph and every span inside it.
fn promote(dom: &mut Dom, p: NodeId, level: u8) {
    let tag = match level {
        1 => "h1",
        2 => "h2",
        3 => "h3",
        4 => "h4",
        5 => "h5",
        _ => "h6",
    };
    dom.rename_element(p, tag);
    strip_font_size(dom, p);
}

fn strip_font_size(dom: &mut Dom, id: NodeId) {
    if let Some(style) = dom.get_attr(id, "style") {
        let rewritten = css::remove_prop(style, "font-size");
        dom.set_attr(id, "style", &rewritten);
    }
    let children: Vec<NodeId> = dom.children(id).collect();
    for child in children {
        if dom.is_element(child) {
            strip_font_size(dom, child);
        }
    }
}
