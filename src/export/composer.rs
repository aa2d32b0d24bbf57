//! Composing editor HTML into an exportable block sequence.
//!
//! Walks the arena DOM node by node. Recognized containers map to blocks;
//! inline mark elements accumulate styling that lands on the leaf text
//! runs. Unrecognized nodes recurse into their children, and stray leaf
//! text becomes a plain paragraph - degraded, recorded, never dropped
//! silently.

use crate::common::diagnostics::{Diagnostic, DiagnosticKind};
use crate::common::units::css_length_to_px;
use crate::docx::styles::Alignment;
use crate::dom::{Dom, NodeData, NodeId, parse_fragment};
use crate::html::color::css_color_to_docx;
use crate::html::css;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::Regex;

static DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/(png|jpeg|jpg|gif|bmp);base64,(.+)$").expect("data uri regex")
});

/// Maximum exported image width in pixels (about six inches on the page).
pub const MAX_EXPORT_IMAGE_WIDTH: u32 = 600;

/// Which of the two generated numbering definitions a list paragraph uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// Accumulated inline marks applied to a leaf text run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMarks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub code: bool,
    pub superscript: bool,
    pub subscript: bool,
    /// `RRGGBB` without `#`
    pub color: Option<String>,
    /// `RRGGBB` without `#`
    pub background: Option<String>,
    /// Font size in half-points
    pub size_half_points: Option<u32>,
    pub font: Option<String>,
}

/// One leaf text run.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub marks: RunMarks,
}

/// One decoded image.
#[derive(Debug, Clone)]
pub struct DocImage {
    pub data: Vec<u8>,
    pub extension: &'static str,
    pub width_px: u32,
    pub height_px: u32,
}

/// Inline content of an exported paragraph.
#[derive(Debug, Clone)]
pub enum DocRun {
    Text(TextRun),
    Image(DocImage),
    Break,
}

/// One exported paragraph with its block-level attributes.
#[derive(Debug, Clone, Default)]
pub struct DocParagraph {
    /// Heading level 1..=6 when this paragraph is a heading
    pub heading: Option<u8>,
    pub alignment: Option<Alignment>,
    /// Numbering reference for list paragraphs
    pub numbering: Option<(ListKind, u8)>,
    /// Left indent in twips (blockquotes)
    pub indent_left_twips: Option<i64>,
    /// Colored left border (blockquotes)
    pub quote_border: bool,
    /// Paragraph shading in `RRGGBB` (code blocks)
    pub shading: Option<String>,
    pub runs: Vec<DocRun>,
}

/// One exported table cell.
#[derive(Debug, Clone, Default)]
pub struct DocTableCell {
    pub paragraphs: Vec<DocParagraph>,
    pub col_span: u32,
    pub row_span: u32,
    /// `RRGGBB`
    pub shading: Option<String>,
    /// `top`, `center` or `bottom`
    pub v_align: Option<&'static str>,
}

/// One exported table row.
#[derive(Debug, Clone, Default)]
pub struct DocTableRow {
    pub cells: Vec<DocTableCell>,
}

/// One exported table.
#[derive(Debug, Clone, Default)]
pub struct DocTable {
    pub rows: Vec<DocTableRow>,
}

/// A block in the exported document.
#[derive(Debug, Clone)]
pub enum DocBlock {
    Paragraph(DocParagraph),
    Table(DocTable),
    /// Hard page break
    PageBreak,
}

/// Compose editor HTML into the exportable block sequence.
pub fn compose(html: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<DocBlock> {
    let dom = parse_fragment(html);
    let mut blocks = Vec::new();

    if let Some(body) = dom.body() {
        for child in dom.children(body) {
            process_node(&dom, child, &mut blocks, diagnostics);
        }
    }

    // A document needs at least one paragraph to be a valid container.
    if blocks.is_empty() {
        blocks.push(DocBlock::Paragraph(DocParagraph::default()));
    }
    blocks
}

fn process_node(
    dom: &Dom,
    id: NodeId,
    blocks: &mut Vec<DocBlock>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Text(text) => {
            // Leaf text with no recognized container: best effort, never
            // dropped silently.
            if !text.trim().is_empty() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnsupportedNode,
                    "stray text outside any block element became a paragraph",
                ));
                blocks.push(DocBlock::Paragraph(DocParagraph {
                    runs: vec![DocRun::Text(TextRun {
                        text: text.trim().to_string(),
                        marks: RunMarks::default(),
                    })],
                    ..DocParagraph::default()
                }));
            }
        },
        NodeData::Element { name, .. } => {
            let tag = name.local.as_ref().to_ascii_lowercase();
            match tag.as_str() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    let level = tag.as_bytes()[1] - b'0';
                    let mut para = paragraph_from(dom, id);
                    para.heading = Some(level);
                    blocks.push(DocBlock::Paragraph(para));
                },
                "p" => blocks.push(DocBlock::Paragraph(paragraph_from(dom, id))),
                "ul" | "ol" => process_list(dom, id, 0, blocks),
                "table" => blocks.push(DocBlock::Table(process_table(dom, id))),
                "blockquote" => process_blockquote(dom, id, blocks),
                "pre" => process_code_block(dom, id, blocks),
                "img" => {
                    if let Some(image) = process_image(dom, id) {
                        blocks.push(DocBlock::Paragraph(DocParagraph {
                            runs: vec![DocRun::Image(image)],
                            ..DocParagraph::default()
                        }));
                    }
                },
                "br" => blocks.push(DocBlock::Paragraph(DocParagraph::default())),
                "hr" | "div" => {
                    if is_page_break(dom, id) {
                        blocks.push(DocBlock::PageBreak);
                    } else {
                        for child in dom.children(id) {
                            process_node(dom, child, blocks, diagnostics);
                        }
                    }
                },
                _ => {
                    // No mapping for this element: recurse into children so
                    // nothing inside is lost.
                    for child in dom.children(id) {
                        process_node(dom, child, blocks, diagnostics);
                    }
                },
            }
        },
        _ => {},
    }
}

fn is_page_break(dom: &Dom, id: NodeId) -> bool {
    let class_hit = dom
        .get_attr(id, "class")
        .is_some_and(|c| c.split_whitespace().any(|name| name == "page-break"));
    let data_hit = dom
        .get_attr(id, "data-type")
        .is_some_and(|t| t == "pageBreak" || t == "page-break");
    class_hit || data_hit
}

/// Build a paragraph from a block element's inline content.
fn paragraph_from(dom: &Dom, id: NodeId) -> DocParagraph {
    let mut para = DocParagraph {
        alignment: paragraph_alignment(dom, id),
        ..DocParagraph::default()
    };
    let base = marks_from_element(dom, id, &RunMarks::default());
    collect_runs(dom, id, &base, &mut para.runs);
    para
}

/// Alignment from inline style or the editor's text-align data attribute.
fn paragraph_alignment(dom: &Dom, id: NodeId) -> Option<Alignment> {
    let from_style = dom
        .get_attr(id, "style")
        .and_then(|style| css::get_prop(style, "text-align"));
    let value = from_style.or_else(|| dom.get_attr(id, "data-text-align").map(str::to_string))?;
    Alignment::from_xml(&value)
}

/// Recursively collect inline runs, accumulating marks down the tree.
fn collect_runs(dom: &Dom, id: NodeId, marks: &RunMarks, runs: &mut Vec<DocRun>) {
    for child in dom.children(id) {
        let Some(node) = dom.get(child) else {
            continue;
        };
        match &node.data {
            NodeData::Text(text) => {
                if !text.is_empty() {
                    runs.push(DocRun::Text(TextRun {
                        text: text.clone(),
                        marks: marks.clone(),
                    }));
                }
            },
            NodeData::Element { name, .. } => {
                let tag = name.local.as_ref().to_ascii_lowercase();
                match tag.as_str() {
                    "br" => runs.push(DocRun::Break),
                    "img" => {
                        if let Some(image) = process_image(dom, child) {
                            runs.push(DocRun::Image(image));
                        }
                    },
                    _ => {
                        let mut nested = marks_from_element(dom, child, marks);
                        apply_tag_marks(&tag, &mut nested);
                        collect_runs(dom, child, &nested, runs);
                    },
                }
            },
            _ => {},
        }
    }
}

/// Marks contributed by an element's tag.
fn apply_tag_marks(tag: &str, marks: &mut RunMarks) {
    match tag {
        "strong" | "b" => marks.bold = true,
        "em" | "i" => marks.italic = true,
        "u" => marks.underline = true,
        "s" | "del" | "strike" => marks.strike = true,
        "code" => marks.code = true,
        "sup" => marks.superscript = true,
        "sub" => marks.subscript = true,
        "mark" => marks.background = Some("FFFF00".to_string()),
        "a" => {
            // Links export as underlined blue text.
            marks.underline = true;
            marks.color = Some("0000FF".to_string());
        },
        _ => {},
    }
}

/// Marks contributed by an element's inline style.
fn marks_from_element(dom: &Dom, id: NodeId, parent: &RunMarks) -> RunMarks {
    let mut marks = parent.clone();
    let Some(style) = dom.get_attr(id, "style") else {
        return marks;
    };

    for (prop, value) in css::iter_props(style) {
        match prop.as_str() {
            "color" => {
                if let Some(color) = css_color_to_docx(&value) {
                    marks.color = Some(color);
                }
            },
            "background-color" => {
                if let Some(color) = css_color_to_docx(&value) {
                    marks.background = Some(color);
                }
            },
            "font-size" => {
                if let Some(half_points) = font_size_to_half_points(&value) {
                    marks.size_half_points = Some(half_points);
                }
            },
            "font-family" => {
                let family = value
                    .split(',')
                    .next()
                    .unwrap_or(&value)
                    .trim()
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_string();
                if !family.is_empty() {
                    marks.font = Some(family);
                }
            },
            "font-weight" => {
                if value == "bold" || value.parse::<u32>().is_ok_and(|w| w >= 600) {
                    marks.bold = true;
                }
            },
            "font-style" => {
                if value == "italic" {
                    marks.italic = true;
                }
            },
            "text-decoration" => {
                if value.contains("underline") {
                    marks.underline = true;
                }
                if value.contains("line-through") {
                    marks.strike = true;
                }
            },
            _ => {},
        }
    }
    marks
}

/// Convert a CSS font size to half-points. 1pt is two half-points; pixel
/// and em values go through their approximate point equivalents.
fn font_size_to_half_points(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Some(pt) = value.strip_suffix("pt") {
        return pt.trim().parse::<f64>().ok().map(|v| (v * 2.0).round() as u32);
    }
    if let Some(px) = value.strip_suffix("px") {
        return px.trim().parse::<f64>().ok().map(|v| (v * 1.5).round() as u32);
    }
    if let Some(em) = value.strip_suffix("rem").or_else(|| value.strip_suffix("em")) {
        return em.trim().parse::<f64>().ok().map(|v| (v * 24.0).round() as u32);
    }
    None
}

/// Decode a data-URI image, capping width at the page limit with the
/// height scaled proportionally. Non-data sources are not embeddable and
/// yield `None`.
fn process_image(dom: &Dom, id: NodeId) -> Option<DocImage> {
    let src = dom.get_attr(id, "src")?;
    let caps = DATA_URI.captures(src)?;

    let extension: &'static str = match &caps[1] {
        "jpeg" | "jpg" => "jpeg",
        "gif" => "gif",
        "bmp" => "bmp",
        _ => "png",
    };
    let data = BASE64.decode(caps[2].as_bytes()).ok()?;

    let mut width = attr_dimension(dom, id, "width").unwrap_or(400);
    let mut height = attr_dimension(dom, id, "height").unwrap_or(300);

    if width > MAX_EXPORT_IMAGE_WIDTH {
        let ratio = MAX_EXPORT_IMAGE_WIDTH as f64 / width as f64;
        width = MAX_EXPORT_IMAGE_WIDTH;
        height = ((height as f64) * ratio).round() as u32;
    }

    Some(DocImage {
        data,
        extension,
        width_px: width.max(1),
        height_px: height.max(1),
    })
}

/// Pixel dimension from an attribute or the inline style.
fn attr_dimension(dom: &Dom, id: NodeId, name: &str) -> Option<u32> {
    if let Some(value) = dom.get_attr(id, name)
        && let Some(px) = css_length_to_px(value)
        && px > 0.0
    {
        return Some(px.round() as u32);
    }
    let style = dom.get_attr(id, "style")?;
    let value = css::get_prop(style, name)?;
    css_length_to_px(&value)
        .filter(|&px| px > 0.0)
        .map(|px| px.round() as u32)
}

/// Walk a list element, one paragraph per item, recursing into nested
/// lists with an incremented level.
fn process_list(dom: &Dom, id: NodeId, level: u8, blocks: &mut Vec<DocBlock>) {
    let kind = match dom.element_name(id) {
        Some("ol") => ListKind::Ordered,
        // Task lists keep bullet glyphs.
        _ => ListKind::Bullet,
    };

    for li in dom.children(id) {
        if dom.element_name(li) != Some("li") {
            continue;
        }

        let mut para = DocParagraph {
            numbering: Some((kind, level)),
            ..DocParagraph::default()
        };
        let mut nested: Vec<(NodeId, u8)> = Vec::new();

        for child in dom.children(li) {
            match dom.element_name(child) {
                Some("ul") | Some("ol") => nested.push((child, level + 1)),
                Some("p") => {
                    let base = marks_from_element(dom, child, &RunMarks::default());
                    collect_runs(dom, child, &base, &mut para.runs);
                },
                Some("img") => {
                    if let Some(image) = process_image(dom, child) {
                        para.runs.push(DocRun::Image(image));
                    }
                },
                Some(_) => {
                    let base = marks_from_element(dom, child, &RunMarks::default());
                    let mut marks = base;
                    if let Some(tag) = dom.element_name(child) {
                        apply_tag_marks(tag, &mut marks);
                    }
                    collect_runs(dom, child, &marks, &mut para.runs);
                },
                None => {
                    if let Some(text) = dom.text_content(child) {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            para.runs.push(DocRun::Text(TextRun {
                                text: trimmed.to_string(),
                                marks: RunMarks::default(),
                            }));
                        }
                    }
                },
            }
        }

        if !para.runs.is_empty() {
            blocks.push(DocBlock::Paragraph(para));
        }
        for (list, next_level) in nested {
            process_list(dom, list, next_level, blocks);
        }
    }
}

/// Collect every row of a table, including rows nested in `thead`,
/// `tbody` and `tfoot` sections.
fn process_table(dom: &Dom, id: NodeId) -> DocTable {
    let mut table = DocTable::default();
    collect_rows(dom, id, &mut table);
    table
}

fn collect_rows(dom: &Dom, id: NodeId, table: &mut DocTable) {
    for child in dom.children(id) {
        match dom.element_name(child) {
            Some("tr") => {
                let row = process_row(dom, child);
                if !row.cells.is_empty() {
                    table.rows.push(row);
                }
            },
            Some("thead") | Some("tbody") | Some("tfoot") => collect_rows(dom, child, table),
            _ => {},
        }
    }
}

fn process_row(dom: &Dom, tr: NodeId) -> DocTableRow {
    let mut row = DocTableRow::default();

    for cell_node in dom.children(tr) {
        let tag = match dom.element_name(cell_node) {
            Some(tag @ ("td" | "th")) => tag,
            _ => continue,
        };
        let is_header = tag == "th";

        let mut cell = DocTableCell {
            col_span: span_attr(dom, cell_node, "colspan"),
            row_span: span_attr(dom, cell_node, "rowspan"),
            ..DocTableCell::default()
        };

        let style = dom.get_attr(cell_node, "style").unwrap_or_default();
        cell.shading = css::get_prop(style, "background-color")
            .and_then(|c| css_color_to_docx(&c))
            .or_else(|| is_header.then(|| "F5F5F5".to_string()));

        let v_align = css::get_prop(style, "vertical-align")
            .or_else(|| dom.get_attr(cell_node, "data-vertical-align").map(str::to_string));
        cell.v_align = match v_align.as_deref() {
            Some("middle") => Some("center"),
            Some("bottom") => Some("bottom"),
            _ => None,
        };

        let base = RunMarks {
            bold: is_header,
            ..RunMarks::default()
        };
        for child in dom.children(cell_node) {
            match dom.element_name(child) {
                Some("p") => {
                    let mut para = DocParagraph {
                        alignment: paragraph_alignment(dom, child),
                        ..DocParagraph::default()
                    };
                    let marks = marks_from_element(dom, child, &base);
                    collect_runs(dom, child, &marks, &mut para.runs);
                    cell.paragraphs.push(para);
                },
                Some("img") => {
                    if let Some(image) = process_image(dom, child) {
                        cell.paragraphs.push(DocParagraph {
                            runs: vec![DocRun::Image(image)],
                            ..DocParagraph::default()
                        });
                    }
                },
                Some(_) => {
                    let mut para = DocParagraph::default();
                    collect_runs(dom, child, &base, &mut para.runs);
                    if !para.runs.is_empty() {
                        cell.paragraphs.push(para);
                    }
                },
                None => {
                    if let Some(text) = dom.text_content(child) {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            cell.paragraphs.push(DocParagraph {
                                runs: vec![DocRun::Text(TextRun {
                                    text: trimmed.to_string(),
                                    marks: base.clone(),
                                })],
                                ..DocParagraph::default()
                            });
                        }
                    }
                },
            }
        }

        if cell.paragraphs.is_empty() {
            cell.paragraphs.push(DocParagraph::default());
        }
        row.cells.push(cell);
    }

    row
}

fn span_attr(dom: &Dom, id: NodeId, name: &str) -> u32 {
    dom.get_attr(id, name)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&v| v >= 1)
        .unwrap_or(1)
}

/// Blockquote paragraphs: indented, italic gray text with a colored left
/// border.
fn process_blockquote(dom: &Dom, id: NodeId, blocks: &mut Vec<DocBlock>) {
    let quote_marks = RunMarks {
        italic: true,
        color: Some("666666".to_string()),
        ..RunMarks::default()
    };

    let mut emitted = false;
    for child in dom.children(id) {
        let mut para = DocParagraph {
            indent_left_twips: Some(720),
            quote_border: true,
            ..DocParagraph::default()
        };
        match dom.element_name(child) {
            Some(_) => {
                para.alignment = paragraph_alignment(dom, child);
                let marks = marks_from_element(dom, child, &quote_marks);
                collect_runs(dom, child, &marks, &mut para.runs);
            },
            None => {
                if let Some(text) = dom.text_content(child) {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        para.runs.push(DocRun::Text(TextRun {
                            text: trimmed.to_string(),
                            marks: quote_marks.clone(),
                        }));
                    }
                }
            },
        }
        if !para.runs.is_empty() {
            blocks.push(DocBlock::Paragraph(para));
            emitted = true;
        }
    }

    if !emitted {
        // Keep the quote visible even when empty.
        blocks.push(DocBlock::Paragraph(DocParagraph {
            indent_left_twips: Some(720),
            quote_border: true,
            ..DocParagraph::default()
        }));
    }
}

/// Code blocks: one shaded monospace paragraph per source line.
fn process_code_block(dom: &Dom, id: NodeId, blocks: &mut Vec<DocBlock>) {
    let text = dom.text_of_subtree(id);
    let text = text.strip_suffix('\n').unwrap_or(&text);

    for line in text.split('\n') {
        blocks.push(DocBlock::Paragraph(DocParagraph {
            shading: Some("1F2937".to_string()),
            runs: vec![DocRun::Text(TextRun {
                // An empty line still needs a run to keep its height.
                text: if line.is_empty() { " ".to_string() } else { line.to_string() },
                marks: RunMarks {
                    font: Some("Consolas".to_string()),
                    ..RunMarks::default()
                },
            })],
            ..DocParagraph::default()
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose_ok(html: &str) -> Vec<DocBlock> {
        let mut diagnostics = Vec::new();
        compose(html, &mut diagnostics)
    }

    fn paragraphs(blocks: &[DocBlock]) -> Vec<&DocParagraph> {
        blocks
            .iter()
            .filter_map(|b| match b {
                DocBlock::Paragraph(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_heading_levels() {
        let blocks = compose_ok("<h2>Title</h2>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].heading, Some(2));
    }

    #[test]
    fn test_nested_marks_accumulate() {
        let blocks = compose_ok("<p><strong><em>both</em></strong></p>");
        let paras = paragraphs(&blocks);
        let DocRun::Text(run) = &paras[0].runs[0] else {
            panic!("expected text run");
        };
        assert!(run.marks.bold);
        assert!(run.marks.italic);
        assert_eq!(run.text, "both");
    }

    #[test]
    fn test_span_style_color() {
        let blocks = compose_ok(r#"<p><span style="color: #FF0000">red</span></p>"#);
        let paras = paragraphs(&blocks);
        let DocRun::Text(run) = &paras[0].runs[0] else {
            panic!("expected text run");
        };
        assert_eq!(run.marks.color.as_deref(), Some("FF0000"));
    }

    #[test]
    fn test_link_styling() {
        let blocks = compose_ok(r#"<p><a href="https://example.com">site</a></p>"#);
        let paras = paragraphs(&blocks);
        let DocRun::Text(run) = &paras[0].runs[0] else {
            panic!("expected text run");
        };
        assert!(run.marks.underline);
        assert_eq!(run.marks.color.as_deref(), Some("0000FF"));
    }

    #[test]
    fn test_nested_list_levels() {
        let blocks = compose_ok(
            "<ul><li>a<ul><li>a1</li></ul></li><li>b</li></ul>",
        );
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 3);
        assert_eq!(paras[0].numbering, Some((ListKind::Bullet, 0)));
        assert_eq!(paras[1].numbering, Some((ListKind::Bullet, 1)));
        assert_eq!(paras[2].numbering, Some((ListKind::Bullet, 0)));
    }

    #[test]
    fn test_ordered_list_kind() {
        let blocks = compose_ok("<ol><li>one</li></ol>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].numbering, Some((ListKind::Ordered, 0)));
    }

    #[test]
    fn test_table_spans_and_header() {
        let blocks = compose_ok(
            r#"<table>
                <tr><th>H1</th><th>H2</th></tr>
                <tr><td colspan="2" rowspan="2">wide</td></tr>
            </table>"#,
        );
        let DocBlock::Table(table) = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 2);
        // Header cells get default shading and bold content.
        assert_eq!(table.rows[0].cells[0].shading.as_deref(), Some("F5F5F5"));
        let DocRun::Text(run) = &table.rows[0].cells[0].paragraphs[0].runs[0] else {
            panic!("expected text run");
        };
        assert!(run.marks.bold);
        assert_eq!(table.rows[1].cells[0].col_span, 2);
        assert_eq!(table.rows[1].cells[0].row_span, 2);
    }

    #[test]
    fn test_page_break_markers() {
        let blocks =
            compose_ok(r#"<p>a</p><div class="page-break" data-type="page-break"></div><p>b</p>"#);
        assert!(matches!(blocks[1], DocBlock::PageBreak));
    }

    #[test]
    fn test_image_decode_and_cap() {
        let png = BASE64.encode([137u8, 80, 78, 71]);
        let html = format!(
            r#"<p><img src="data:image/png;base64,{png}" width="1200" height="600"></p>"#
        );
        let blocks = compose_ok(&html);
        let paras = paragraphs(&blocks);
        let DocRun::Image(image) = &paras[0].runs[0] else {
            panic!("expected image run");
        };
        assert_eq!(image.width_px, 600);
        assert_eq!(image.height_px, 300);
        assert_eq!(image.extension, "png");
        assert_eq!(image.data, vec![137u8, 80, 78, 71]);
    }

    #[test]
    fn test_non_data_image_skipped() {
        let blocks = compose_ok(r#"<p><img src="https://example.com/x.png"></p>"#);
        let paras = paragraphs(&blocks);
        assert!(paras[0].runs.is_empty());
    }

    #[test]
    fn test_stray_text_becomes_paragraph() {
        let mut diagnostics = Vec::new();
        let blocks = compose("just text", &mut diagnostics);
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 1);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::UnsupportedNode)
        );
    }

    #[test]
    fn test_unknown_container_recurses() {
        let blocks = compose_ok("<section><p>inside</p></section>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 1);
    }

    #[test]
    fn test_code_block_lines() {
        let blocks = compose_ok("<pre><code>line1\nline2</code></pre>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].shading.as_deref(), Some("1F2937"));
        let DocRun::Text(run) = &paras[0].runs[0] else {
            panic!("expected text run");
        };
        assert_eq!(run.marks.font.as_deref(), Some("Consolas"));
    }

    #[test]
    fn test_blockquote_styling() {
        let blocks = compose_ok("<blockquote><p>quoted</p></blockquote>");
        let paras = paragraphs(&blocks);
        assert!(paras[0].quote_border);
        assert_eq!(paras[0].indent_left_twips, Some(720));
        let DocRun::Text(run) = &paras[0].runs[0] else {
            panic!("expected text run");
        };
        assert!(run.marks.italic);
        assert_eq!(run.marks.color.as_deref(), Some("666666"));
    }

    #[test]
    fn test_empty_input_yields_one_paragraph() {
        let blocks = compose_ok("");
        assert_eq!(blocks.len(), 1);
    }
}
