//! Rendering the document model to a flat HTML fragment.
//!
//! Output is assembled in document order into one string: paragraphs and
//! headings with inline styles, consecutive list items grouped into nested
//! lists, tables with word-wrap-safe cell styling, images as data URIs. No
//! element classes are emitted; the editor consumes inline styles only.

use crate::common::units;
use crate::docx::model::{
    Block, DocumentModel, FirstLineIndent, ImageSpan, Inline, LineHeight, ParagraphBlock,
    RunPosition, RunSpan, TableBlock,
};
use crate::html::escape::escape_html;
use once_cell::sync::Lazy;
use regex::Regex;

static EMPTY_SPANS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span(?: style="")?>\s*</span>"#).expect("empty span regex"));

static SPACER_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(<p[^>]*><br></p>\s*){2,}").expect("spacer run regex"));

/// Render a full document model to HTML.
pub fn render_document(model: &DocumentModel) -> String {
    let mut out = String::with_capacity(4096);
    let mut index = 0;

    while index < model.blocks.len() {
        match &model.blocks[index] {
            Block::ListItem { .. } => {
                // Group the consecutive run of list items into one list tree.
                let start = index;
                while index < model.blocks.len()
                    && matches!(model.blocks[index], Block::ListItem { .. })
                {
                    index += 1;
                }
                render_list_run(&model.blocks[start..index], &mut out);
            },
            block => {
                render_block(block, &mut out);
                index += 1;
            },
        }
    }

    optimize_html(&out)
}

fn render_block(block: &Block, out: &mut String) {
    match block {
        Block::Paragraph(content) => render_paragraph(content, "p", out),
        Block::Heading { level, content } => {
            let mut buf = itoa::Buffer::new();
            let tag = ["h", buf.format(*level)].concat();
            render_paragraph(content, &tag, out);
        },
        Block::Table(table) => render_table(table, out),
        // Callers group list items before reaching here; a stray one
        // renders as a single-item list.
        Block::ListItem { .. } => {
            render_list_run(std::slice::from_ref(block), out);
        },
    }
}

fn render_paragraph(content: &ParagraphBlock, tag: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    let style = paragraph_style(content);
    if !style.is_empty() {
        out.push_str(" style=\"");
        out.push_str(&style);
        out.push('"');
    }
    out.push('>');

    if content.is_empty() && tag == "p" {
        out.push_str("<br>");
    } else {
        render_inlines(&content.inlines, out);
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Render inline spans without any block wrapper.
pub(crate) fn render_inlines(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Run(run) => render_run(run, out),
            Inline::Image(image) => render_image(image, out),
            Inline::Break => out.push_str("<br>"),
            Inline::Tab => out.push_str("&emsp;&emsp;"),
        }
    }
}

fn render_run(run: &RunSpan, out: &mut String) {
    let style = run_style(run);
    if style.is_empty() {
        out.push_str("<span>");
    } else {
        out.push_str("<span style=\"");
        out.push_str(&style);
        out.push_str("\">");
    }
    out.push_str(&escape_html(&run.text));
    out.push_str("</span>");
}

fn render_image(image: &ImageSpan, out: &mut String) {
    out.push_str("<img src=\"");
    out.push_str(&image.src);
    out.push_str("\" style=\"");
    if let Some(width) = image.width_px {
        let mut buf = itoa::Buffer::new();
        out.push_str("width: ");
        out.push_str(buf.format(width));
        out.push_str("px; ");
    }
    out.push_str("max-width: 100%; height: auto; display: block;\" />");
}

fn render_table(table: &TableBlock, out: &mut String) {
    out.push_str(
        "<table style=\"border-collapse: collapse; width: 100%; max-width: 100%; \
         table-layout: auto; margin: 1em 0;\">",
    );
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            out.push_str("<td");
            if cell.col_span > 1 {
                let mut buf = itoa::Buffer::new();
                out.push_str(" colspan=\"");
                out.push_str(buf.format(cell.col_span));
                out.push('"');
            }
            // Word-wrap-safe styling keeps long content from overflowing
            // the editor layout.
            out.push_str(
                " style=\"border: 1px solid #ddd; padding: 8px; word-wrap: break-word; \
                 overflow-wrap: break-word;",
            );
            if let Some(align) = &cell.vertical_align {
                out.push_str(" vertical-align: ");
                out.push_str(align);
                out.push(';');
            }
            if let Some(shading) = &cell.shading {
                out.push_str(" background-color: ");
                out.push_str(shading);
                out.push(';');
            }
            out.push_str("\">");

            if cell.blocks.iter().all(block_is_empty) {
                out.push_str("&nbsp;");
            } else {
                for block in &cell.blocks {
                    render_block(block, out);
                }
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
}

fn block_is_empty(block: &Block) -> bool {
    match block {
        Block::Paragraph(p) => p.is_empty(),
        Block::Heading { content, .. } | Block::ListItem { content, .. } => content.is_empty(),
        Block::Table(t) => t.rows.is_empty(),
    }
}

/// Render one consecutive run of list items as a nested list tree.
fn render_list_run(items: &[Block], out: &mut String) {
    let flattened: Vec<(u8, bool, &ParagraphBlock)> = items
        .iter()
        .filter_map(|block| match block {
            Block::ListItem {
                level,
                ordered,
                content,
            } => Some((*level, *ordered, content)),
            _ => None,
        })
        .collect();
    if !flattened.is_empty() {
        render_list_level(&flattened, flattened[0].0, out);
    }
}

fn render_list_level(items: &[(u8, bool, &ParagraphBlock)], level: u8, out: &mut String) {
    let ordered = items[0].1;
    out.push_str(if ordered { "<ol>" } else { "<ul>" });

    let mut index = 0;
    while index < items.len() {
        let (_, _, content) = items[index];
        out.push_str("<li>");
        render_inlines(&content.inlines, out);

        // Anything deeper that follows immediately nests inside this item.
        let nested_start = index + 1;
        let mut nested_end = nested_start;
        while nested_end < items.len() && items[nested_end].0 > level {
            nested_end += 1;
        }
        if nested_end > nested_start {
            render_list_level(&items[nested_start..nested_end], level + 1, out);
        }
        out.push_str("</li>");
        index = nested_end;
    }

    out.push_str(if ordered { "</ol>" } else { "</ul>" });
}

fn paragraph_style(content: &ParagraphBlock) -> String {
    let mut style = String::new();

    if let Some(alignment) = content.alignment {
        push_prop(&mut style, "text-align", alignment.as_css());
    }
    match content.first_line_indent {
        Some(FirstLineIndent::Points(pt)) => {
            push_prop(&mut style, "text-indent", &format_points(pt));
        },
        Some(FirstLineIndent::Em(em)) => {
            let mut value = format_number(em);
            value.push_str("em");
            push_prop(&mut style, "text-indent", &value);
        },
        None => {},
    }
    match content.line_height {
        Some(LineHeight::Points(pt)) => {
            push_prop(&mut style, "line-height", &format_points(pt));
        },
        Some(LineHeight::Multiple(multiple)) => {
            push_prop(&mut style, "line-height", &format!("{multiple:.2}"));
        },
        None => {},
    }

    style
}

fn run_style(run: &RunSpan) -> String {
    let style = &run.style;
    let mut out = String::new();

    if let Some(family) = &style.font_family {
        push_prop(&mut out, "font-family", &format!("\"{family}\""));
    }
    if let Some(points) = style.size_points
        && points > 0.0
    {
        push_prop(&mut out, "font-size", &format_points(points));
    }
    if let Some(color) = &style.color {
        push_prop(&mut out, "color", color);
    }
    if let Some(background) = &style.background {
        push_prop(&mut out, "background-color", background);
    }
    if style.bold {
        push_prop(&mut out, "font-weight", "bold");
    }
    if style.italic {
        push_prop(&mut out, "font-style", "italic");
    }
    match (style.underline, style.strike) {
        (true, true) => push_prop(&mut out, "text-decoration", "underline line-through"),
        (true, false) => push_prop(&mut out, "text-decoration", "underline"),
        (false, true) => push_prop(&mut out, "text-decoration", "line-through"),
        (false, false) => {},
    }
    match style.position {
        Some(RunPosition::Superscript) => {
            push_prop(&mut out, "vertical-align", "super");
            push_prop(&mut out, "font-size", "smaller");
        },
        Some(RunPosition::Subscript) => {
            push_prop(&mut out, "vertical-align", "sub");
            push_prop(&mut out, "font-size", "smaller");
        },
        None => {},
    }

    out
}

fn push_prop(style: &mut String, name: &str, value: &str) {
    if !style.is_empty() {
        style.push_str("; ");
    }
    style.push_str(name);
    style.push_str(": ");
    style.push_str(value);
}

/// Format a point value, dropping a trailing `.0`.
fn format_points(points: f64) -> String {
    let mut out = format_number(points);
    out.push_str("pt");
    out
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        let mut buf = itoa::Buffer::new();
        buf.format(value as i64).to_string()
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(value).to_string()
    }
}

/// Post-render cleanup: empty spans disappear and runs of spacer
/// paragraphs collapse to one.
pub fn optimize_html(html: &str) -> String {
    let html = EMPTY_SPANS.replace_all(html, "");
    let html = SPACER_RUNS.replace_all(&html, "<p><br></p>");
    html.into_owned()
}

/// Pixel equivalent of a run's font size, for tests and the heading
/// heuristics.
pub fn size_points_to_px(points: f64) -> f64 {
    units::points_to_px(points)
}
