//! Structural tree conversion: the document body against the four
//! registries.
//!
//! This is the primary, most general import strategy and the only one that
//! is pure computation, which is what allows it to run on a background
//! worker. For every paragraph the converter resolves styling through the
//! precedence direct properties > named style > document defaults,
//! classifies the block (heading, list item, plain paragraph) and converts
//! runs with the explicit-off rule: a direct `off` always wins over an
//! inherited `on`. Unknown node kinds are skipped, never fatal.

use crate::common::diagnostics::{Diagnostic, DiagnosticKind};
use crate::common::error::Result;
use crate::common::units;
use crate::docx::fonts::FontRegistry;
use crate::docx::images::ImageRegistry;
use crate::docx::model::{
    Block, DocumentModel, FirstLineIndent, ImageSpan, Inline, LineHeight, ParagraphBlock,
    RunPosition, RunSpan, RunStyle, TableBlock, TableCell, TableRow,
};
use crate::docx::numbering::NumberingRegistry;
use crate::docx::package::{DocxPackage, part_names};
use crate::docx::styles::{
    LineRule, ParaProps, RunProps, StyleRegistry, VertAlign, parse_para_props, parse_run_props,
};
use crate::docx::xmltree::XmlElement;
use crate::html::color::{highlight_to_hex, normalize_color};
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum render width for imported images, in pixels. This is the usable
/// width of an A4 editor page (794 px) minus margins and some slack.
pub const MAX_IMAGE_WIDTH_PX: u32 = 540;

/// Heading styles named like `Heading1`, `heading 2` or the CJK `标题1`.
static HEADING_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:heading|标题)\s?([1-9])$").expect("heading style regex"));

/// Outline-ish styles (`H1`, `Title`, `TOC1`) that imply a heading.
static OUTLINE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:H[1-6]|Title|TOC)").expect("outline style regex"));

/// Converts one document body into a [`DocumentModel`].
///
/// Holds references to the four registries; all of them must be fully built
/// before conversion starts.
pub struct StructuralConverter<'a> {
    styles: &'a StyleRegistry,
    numbering: &'a NumberingRegistry,
    fonts: &'a FontRegistry,
    images: &'a ImageRegistry,
    max_image_width: u32,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> StructuralConverter<'a> {
    /// Create a converter over fully built registries.
    pub fn new(
        styles: &'a StyleRegistry,
        numbering: &'a NumberingRegistry,
        fonts: &'a FontRegistry,
        images: &'a ImageRegistry,
    ) -> Self {
        Self {
            styles,
            numbering,
            fonts,
            images,
            max_image_width: MAX_IMAGE_WIDTH_PX,
            diagnostics: Vec::new(),
        }
    }

    /// Override the image width cap.
    pub fn with_max_image_width(mut self, px: u32) -> Self {
        self.max_image_width = px;
        self
    }

    /// Convert a document body part.
    pub fn convert(mut self, document_xml: &[u8]) -> Result<(DocumentModel, Vec<Diagnostic>)> {
        let root = XmlElement::parse(document_xml)?;

        let body = match root.child("body") {
            Some(body) => body,
            None => {
                // Non-standard producers nest the body; search for it before
                // giving up.
                let found = root.descendant("body");
                if found.is_some() {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::ParseDegraded,
                        "document body found outside its standard location",
                    ));
                }
                found.ok_or_else(|| {
                    crate::common::error::Error::Parse(
                        "document has no body element".to_string(),
                    )
                })?
            },
        };

        let blocks = self.convert_body(body);
        Ok((DocumentModel { blocks }, self.diagnostics))
    }

    fn convert_body(&mut self, body: &XmlElement) -> Vec<Block> {
        let mut blocks = Vec::new();
        for child in body.elements() {
            match child.name.as_str() {
                "p" => blocks.push(self.convert_paragraph(child)),
                "tbl" => blocks.push(Block::Table(self.convert_table(child))),
                // Section properties, bookmarks and structured document tags
                // carry no block content of their own.
                "sectPr" | "bookmarkStart" | "bookmarkEnd" => {},
                "sdt" => {
                    // Unwrap content controls into their inner blocks.
                    if let Some(content) = child.child("sdtContent") {
                        blocks.extend(self.convert_body(content));
                    }
                },
                other => {
                    log::debug!("skipping unknown body element <{other}>");
                },
            }
        }
        blocks
    }

    /// Convert one paragraph element into the block it classifies as.
    fn convert_paragraph(&mut self, p: &XmlElement) -> Block {
        let direct = p.child("pPr").map(parse_para_props).unwrap_or_default();

        // Direct properties > named style > document defaults.
        let mut effective = self.styles.default_para().clone();
        if let Some(style_id) = direct.style_id.as_deref() {
            effective.apply(&self.styles.chain_para(style_id));
        }
        effective.apply(&direct);

        let content = self.paragraph_content(p, direct.style_id.as_deref(), &effective);

        if let Some(level) = self.heading_level(&direct, &effective) {
            return Block::heading(level, content);
        }

        if let Some(numbering) = effective.numbering
            // numId 0 is the container's way of removing inherited numbering.
            && numbering.num_id != 0
        {
            let ordered = self
                .numbering
                .is_ordered(numbering.num_id, numbering.level)
                .unwrap_or(false);
            return Block::ListItem {
                level: numbering.level,
                ordered,
                content,
            };
        }

        Block::Paragraph(content)
    }

    /// Determine a heading level from the style name pattern or the outline
    /// level property. Levels outside 1..=6 do not classify as headings.
    fn heading_level(&self, direct: &ParaProps, effective: &ParaProps) -> Option<u8> {
        if let Some(style_id) = direct.style_id.as_deref() {
            for candidate in [Some(style_id), self.styles.style_name(style_id)]
                .into_iter()
                .flatten()
            {
                if let Some(caps) = HEADING_STYLE.captures(candidate) {
                    let level: u8 = caps[1].parse().ok()?;
                    return (1..=6).contains(&level).then_some(level);
                }
                if OUTLINE_STYLE.is_match(candidate) {
                    let level = candidate
                        .chars()
                        .find(|c| c.is_ascii_digit())
                        .and_then(|c| c.to_digit(10))
                        .unwrap_or(1) as u8;
                    return (1..=6).contains(&level).then_some(level);
                }
            }
        }

        let level = effective.outline_level? + 1;
        (1..=6).contains(&level).then_some(level)
    }

    /// Build paragraph content: resolved attributes plus inline spans.
    fn paragraph_content(
        &mut self,
        p: &XmlElement,
        style_id: Option<&str>,
        effective: &ParaProps,
    ) -> ParagraphBlock {
        let mut block = ParagraphBlock {
            alignment: effective.alignment,
            first_line_indent: first_line_indent(effective),
            line_height: line_height(effective),
            inlines: Vec::new(),
        };

        // Base run properties inherited from the paragraph style chain.
        let mut inherited = self.styles.default_run().clone();
        if let Some(style_id) = style_id {
            inherited.apply(&self.styles.chain_run(style_id));
        }

        self.collect_inlines(p, &inherited, &mut block.inlines);
        block
    }

    /// Walk a paragraph's children collecting runs, hyperlink runs and any
    /// nested content controls.
    fn collect_inlines(
        &mut self,
        parent: &XmlElement,
        inherited: &RunProps,
        inlines: &mut Vec<Inline>,
    ) {
        for child in parent.elements() {
            match child.name.as_str() {
                "r" => self.convert_run(child, inherited, inlines),
                "hyperlink" | "smartTag" | "sdt" | "sdtContent" | "ins" => {
                    self.collect_inlines(child, inherited, inlines);
                },
                _ => {},
            }
        }
    }

    /// Convert one run element, appending its inline content.
    fn convert_run(&mut self, run: &XmlElement, inherited: &RunProps, inlines: &mut Vec<Inline>) {
        let mut props = inherited.clone();
        if let Some(rpr) = run.child("rPr") {
            if let Some(r_style) = rpr.child("rStyle").and_then(|e| e.val()) {
                props.apply(&self.styles.chain_run(r_style));
            }
            props.apply(&parse_run_props(rpr));
        }
        let style = self.finish_run_style(&props);

        for child in run.elements() {
            match child.name.as_str() {
                "t" => {
                    let text = child.text();
                    if !text.is_empty() {
                        inlines.push(Inline::Run(RunSpan {
                            text,
                            style: style.clone(),
                        }));
                    }
                },
                "br" => inlines.push(Inline::Break),
                "tab" => inlines.push(Inline::Tab),
                "drawing" => {
                    if let Some(image) = self.image_from_drawing(child) {
                        inlines.push(Inline::Image(image));
                    }
                },
                "pict" | "object" => {
                    if let Some(image) = self.image_from_shape(child) {
                        inlines.push(Inline::Image(image));
                    }
                },
                _ => {},
            }
        }
    }

    /// Turn layered run properties into a resolved render style.
    fn finish_run_style(&self, props: &RunProps) -> RunStyle {
        RunStyle {
            bold: props.bold.unwrap_or(false),
            italic: props.italic.unwrap_or(false),
            underline: props.underline.unwrap_or(false),
            strike: props.strike.unwrap_or(false),
            color: props.color.as_deref().and_then(normalize_color),
            background: props.highlight.as_deref().and_then(|name| {
                highlight_to_hex(name)
                    .map(str::to_string)
                    .or_else(|| normalize_color(name))
            }),
            font_family: props
                .font_family()
                .map(|name| self.fonts.resolve(name).to_string()),
            size_points: props
                .size_half_points
                .map(units::half_points_to_points),
            position: props.vert_align.map(|v| match v {
                VertAlign::Superscript => RunPosition::Superscript,
                VertAlign::Subscript => RunPosition::Subscript,
            }),
        }
    }

    /// Resolve an inline or anchored drawing through the image registry.
    fn image_from_drawing(&mut self, drawing: &XmlElement) -> Option<ImageSpan> {
        let container = drawing
            .child("inline")
            .or_else(|| drawing.child("anchor"))?;

        let rel_id = container.descendant("blip")?.attr("embed")?;
        let extent = container.child("extent");
        let width = extent
            .and_then(|e| e.attr("cx"))
            .and_then(|v| v.parse::<i64>().ok())
            .map(units::emu_to_px)
            .filter(|&px| px > 0);
        let height = extent
            .and_then(|e| e.attr("cy"))
            .and_then(|v| v.parse::<i64>().ok())
            .map(units::emu_to_px)
            .filter(|&px| px > 0);

        self.resolve_image(rel_id, width, height)
    }

    /// Resolve a legacy VML picture or embedded object.
    fn image_from_shape(&mut self, shape: &XmlElement) -> Option<ImageSpan> {
        let image_data = shape.descendant("imagedata")?;
        let rel_id = image_data.attr("id").or_else(|| image_data.attr("relid"))?;
        self.resolve_image(rel_id, None, None)
    }

    fn resolve_image(
        &mut self,
        rel_id: &str,
        width: Option<i64>,
        height: Option<i64>,
    ) -> Option<ImageSpan> {
        match self.images.get(rel_id) {
            Some(src) => Some(ImageSpan {
                src: src.to_string(),
                width_px: width.map(|w| (w as u32).min(self.max_image_width)),
                height_px: height.map(|h| h as u32),
            }),
            None => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::ImageMissing,
                    format!("no media bound to relationship {rel_id}; image omitted"),
                ));
                None
            },
        }
    }

    /// Convert a table, row by row, cell by cell.
    fn convert_table(&mut self, tbl: &XmlElement) -> TableBlock {
        let mut table = TableBlock::default();

        for tr in tbl.children_named("tr") {
            let mut row = TableRow::default();
            for tc in tr.children_named("tc") {
                row.cells.push(self.convert_cell(tc));
            }
            if !row.cells.is_empty() {
                table.rows.push(row);
            }
        }

        table
    }

    fn convert_cell(&mut self, tc: &XmlElement) -> TableCell {
        let mut cell = TableCell {
            col_span: 1,
            ..TableCell::default()
        };

        if let Some(tc_pr) = tc.child("tcPr") {
            if let Some(span) = tc_pr
                .child("gridSpan")
                .and_then(|e| e.val())
                .and_then(|v| v.parse::<u32>().ok())
            {
                cell.col_span = span.max(1);
            }
            if let Some(fill) = tc_pr.child("shd").and_then(|e| e.attr("fill"))
                && fill != "auto"
            {
                cell.shading = normalize_color(fill);
            }
            cell.vertical_align = tc_pr
                .child("vAlign")
                .and_then(|e| e.val())
                .and_then(|v| match v {
                    "top" => Some("top"),
                    "center" => Some("middle"),
                    "bottom" => Some("bottom"),
                    _ => None,
                })
                .map(str::to_string);
        }

        for child in tc.elements() {
            match child.name.as_str() {
                "p" => {
                    let block = self.convert_paragraph(child);
                    cell.blocks.push(block);
                },
                "tbl" => cell.blocks.push(Block::Table(self.convert_table(child))),
                _ => {},
            }
        }

        cell
    }
}

fn first_line_indent(props: &ParaProps) -> Option<FirstLineIndent> {
    // The character-relative unit wins when both are present.
    if let Some(chars) = props.first_line_chars {
        return Some(FirstLineIndent::Em(units::char_hundredths_to_em(chars)));
    }
    props
        .first_line_twips
        .map(|twips| FirstLineIndent::Points(units::twips_to_points(twips)))
}

fn line_height(props: &ParaProps) -> Option<LineHeight> {
    props.line.map(|spacing| match spacing.rule {
        LineRule::Exact | LineRule::AtLeast => {
            LineHeight::Points(units::twips_to_points(spacing.value))
        },
        LineRule::Auto => LineHeight::Multiple(units::line_units_to_multiple(spacing.value)),
    })
}

/// Run the full structural pipeline over an opened package: build the four
/// registries, then convert the body. Progress labels mirror the stages a
/// UI wants to show.
pub fn convert_package(
    pkg: &DocxPackage,
    progress: &mut dyn FnMut(u8, &str),
) -> Result<(DocumentModel, Vec<Diagnostic>)> {
    let mut diagnostics = Vec::new();

    progress(20, "parsing numbering definitions");
    let numbering = match pkg.part(part_names::NUMBERING) {
        Some(xml) => NumberingRegistry::from_part(xml).unwrap_or_else(|e| {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::ParseDegraded,
                format!("numbering part unreadable: {e}"),
            ));
            NumberingRegistry::empty()
        }),
        None => NumberingRegistry::empty(),
    };

    progress(30, "parsing style definitions");
    let styles = match pkg.part(part_names::STYLES) {
        Some(xml) => StyleRegistry::from_part(xml).unwrap_or_else(|e| {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::ParseDegraded,
                format!("styles part unreadable: {e}"),
            ));
            StyleRegistry::empty()
        }),
        None => StyleRegistry::empty(),
    };

    progress(40, "parsing font table");
    let fonts = match pkg.part(part_names::FONT_TABLE) {
        Some(xml) => FontRegistry::from_part(xml).unwrap_or_else(|e| {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::ParseDegraded,
                format!("font table unreadable: {e}"),
            ));
            FontRegistry::empty()
        }),
        None => FontRegistry::empty(),
    };

    progress(50, "resolving embedded images");
    let images = ImageRegistry::from_package(pkg, &mut diagnostics);

    progress(60, "converting document body");
    let document_xml = pkg.part(part_names::DOCUMENT).ok_or_else(|| {
        crate::common::error::Error::CorruptContainer("missing document body part".to_string())
    })?;

    let converter = StructuralConverter::new(&styles, &numbering, &fonts, &images);
    let (model, mut convert_diags) = converter.convert(document_xml)?;
    diagnostics.append(&mut convert_diags);

    Ok((model, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_body_xml(body: &str) -> DocumentModel {
        let xml = format!(
            r#"<w:document xmlns:w="ns"><w:body>{body}</w:body></w:document>"#
        );
        let styles = StyleRegistry::empty();
        let numbering = NumberingRegistry::empty();
        let fonts = FontRegistry::empty();
        let images = ImageRegistry::empty();
        let converter = StructuralConverter::new(&styles, &numbering, &fonts, &images);
        converter.convert(xml.as_bytes()).unwrap().0
    }

    #[test]
    fn test_plain_paragraph() {
        let model = convert_body_xml(r#"<w:p><w:r><w:t>hello</w:t></w:r></w:p>"#);
        assert_eq!(model.len(), 1);
        match &model.blocks[0] {
            Block::Paragraph(p) => assert_eq!(p.text(), "hello"),
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_off_beats_inherited_on() {
        let styles = StyleRegistry::from_part(
            br#"<w:styles xmlns:w="ns">
                <w:style w:styleId="Strong"><w:rPr><w:b/></w:rPr></w:style>
            </w:styles>"#,
        )
        .unwrap();
        let numbering = NumberingRegistry::empty();
        let fonts = FontRegistry::empty();
        let images = ImageRegistry::empty();
        let converter = StructuralConverter::new(&styles, &numbering, &fonts, &images);

        let xml = br#"<w:document xmlns:w="ns"><w:body>
            <w:p>
              <w:pPr><w:pStyle w:val="Strong"/></w:pPr>
              <w:r><w:t>still bold</w:t></w:r>
              <w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>not bold</w:t></w:r>
            </w:p>
        </w:body></w:document>"#;
        let (model, _) = converter.convert(xml).unwrap();

        let Block::Paragraph(p) = &model.blocks[0] else {
            panic!("expected paragraph");
        };
        let runs: Vec<_> = p
            .inlines
            .iter()
            .filter_map(|i| match i {
                Inline::Run(r) => Some(r),
                _ => None,
            })
            .collect();
        assert!(runs[0].style.bold);
        assert!(!runs[1].style.bold);
    }

    #[test]
    fn test_heading_from_style_name() {
        let model = convert_body_xml(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>t</w:t></w:r></w:p>"#,
        );
        match &model.blocks[0] {
            Block::Heading { level, .. } => assert_eq!(*level, 2),
            other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn test_outline_level_out_of_range_is_not_heading() {
        let styles = StyleRegistry::from_part(
            br#"<w:styles xmlns:w="ns">
                <w:style w:styleId="Deep"><w:pPr><w:outlineLvl w:val="8"/></w:pPr></w:style>
            </w:styles>"#,
        )
        .unwrap();
        let numbering = NumberingRegistry::empty();
        let fonts = FontRegistry::empty();
        let images = ImageRegistry::empty();
        let converter = StructuralConverter::new(&styles, &numbering, &fonts, &images);

        let xml = br#"<w:document xmlns:w="ns"><w:body>
            <w:p><w:pPr><w:pStyle w:val="Deep"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let (model, _) = converter.convert(xml).unwrap();
        assert!(matches!(model.blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn test_hyperlink_runs_contribute() {
        let model = convert_body_xml(
            r#"<w:p><w:hyperlink><w:r><w:t>linked</w:t></w:r></w:hyperlink></w:p>"#,
        );
        let Block::Paragraph(p) = &model.blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.text(), "linked");
    }

    #[test]
    fn test_table_grid_span() {
        let model = convert_body_xml(
            r#"<w:tbl>
                <w:tr><w:tc><w:p/></w:tc><w:tc><w:p/></w:tc></w:tr>
                <w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p/></w:tc></w:tr>
            </w:tbl>"#,
        );
        let Block::Table(table) = &model.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[1].cells.len(), 1);
        assert_eq!(table.rows[1].cells[0].col_span, 2);
    }

    #[test]
    fn test_unknown_body_elements_are_skipped() {
        let model = convert_body_xml(
            r#"<w:altChunk/><w:p><w:r><w:t>kept</w:t></w:r></w:p><w:customXml/>"#,
        );
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_missing_image_is_omitted() {
        let styles = StyleRegistry::empty();
        let numbering = NumberingRegistry::empty();
        let fonts = FontRegistry::empty();
        let images = ImageRegistry::empty();
        let converter = StructuralConverter::new(&styles, &numbering, &fonts, &images);

        let xml = br#"<w:document xmlns:w="ns"><w:body><w:p><w:r>
            <w:drawing><wp:inline>
              <wp:extent cx="914400" cy="914400"/>
              <a:graphic><a:graphicData><pic:pic><pic:blipFill>
                <a:blip r:embed="rId9"/>
              </pic:blipFill></pic:pic></a:graphicData></a:graphic>
            </wp:inline></w:drawing>
        </w:r></w:p></w:body></w:document>"#;
        let (model, diags) = converter.convert(xml).unwrap();

        let Block::Paragraph(p) = &model.blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(p.inlines.is_empty());
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::ImageMissing));
    }
}
