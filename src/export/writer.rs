//! OOXML part writers: the block sequence becomes document XML.
//!
//! XML is assembled by string building, escaping text and attribute
//! values as they are written. Image runs allocate relationship ids as
//! they are encountered; the matching media files come back alongside the
//! document XML so the package writer can emit them and their
//! relationships together.

use crate::common::units::px_to_emu;
use crate::export::composer::{
    DocBlock, DocImage, DocParagraph, DocRun, DocTable, ListKind, TextRun,
};
use crate::export::numbering::{BULLET_NUM_ID, ORDERED_NUM_ID};
use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use std::fmt::Write as _;

static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape XML special characters.
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// A media part to be written into the package.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Path inside the package, e.g. `word/media/image1.png`
    pub path: String,
    /// File extension (drives the content-type default)
    pub extension: &'static str,
    /// Relationship id referenced from the document body
    pub rel_id: String,
    pub data: Vec<u8>,
}

/// First relationship id available for media; rId1 and rId2 are the
/// styles and numbering parts.
const FIRST_MEDIA_REL: usize = 3;

/// A4 page width in twips.
const PAGE_WIDTH_TWIPS: i64 = 11_906;
/// A4 page height in twips.
const PAGE_HEIGHT_TWIPS: i64 = 16_838;
/// One-inch page margins in twips.
const PAGE_MARGIN_TWIPS: i64 = 1_440;

/// Write the main document part; returns the XML and the media files the
/// body references.
pub fn write_document_xml(blocks: &[DocBlock]) -> (String, Vec<MediaFile>) {
    let mut xml = String::with_capacity(8192);
    let mut media: Vec<MediaFile> = Vec::new();

    xml.push_str(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<w:document",
        " xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"",
        " xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"",
        " xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\"",
        " xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\"",
        " xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
        "<w:body>",
    ));

    for block in blocks {
        match block {
            DocBlock::Paragraph(para) => write_paragraph(&mut xml, para, &mut media),
            DocBlock::Table(table) => write_table(&mut xml, table, &mut media),
            DocBlock::PageBreak => {
                xml.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>");
            },
        }
    }

    write_section_properties(&mut xml);
    xml.push_str("</w:body></w:document>");
    (xml, media)
}

fn write_section_properties(xml: &mut String) {
    let _ = write!(
        xml,
        "<w:sectPr>\
         <w:pgSz w:w=\"{PAGE_WIDTH_TWIPS}\" w:h=\"{PAGE_HEIGHT_TWIPS}\"/>\
         <w:pgMar w:top=\"{m}\" w:right=\"{m}\" w:bottom=\"{m}\" w:left=\"{m}\" \
         w:header=\"720\" w:footer=\"720\" w:gutter=\"0\"/>\
         </w:sectPr>",
        m = PAGE_MARGIN_TWIPS,
    );
}

fn write_paragraph(xml: &mut String, para: &DocParagraph, media: &mut Vec<MediaFile>) {
    xml.push_str("<w:p>");
    write_paragraph_properties(xml, para);
    for run in &para.runs {
        write_run(xml, run, media);
    }
    xml.push_str("</w:p>");
}

fn write_paragraph_properties(xml: &mut String, para: &DocParagraph) {
    let has_props = para.heading.is_some()
        || para.numbering.is_some()
        || para.quote_border
        || para.shading.is_some()
        || para.indent_left_twips.is_some()
        || para.alignment.is_some();
    if !has_props {
        return;
    }

    xml.push_str("<w:pPr>");
    if let Some(level) = para.heading {
        let _ = write!(xml, "<w:pStyle w:val=\"Heading{level}\"/>");
    }
    if let Some((kind, level)) = para.numbering {
        let num_id = match kind {
            ListKind::Bullet => BULLET_NUM_ID,
            ListKind::Ordered => ORDERED_NUM_ID,
        };
        let _ = write!(
            xml,
            "<w:numPr><w:ilvl w:val=\"{level}\"/><w:numId w:val=\"{num_id}\"/></w:numPr>"
        );
    }
    if para.quote_border {
        xml.push_str(
            "<w:pBdr><w:left w:val=\"single\" w:sz=\"24\" w:space=\"10\" \
             w:color=\"2563EB\"/></w:pBdr>",
        );
    }
    if let Some(fill) = &para.shading {
        let _ = write!(
            xml,
            "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{fill}\"/>"
        );
    }
    if let Some(left) = para.indent_left_twips {
        let _ = write!(xml, "<w:ind w:left=\"{left}\"/>");
    }
    if let Some(alignment) = para.alignment {
        let _ = write!(xml, "<w:jc w:val=\"{}\"/>", alignment.as_xml());
    }
    xml.push_str("</w:pPr>");
}

fn write_run(xml: &mut String, run: &DocRun, media: &mut Vec<MediaFile>) {
    match run {
        DocRun::Text(text_run) => write_text_run(xml, text_run),
        DocRun::Image(image) => write_image_run(xml, image, media),
        DocRun::Break => xml.push_str("<w:r><w:br/></w:r>"),
    }
}

fn write_text_run(xml: &mut String, run: &TextRun) {
    xml.push_str("<w:r>");

    let marks = &run.marks;
    let has_props = marks.bold
        || marks.italic
        || marks.underline
        || marks.strike
        || marks.code
        || marks.superscript
        || marks.subscript
        || marks.color.is_some()
        || marks.background.is_some()
        || marks.size_half_points.is_some()
        || marks.font.is_some();

    if has_props {
        xml.push_str("<w:rPr>");
        // Code runs render monospaced with a light shade, like the editor.
        if let Some(font) = marks.font.as_deref().or(marks.code.then_some("Consolas")) {
            let escaped = escape_xml(font);
            let _ = write!(
                xml,
                "<w:rFonts w:ascii=\"{escaped}\" w:hAnsi=\"{escaped}\"/>"
            );
        }
        if marks.bold {
            xml.push_str("<w:b/>");
        }
        if marks.italic {
            xml.push_str("<w:i/>");
        }
        if marks.strike {
            xml.push_str("<w:strike/>");
        }
        if marks.underline {
            xml.push_str("<w:u w:val=\"single\"/>");
        }
        if marks.superscript {
            xml.push_str("<w:vertAlign w:val=\"superscript\"/>");
        } else if marks.subscript {
            xml.push_str("<w:vertAlign w:val=\"subscript\"/>");
        }
        if let Some(color) = &marks.color {
            let _ = write!(xml, "<w:color w:val=\"{color}\"/>");
        }
        if let Some(size) = marks.size_half_points {
            let _ = write!(xml, "<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>");
        }
        if let Some(fill) = marks
            .background
            .as_deref()
            .or(marks.code.then_some("F3F4F6"))
        {
            let _ = write!(
                xml,
                "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{fill}\"/>"
            );
        }
        xml.push_str("</w:rPr>");
    }

    let _ = write!(
        xml,
        "<w:t xml:space=\"preserve\">{}</w:t>",
        escape_xml(&run.text)
    );
    xml.push_str("</w:r>");
}

fn write_image_run(xml: &mut String, image: &DocImage, media: &mut Vec<MediaFile>) {
    let index = media.len() + 1;
    let rel_id = format!("rId{}", FIRST_MEDIA_REL + media.len());
    let path = format!("word/media/image{index}.{}", image.extension);

    let cx = px_to_emu(image.width_px);
    let cy = px_to_emu(image.height_px);

    let _ = write!(
        xml,
        "<w:r><w:drawing>\
         <wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">\
         <wp:extent cx=\"{cx}\" cy=\"{cy}\"/>\
         <wp:docPr id=\"{index}\" name=\"Picture {index}\"/>\
         <a:graphic>\
         <a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">\
         <pic:pic>\
         <pic:nvPicPr>\
         <pic:cNvPr id=\"{index}\" name=\"Picture {index}\"/>\
         <pic:cNvPicPr/>\
         </pic:nvPicPr>\
         <pic:blipFill><a:blip r:embed=\"{rel_id}\"/><a:stretch><a:fillRect/></a:stretch>\
         </pic:blipFill>\
         <pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>\
         <a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>\
         </pic:pic>\
         </a:graphicData>\
         </a:graphic>\
         </wp:inline>\
         </w:drawing></w:r>"
    );

    media.push(MediaFile {
        path,
        extension: image.extension,
        rel_id,
        data: image.data.clone(),
    });
}

/// Active vertical merge: where it starts, how wide it is, and how many
/// continuation rows remain.
struct PendingMerge {
    col_start: u32,
    col_span: u32,
    remaining_rows: u32,
}

fn write_table(xml: &mut String, table: &DocTable, media: &mut Vec<MediaFile>) {
    let column_count = table
        .rows
        .iter()
        .map(|row| row.cells.iter().map(|c| c.col_span.max(1)).sum::<u32>())
        .max()
        .unwrap_or(1)
        .max(1);

    xml.push_str(
        "<w:tbl><w:tblPr>\
         <w:tblW w:w=\"5000\" w:type=\"pct\"/>\
         <w:tblLayout w:type=\"fixed\"/>\
         <w:tblBorders>\
         <w:top w:val=\"single\" w:sz=\"4\" w:color=\"DDDDDD\"/>\
         <w:left w:val=\"single\" w:sz=\"4\" w:color=\"DDDDDD\"/>\
         <w:bottom w:val=\"single\" w:sz=\"4\" w:color=\"DDDDDD\"/>\
         <w:right w:val=\"single\" w:sz=\"4\" w:color=\"DDDDDD\"/>\
         <w:insideH w:val=\"single\" w:sz=\"4\" w:color=\"DDDDDD\"/>\
         <w:insideV w:val=\"single\" w:sz=\"4\" w:color=\"DDDDDD\"/>\
         </w:tblBorders>\
         </w:tblPr>",
    );

    // Usable A4 width split across the columns.
    let usable = PAGE_WIDTH_TWIPS - 2 * PAGE_MARGIN_TWIPS;
    let col_width = usable / column_count as i64;
    xml.push_str("<w:tblGrid>");
    for _ in 0..column_count {
        let _ = write!(xml, "<w:gridCol w:w=\"{col_width}\"/>");
    }
    xml.push_str("</w:tblGrid>");

    // Row spans become vMerge pairs: a restart on the spanning cell and
    // generated continuation cells in the rows below.
    let mut pending: Vec<PendingMerge> = Vec::new();

    for row in &table.rows {
        xml.push_str("<w:tr>");
        let mut cursor: u32 = 0;
        let mut cells = row.cells.iter();

        while cursor < column_count {
            if let Some(merge) = pending
                .iter_mut()
                .find(|m| m.col_start == cursor && m.remaining_rows > 0)
            {
                write_merge_continuation(xml, merge.col_span);
                merge.remaining_rows -= 1;
                cursor += merge.col_span;
                continue;
            }

            let Some(cell) = cells.next() else {
                break;
            };
            let span = cell.col_span.max(1);

            xml.push_str("<w:tc><w:tcPr>");
            let _ = write!(
                xml,
                "<w:tcW w:w=\"{}\" w:type=\"dxa\"/>",
                col_width * span as i64
            );
            if span > 1 {
                let _ = write!(xml, "<w:gridSpan w:val=\"{span}\"/>");
            }
            if cell.row_span > 1 {
                xml.push_str("<w:vMerge w:val=\"restart\"/>");
                pending.push(PendingMerge {
                    col_start: cursor,
                    col_span: span,
                    remaining_rows: cell.row_span - 1,
                });
            }
            if let Some(v_align) = cell.v_align {
                let _ = write!(xml, "<w:vAlign w:val=\"{v_align}\"/>");
            }
            if let Some(fill) = &cell.shading {
                let _ = write!(
                    xml,
                    "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{fill}\"/>"
                );
            }
            xml.push_str("</w:tcPr>");

            for para in &cell.paragraphs {
                write_paragraph(xml, para, media);
            }
            xml.push_str("</w:tc>");
            cursor += span;
        }

        xml.push_str("</w:tr>");
        pending.retain(|m| m.remaining_rows > 0);
    }

    xml.push_str("</w:tbl>");
}

fn write_merge_continuation(xml: &mut String, col_span: u32) {
    xml.push_str("<w:tc><w:tcPr>");
    if col_span > 1 {
        let _ = write!(xml, "<w:gridSpan w:val=\"{col_span}\"/>");
    }
    xml.push_str("<w:vMerge/></w:tcPr><w:p/></w:tc>");
}

/// Minimal styles part: document defaults plus the heading styles the
/// body references.
pub fn styles_xml() -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
        "<w:docDefaults><w:rPrDefault><w:rPr>",
        "<w:sz w:val=\"24\"/><w:szCs w:val=\"24\"/>",
        "</w:rPr></w:rPrDefault></w:docDefaults>",
        "<w:style w:type=\"paragraph\" w:styleId=\"Normal\" w:default=\"1\">",
        "<w:name w:val=\"Normal\"/>",
        "</w:style>",
    ));

    let heading_sizes = [32u32, 28, 26, 24, 22, 21];
    for (index, size) in heading_sizes.iter().enumerate() {
        let level = index + 1;
        let _ = write!(
            xml,
            "<w:style w:type=\"paragraph\" w:styleId=\"Heading{level}\">\
             <w:name w:val=\"Heading {level}\"/>\
             <w:basedOn w:val=\"Normal\"/>\
             <w:pPr><w:outlineLvl w:val=\"{index}\"/></w:pPr>\
             <w:rPr><w:b/><w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/></w:rPr>\
             </w:style>"
        );
    }

    xml.push_str("</w:styles>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::composer::{DocTableCell, DocTableRow, RunMarks};

    fn text_para(text: &str) -> DocParagraph {
        DocParagraph {
            runs: vec![DocRun::Text(TextRun {
                text: text.to_string(),
                marks: RunMarks::default(),
            })],
            ..DocParagraph::default()
        }
    }

    #[test]
    fn test_heading_paragraph() {
        let mut para = text_para("Title");
        para.heading = Some(1);
        let (xml, _) = write_document_xml(&[DocBlock::Paragraph(para)]);
        assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(xml.contains("<w:t xml:space=\"preserve\">Title</w:t>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let (xml, _) = write_document_xml(&[DocBlock::Paragraph(text_para("a < b & c"))]);
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_marks() {
        let para = DocParagraph {
            runs: vec![DocRun::Text(TextRun {
                text: "x".to_string(),
                marks: RunMarks {
                    bold: true,
                    underline: true,
                    color: Some("FF0000".to_string()),
                    size_half_points: Some(28),
                    ..RunMarks::default()
                },
            })],
            ..DocParagraph::default()
        };
        let (xml, _) = write_document_xml(&[DocBlock::Paragraph(para)]);
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains("<w:u w:val=\"single\"/>"));
        assert!(xml.contains("<w:color w:val=\"FF0000\"/>"));
        assert!(xml.contains("<w:sz w:val=\"28\"/>"));
    }

    #[test]
    fn test_list_numbering_reference() {
        let para = DocParagraph {
            numbering: Some((ListKind::Ordered, 1)),
            ..text_para("item")
        };
        let (xml, _) = write_document_xml(&[DocBlock::Paragraph(para)]);
        assert!(xml.contains("<w:ilvl w:val=\"1\"/>"));
        assert!(xml.contains(&format!("<w:numId w:val=\"{ORDERED_NUM_ID}\"/>")));
    }

    #[test]
    fn test_image_relationship_allocation() {
        let image = DocImage {
            data: vec![1, 2, 3],
            extension: "png",
            width_px: 96,
            height_px: 48,
        };
        let para = DocParagraph {
            runs: vec![DocRun::Image(image)],
            ..DocParagraph::default()
        };
        let (xml, media) = write_document_xml(&[DocBlock::Paragraph(para)]);

        assert_eq!(media.len(), 1);
        assert_eq!(media[0].rel_id, "rId3");
        assert_eq!(media[0].path, "word/media/image1.png");
        assert!(xml.contains("r:embed=\"rId3\""));
        // 96 px at 96 DPI is one inch: 914400 EMU.
        assert!(xml.contains("cx=\"914400\""));
        assert!(xml.contains("cy=\"457200\""));
    }

    #[test]
    fn test_page_break() {
        let (xml, _) = write_document_xml(&[DocBlock::PageBreak]);
        assert!(xml.contains("<w:br w:type=\"page\"/>"));
    }

    #[test]
    fn test_section_geometry() {
        let (xml, _) = write_document_xml(&[]);
        assert!(xml.contains("<w:pgSz w:w=\"11906\" w:h=\"16838\"/>"));
        assert!(xml.contains("w:top=\"1440\""));
    }

    #[test]
    fn test_row_span_generates_continuations() {
        // Two columns; the left cell spans both rows.
        let table = DocTable {
            rows: vec![
                DocTableRow {
                    cells: vec![
                        DocTableCell {
                            row_span: 2,
                            col_span: 1,
                            paragraphs: vec![text_para("tall")],
                            ..DocTableCell::default()
                        },
                        DocTableCell {
                            row_span: 1,
                            col_span: 1,
                            paragraphs: vec![text_para("a")],
                            ..DocTableCell::default()
                        },
                    ],
                },
                DocTableRow {
                    cells: vec![DocTableCell {
                        row_span: 1,
                        col_span: 1,
                        paragraphs: vec![text_para("b")],
                        ..DocTableCell::default()
                    }],
                },
            ],
        };
        let (xml, _) = write_document_xml(&[DocBlock::Table(table)]);

        assert!(xml.contains("<w:vMerge w:val=\"restart\"/>"));
        // The second row gets a generated continuation cell.
        assert!(xml.contains("<w:vMerge/>"));
        assert_eq!(xml.matches("<w:tc>").count(), 4);
    }

    #[test]
    fn test_styles_part_has_headings() {
        let xml = styles_xml();
        for level in 1..=6 {
            assert!(xml.contains(&format!("Heading{level}")));
        }
    }
}
