//! Generated numbering definitions for exported lists.
//!
//! Exports always ship exactly two numbering definitions of five levels
//! each: bullets with glyphs varying by depth, and ordered numbering
//! cycling decimal, letter and roman formats. List paragraphs reference
//! them by the fixed instance ids below.

use std::fmt::Write as _;

/// Numbering instance id for bullet lists.
pub const BULLET_NUM_ID: u32 = 1;

/// Numbering instance id for ordered lists.
pub const ORDERED_NUM_ID: u32 = 2;

/// Bullet glyph per level.
const BULLET_GLYPHS: [&str; 5] = ["\u{25CF}", "\u{25CB}", "\u{25A0}", "\u{25A1}", "\u{25CF}"];

/// Ordered format and level-text pattern per level.
const ORDERED_LEVELS: [(&str, &str); 5] = [
    ("decimal", "%1."),
    ("lowerLetter", "%2)"),
    ("lowerRoman", "%3."),
    ("decimal", "(%4)"),
    ("lowerLetter", "(%5)"),
];

/// Hanging indent of every level, in twips (a quarter inch).
const HANGING_TWIPS: i64 = 360;

/// Left indent step per level, in twips (half an inch).
const INDENT_STEP_TWIPS: i64 = 720;

/// Generate the complete numbering part.
pub fn numbering_xml() -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<w:numbering xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">",
    ));

    // Abstract definition 0: bullets.
    xml.push_str("<w:abstractNum w:abstractNumId=\"0\">");
    for (level, glyph) in BULLET_GLYPHS.iter().enumerate() {
        write_level(&mut xml, level, "bullet", glyph);
    }
    xml.push_str("</w:abstractNum>");

    // Abstract definition 1: ordered.
    xml.push_str("<w:abstractNum w:abstractNumId=\"1\">");
    for (level, (format, text)) in ORDERED_LEVELS.iter().enumerate() {
        write_level(&mut xml, level, format, text);
    }
    xml.push_str("</w:abstractNum>");

    let _ = write!(
        xml,
        "<w:num w:numId=\"{BULLET_NUM_ID}\"><w:abstractNumId w:val=\"0\"/></w:num>\
         <w:num w:numId=\"{ORDERED_NUM_ID}\"><w:abstractNumId w:val=\"1\"/></w:num>"
    );
    xml.push_str("</w:numbering>");
    xml
}

fn write_level(xml: &mut String, level: usize, format: &str, text: &str) {
    let left = INDENT_STEP_TWIPS * (level as i64 + 1);
    let _ = write!(
        xml,
        "<w:lvl w:ilvl=\"{level}\">\
         <w:start w:val=\"1\"/>\
         <w:numFmt w:val=\"{format}\"/>\
         <w:lvlText w:val=\"{text}\"/>\
         <w:lvlJc w:val=\"left\"/>\
         <w:pPr><w:ind w:left=\"{left}\" w:hanging=\"{HANGING_TWIPS}\"/></w:pPr>\
         </w:lvl>"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::numbering::{NumberFormat, NumberingRegistry};

    #[test]
    fn test_ten_levels_across_two_kinds() {
        // The import-side registry must be able to read back what the
        // export side generates.
        let xml = numbering_xml();
        let registry = NumberingRegistry::from_part(xml.as_bytes()).unwrap();
        assert_eq!(registry.abstract_count(), 2);

        let bullets = registry.levels_for_instance(BULLET_NUM_ID).unwrap();
        let ordered = registry.levels_for_instance(ORDERED_NUM_ID).unwrap();
        assert_eq!(bullets.len(), 5);
        assert_eq!(ordered.len(), 5);

        assert!(bullets.iter().all(|l| l.format == NumberFormat::Bullet));
        assert_eq!(
            ordered.iter().map(|l| l.format).collect::<Vec<_>>(),
            vec![
                NumberFormat::Decimal,
                NumberFormat::LowerLetter,
                NumberFormat::LowerRoman,
                NumberFormat::Decimal,
                NumberFormat::LowerLetter,
            ]
        );
        assert_eq!(ordered[1].text, "%2)");
    }
}
