//! The in-memory document model produced by structural conversion.
//!
//! An ordered sequence of block nodes, each holding inline spans with fully
//! resolved attributes. The model is scoped to a single conversion call.

use crate::docx::styles::Alignment;

/// Resolved first-line indent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirstLineIndent {
    /// Indent in points (from twips)
    Points(f64),
    /// Indent in em (from hundredths of a character)
    Em(f64),
}

/// Resolved line height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineHeight {
    /// Fixed height in points (exact and at-least rules)
    Points(f64),
    /// Unitless multiple of single spacing
    Multiple(f64),
}

/// Vertical position of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPosition {
    Superscript,
    Subscript,
}

/// Fully resolved style of one run span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// Canonical `#RRGGBB`
    pub color: Option<String>,
    /// Canonical `#RRGGBB` background from the highlight palette
    pub background: Option<String>,
    pub font_family: Option<String>,
    /// Size in points
    pub size_points: Option<f64>,
    pub position: Option<RunPosition>,
}

impl RunStyle {
    /// Whether the style carries no formatting at all.
    pub fn is_plain(&self) -> bool {
        *self == RunStyle::default()
    }
}

/// One styled span of text.
#[derive(Debug, Clone)]
pub struct RunSpan {
    pub text: String,
    pub style: RunStyle,
}

/// A resolved inline image.
#[derive(Debug, Clone)]
pub struct ImageSpan {
    /// Data URI
    pub src: String,
    /// Render width in pixels, already capped
    pub width_px: Option<u32>,
    /// Render height in pixels
    pub height_px: Option<u32>,
}

/// Inline content of a paragraph.
#[derive(Debug, Clone)]
pub enum Inline {
    Run(RunSpan),
    Image(ImageSpan),
    /// Explicit line break
    Break,
    /// Tab stop
    Tab,
}

/// Paragraph-level content and attributes shared by paragraphs, headings
/// and list items.
#[derive(Debug, Clone, Default)]
pub struct ParagraphBlock {
    pub alignment: Option<Alignment>,
    pub first_line_indent: Option<FirstLineIndent>,
    pub line_height: Option<LineHeight>,
    pub inlines: Vec<Inline>,
}

impl ParagraphBlock {
    /// Whether the paragraph has no visible content.
    pub fn is_empty(&self) -> bool {
        self.inlines.iter().all(|inline| match inline {
            Inline::Run(run) => run.text.is_empty(),
            Inline::Image(_) => false,
            Inline::Break | Inline::Tab => true,
        })
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for inline in &self.inlines {
            if let Inline::Run(run) = inline {
                out.push_str(&run.text);
            }
        }
        out
    }
}

/// One table cell.
#[derive(Debug, Clone, Default)]
pub struct TableCell {
    /// Cell content, in document order
    pub blocks: Vec<Block>,
    /// Horizontal span, 1 when not merged
    pub col_span: u32,
    /// Canonical `#RRGGBB` shading
    pub shading: Option<String>,
    /// CSS vertical-align keyword
    pub vertical_align: Option<String>,
}

/// One table row.
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// A table block.
#[derive(Debug, Clone, Default)]
pub struct TableBlock {
    pub rows: Vec<TableRow>,
}

/// A block node of the document.
#[derive(Debug, Clone)]
pub enum Block {
    Paragraph(ParagraphBlock),
    /// Heading with level in 1..=6 - the constructor enforces the range
    Heading { level: u8, content: ParagraphBlock },
    /// List item with 0-based nesting level
    ListItem {
        level: u8,
        ordered: bool,
        content: ParagraphBlock,
    },
    Table(TableBlock),
}

impl Block {
    /// Build a heading block, clamping the level into 1..=6.
    pub fn heading(level: u8, content: ParagraphBlock) -> Block {
        Block::Heading {
            level: level.clamp(1, 6),
            content,
        }
    }
}

/// The ordered block sequence of one converted document.
#[derive(Debug, Clone, Default)]
pub struct DocumentModel {
    pub blocks: Vec<Block>,
}

impl DocumentModel {
    /// Whether the model holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamped() {
        let para = ParagraphBlock::default();
        match Block::heading(0, para.clone()) {
            Block::Heading { level, .. } => assert_eq!(level, 1),
            _ => unreachable!(),
        }
        match Block::heading(9, para) {
            Block::Heading { level, .. } => assert_eq!(level, 6),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_paragraph_emptiness() {
        let mut para = ParagraphBlock::default();
        assert!(para.is_empty());

        para.inlines.push(Inline::Break);
        assert!(para.is_empty());

        para.inlines.push(Inline::Run(RunSpan {
            text: "x".into(),
            style: RunStyle::default(),
        }));
        assert!(!para.is_empty());
    }
}
