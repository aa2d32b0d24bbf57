//! Style registry: named style definitions and their resolution.
//!
//! Styles inherit through `basedOn` chains. Resolution folds the chain from
//! its root down to the requested style, with direct formatting applied on
//! top by the converter. A chain that revisits an id is treated as
//! unresolved and falls back to the document defaults, so resolution always
//! terminates.

use crate::docx::xmltree::XmlElement;
use std::collections::{HashMap, HashSet};

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Parse a `jc` value. `both` is the container's spelling of justify.
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// CSS `text-align` keyword.
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    /// Container `jc` value.
    pub fn as_xml(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Vertical run position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertAlign {
    Superscript,
    Subscript,
}

/// Line spacing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRule {
    /// Multiple of single spacing (value in 240ths)
    Auto,
    /// Exact height in twips
    Exact,
    /// Minimum height in twips
    AtLeast,
}

/// A raw line spacing declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSpacing {
    pub value: i64,
    pub rule: LineRule,
}

/// Reference from a paragraph to a numbering instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    /// Numbering instance id (`numId`)
    pub num_id: u32,
    /// Indentation level (`ilvl`)
    pub level: u8,
}

/// Run-level formatting properties. `None` means "not specified here";
/// `Some(false)` is an explicit off that wins over an inherited on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    /// Hex color without `#`, `auto` filtered out
    pub color: Option<String>,
    /// Named highlight color
    pub highlight: Option<String>,
    /// Font size in half-points
    pub size_half_points: Option<u32>,
    pub font_east_asia: Option<String>,
    pub font_ascii: Option<String>,
    pub font_h_ansi: Option<String>,
    pub vert_align: Option<VertAlign>,
}

impl RunProps {
    /// Overlay `over` onto `self`: any property `over` specifies replaces
    /// the inherited one, including explicit offs.
    pub fn apply(&mut self, over: &RunProps) {
        if over.bold.is_some() {
            self.bold = over.bold;
        }
        if over.italic.is_some() {
            self.italic = over.italic;
        }
        if over.underline.is_some() {
            self.underline = over.underline;
        }
        if over.strike.is_some() {
            self.strike = over.strike;
        }
        if over.color.is_some() {
            self.color = over.color.clone();
        }
        if over.highlight.is_some() {
            self.highlight = over.highlight.clone();
        }
        if over.size_half_points.is_some() {
            self.size_half_points = over.size_half_points;
        }
        if over.font_east_asia.is_some() {
            self.font_east_asia = over.font_east_asia.clone();
        }
        if over.font_ascii.is_some() {
            self.font_ascii = over.font_ascii.clone();
        }
        if over.font_h_ansi.is_some() {
            self.font_h_ansi = over.font_h_ansi.clone();
        }
        if over.vert_align.is_some() {
            self.vert_align = over.vert_align;
        }
    }

    /// Font family after the east-Asian -> ASCII -> high-ANSI fallback order.
    pub fn font_family(&self) -> Option<&str> {
        self.font_east_asia
            .as_deref()
            .or(self.font_ascii.as_deref())
            .or(self.font_h_ansi.as_deref())
    }
}

/// Paragraph-level formatting properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParaProps {
    pub alignment: Option<Alignment>,
    /// First-line indent in twips
    pub first_line_twips: Option<i64>,
    /// First-line indent in hundredths of a character (wins over twips)
    pub first_line_chars: Option<i64>,
    pub line: Option<LineSpacing>,
    /// Outline level, 0-based as stored
    pub outline_level: Option<u8>,
    /// Named style reference (only meaningful on direct properties)
    pub style_id: Option<String>,
    /// Numbering reference (only meaningful on direct properties)
    pub numbering: Option<NumberingRef>,
}

impl ParaProps {
    /// Overlay `over` onto `self`.
    pub fn apply(&mut self, over: &ParaProps) {
        if over.alignment.is_some() {
            self.alignment = over.alignment;
        }
        if over.first_line_twips.is_some() {
            self.first_line_twips = over.first_line_twips;
        }
        if over.first_line_chars.is_some() {
            self.first_line_chars = over.first_line_chars;
        }
        if over.line.is_some() {
            self.line = over.line;
        }
        if over.outline_level.is_some() {
            self.outline_level = over.outline_level;
        }
        if over.style_id.is_some() {
            self.style_id = over.style_id.clone();
        }
        if over.numbering.is_some() {
            self.numbering = over.numbering;
        }
    }
}

/// One named style definition.
#[derive(Debug, Clone, Default)]
pub struct StyleDef {
    /// UI-visible name
    pub name: Option<String>,
    /// Parent style id
    pub based_on: Option<String>,
    pub run: RunProps,
    pub para: ParaProps,
}

/// All styles of one document plus its defaults.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    styles: HashMap<String, StyleDef>,
    default_run: RunProps,
    default_para: ParaProps,
}

impl StyleRegistry {
    /// An empty registry (used when the styles part is absent).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry from the styles part.
    ///
    /// Individual malformed style entries are skipped; only an unreadable
    /// part is an error.
    pub fn from_part(xml: &[u8]) -> crate::common::error::Result<Self> {
        let root = XmlElement::parse(xml)?;
        let mut registry = StyleRegistry::default();

        if let Some(defaults) = root.child("docDefaults") {
            if let Some(rpr) = defaults
                .child("rPrDefault")
                .and_then(|d| d.child("rPr"))
            {
                registry.default_run = parse_run_props(rpr);
            }
            if let Some(ppr) = defaults
                .child("pPrDefault")
                .and_then(|d| d.child("pPr"))
            {
                registry.default_para = parse_para_props(ppr);
            }
        }

        for style in root.children_named("style") {
            let Some(style_id) = style.attr("styleId") else {
                continue;
            };
            let def = StyleDef {
                name: style
                    .child("name")
                    .and_then(|n| n.val())
                    .map(str::to_string),
                based_on: style
                    .child("basedOn")
                    .and_then(|b| b.val())
                    .map(str::to_string),
                run: style.child("rPr").map(parse_run_props).unwrap_or_default(),
                para: style.child("pPr").map(parse_para_props).unwrap_or_default(),
            };
            registry.styles.insert(style_id.to_string(), def);
        }

        Ok(registry)
    }

    /// Number of named styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether the registry has no named styles.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Look up a style definition by id.
    pub fn get(&self, style_id: &str) -> Option<&StyleDef> {
        self.styles.get(style_id)
    }

    /// Display name for a style id.
    pub fn style_name(&self, style_id: &str) -> Option<&str> {
        self.styles.get(style_id).and_then(|s| s.name.as_deref())
    }

    /// Document default run properties.
    pub fn default_run(&self) -> &RunProps {
        &self.default_run
    }

    /// Document default paragraph properties.
    pub fn default_para(&self) -> &ParaProps {
        &self.default_para
    }

    /// Resolve effective run properties for a style id.
    ///
    /// Walks the `basedOn` chain to its root and folds it over the document
    /// defaults. A cycle anywhere in the chain makes the whole style
    /// unresolved: the defaults are returned unchanged.
    pub fn resolve_run(&self, style_id: &str) -> RunProps {
        let mut props = self.default_run.clone();
        for def in self.chain(style_id) {
            props.apply(&def.run);
        }
        props
    }

    /// Resolve effective paragraph properties for a style id; same chain
    /// rules as [`StyleRegistry::resolve_run`].
    pub fn resolve_para(&self, style_id: &str) -> ParaProps {
        let mut props = self.default_para.clone();
        for def in self.chain(style_id) {
            props.apply(&def.para);
        }
        props
    }

    /// Fold a style chain's run properties without the document defaults.
    ///
    /// Used when several chains stack (paragraph style, then character
    /// style, then direct formatting): folding defaults into each chain
    /// would let one chain's defaults clobber another chain's explicit
    /// values.
    pub fn chain_run(&self, style_id: &str) -> RunProps {
        let mut props = RunProps::default();
        for def in self.chain(style_id) {
            props.apply(&def.run);
        }
        props
    }

    /// Fold a style chain's paragraph properties without the defaults.
    pub fn chain_para(&self, style_id: &str) -> ParaProps {
        let mut props = ParaProps::default();
        for def in self.chain(style_id) {
            props.apply(&def.para);
        }
        props
    }

    /// The inheritance chain for a style, root first. Empty when the id is
    /// unknown or the chain revisits an id.
    fn chain(&self, style_id: &str) -> Vec<&StyleDef> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(style_id);

        while let Some(id) = current {
            if !visited.insert(id) {
                // Revisited id: treat the whole chain as unresolved.
                return Vec::new();
            }
            let Some(def) = self.styles.get(id) else {
                break;
            };
            chain.push(def);
            current = def.based_on.as_deref();
        }

        chain.reverse();
        chain
    }
}

/// Parse a toggle property: present without `val` means on; `0`, `false`
/// and `none` mean an explicit off.
fn parse_toggle(element: &XmlElement) -> bool {
    !matches!(element.val(), Some("0") | Some("false") | Some("none"))
}

/// Parse an `rPr` element into run properties.
pub(crate) fn parse_run_props(rpr: &XmlElement) -> RunProps {
    let mut props = RunProps::default();

    for child in rpr.elements() {
        match child.name.as_str() {
            "b" => props.bold = Some(parse_toggle(child)),
            "i" => props.italic = Some(parse_toggle(child)),
            "strike" => props.strike = Some(parse_toggle(child)),
            "u" => props.underline = Some(parse_toggle(child)),
            "color" => {
                if let Some(val) = child.val()
                    && val != "auto"
                {
                    props.color = Some(val.to_string());
                }
            },
            "highlight" => {
                if let Some(val) = child.val() {
                    props.highlight = Some(val.to_string());
                }
            },
            "sz" | "szCs" => {
                if props.size_half_points.is_none()
                    && let Some(val) = child.val()
                    && let Ok(size) = val.parse::<u32>()
                {
                    props.size_half_points = Some(size);
                }
            },
            "rFonts" => {
                props.font_east_asia = child.attr("eastAsia").map(str::to_string);
                props.font_ascii = child.attr("ascii").map(str::to_string);
                props.font_h_ansi = child.attr("hAnsi").map(str::to_string);
            },
            "vertAlign" => {
                props.vert_align = match child.val() {
                    Some("superscript") => Some(VertAlign::Superscript),
                    Some("subscript") => Some(VertAlign::Subscript),
                    _ => None,
                };
            },
            _ => {},
        }
    }

    props
}

/// Parse a `pPr` element into paragraph properties.
pub(crate) fn parse_para_props(ppr: &XmlElement) -> ParaProps {
    let mut props = ParaProps::default();

    for child in ppr.elements() {
        match child.name.as_str() {
            "jc" => {
                props.alignment = child.val().and_then(Alignment::from_xml);
            },
            "ind" => {
                props.first_line_chars = child
                    .attr("firstLineChars")
                    .and_then(|v| v.parse::<i64>().ok());
                props.first_line_twips = child
                    .attr("firstLine")
                    .and_then(|v| v.parse::<i64>().ok());
            },
            "spacing" => {
                if let Some(line) = child.attr("line").and_then(|v| v.parse::<i64>().ok()) {
                    let rule = match child.attr("lineRule") {
                        Some("exact") => LineRule::Exact,
                        Some("atLeast") => LineRule::AtLeast,
                        _ => LineRule::Auto,
                    };
                    props.line = Some(LineSpacing { value: line, rule });
                }
            },
            "outlineLvl" => {
                props.outline_level = child.val().and_then(|v| v.parse::<u8>().ok());
            },
            "pStyle" => {
                props.style_id = child.val().map(str::to_string);
            },
            "numPr" => {
                let level = child
                    .child("ilvl")
                    .and_then(|e| e.val())
                    .and_then(|v| v.parse::<u8>().ok())
                    .unwrap_or(0);
                let num_id = child
                    .child("numId")
                    .and_then(|e| e.val())
                    .and_then(|v| v.parse::<u32>().ok());
                if let Some(num_id) = num_id {
                    props.numbering = Some(NumberingRef { num_id, level });
                }
            },
            _ => {},
        }
    }

    props
}
