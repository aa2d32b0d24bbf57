//! Numbering registry: list formatting definitions.
//!
//! Abstract numbering definitions are templates; numbering instances
//! (`num`) reference them by id. Paragraphs point at instances, so lookups
//! go through the indirection.

use crate::docx::xmltree::XmlElement;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Numbering format of one list level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Bullet,
    Decimal,
    LowerRoman,
    UpperRoman,
    LowerLetter,
    UpperLetter,
    /// Any format this engine does not special-case
    Other,
}

impl NumberFormat {
    /// Parse a `numFmt` value.
    pub fn from_xml(value: &str) -> Self {
        match value {
            "bullet" => NumberFormat::Bullet,
            "decimal" => NumberFormat::Decimal,
            "lowerRoman" => NumberFormat::LowerRoman,
            "upperRoman" => NumberFormat::UpperRoman,
            "lowerLetter" => NumberFormat::LowerLetter,
            "upperLetter" => NumberFormat::UpperLetter,
            _ => NumberFormat::Other,
        }
    }

    /// Whether the format produces an ordered (numbered) list.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        !matches!(self, NumberFormat::Bullet)
    }
}

/// One level of an abstract numbering definition.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberingLevel {
    /// Level index, 0-based
    pub level: u8,
    pub format: NumberFormat,
    /// Level text pattern, e.g. `%1.`
    pub text: String,
    /// Start value
    pub start: u32,
}

/// Numbering definitions of one document.
#[derive(Debug, Default)]
pub struct NumberingRegistry {
    /// Abstract numbering id -> ordered levels
    abstract_nums: HashMap<u32, SmallVec<[NumberingLevel; 4]>>,
    /// Numbering instance id -> abstract numbering id
    instances: HashMap<u32, u32>,
}

impl NumberingRegistry {
    /// An empty registry (used when the numbering part is absent).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry from the numbering part.
    pub fn from_part(xml: &[u8]) -> crate::common::error::Result<Self> {
        let root = XmlElement::parse(xml)?;
        let mut registry = NumberingRegistry::default();

        for abstract_num in root.children_named("abstractNum") {
            let Some(id) = abstract_num
                .attr("abstractNumId")
                .and_then(|v| v.parse::<u32>().ok())
            else {
                continue;
            };

            let mut levels: SmallVec<[NumberingLevel; 4]> = abstract_num
                .children_named("lvl")
                .map(|lvl| NumberingLevel {
                    level: lvl
                        .attr("ilvl")
                        .and_then(|v| v.parse::<u8>().ok())
                        .unwrap_or(0),
                    format: lvl
                        .child("numFmt")
                        .and_then(|e| e.val())
                        .map(NumberFormat::from_xml)
                        .unwrap_or(NumberFormat::Decimal),
                    text: lvl
                        .child("lvlText")
                        .and_then(|e| e.val())
                        .unwrap_or_default()
                        .to_string(),
                    start: lvl
                        .child("start")
                        .and_then(|e| e.val())
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(1),
                })
                .collect();
            levels.sort_by_key(|l| l.level);
            registry.abstract_nums.insert(id, levels);
        }

        for num in root.children_named("num") {
            let id = num.attr("numId").and_then(|v| v.parse::<u32>().ok());
            let abstract_id = num
                .child("abstractNumId")
                .and_then(|e| e.val())
                .and_then(|v| v.parse::<u32>().ok());
            if let (Some(id), Some(abstract_id)) = (id, abstract_id) {
                registry.instances.insert(id, abstract_id);
            }
        }

        Ok(registry)
    }

    /// Number of abstract numbering definitions.
    pub fn abstract_count(&self) -> usize {
        self.abstract_nums.len()
    }

    /// Levels for a numbering instance id, through the indirection.
    pub fn levels_for_instance(&self, num_id: u32) -> Option<&[NumberingLevel]> {
        let abstract_id = self.instances.get(&num_id)?;
        self.abstract_nums.get(abstract_id).map(|v| v.as_slice())
    }

    /// Whether the given instance/level renders an ordered list.
    ///
    /// `None` when the instance or level is unknown.
    pub fn is_ordered(&self, num_id: u32, level: u8) -> Option<bool> {
        let levels = self.levels_for_instance(num_id)?;
        levels
            .iter()
            .find(|l| l.level == level)
            .map(|l| l.format.is_ordered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERING_XML: &str = r#"
        <w:numbering xmlns:w="ns">
          <w:abstractNum w:abstractNumId="0">
            <w:lvl w:ilvl="0">
              <w:start w:val="1"/>
              <w:numFmt w:val="bullet"/>
              <w:lvlText w:val="&#x25CF;"/>
            </w:lvl>
            <w:lvl w:ilvl="1">
              <w:start w:val="1"/>
              <w:numFmt w:val="decimal"/>
              <w:lvlText w:val="%2."/>
            </w:lvl>
          </w:abstractNum>
          <w:num w:numId="3">
            <w:abstractNumId w:val="0"/>
          </w:num>
        </w:numbering>"#;

    #[test]
    fn test_instance_indirection() {
        let registry = NumberingRegistry::from_part(NUMBERING_XML.as_bytes()).unwrap();
        assert_eq!(registry.abstract_count(), 1);

        let levels = registry.levels_for_instance(3).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].format, NumberFormat::Bullet);
        assert_eq!(levels[1].text, "%2.");
    }

    #[test]
    fn test_ordered_classification() {
        let registry = NumberingRegistry::from_part(NUMBERING_XML.as_bytes()).unwrap();
        assert_eq!(registry.is_ordered(3, 0), Some(false));
        assert_eq!(registry.is_ordered(3, 1), Some(true));
        assert_eq!(registry.is_ordered(3, 9), None);
        assert_eq!(registry.is_ordered(99, 0), None);
    }

    #[test]
    fn test_empty_registry() {
        let registry = NumberingRegistry::empty();
        assert_eq!(registry.levels_for_instance(1), None);
    }
}
