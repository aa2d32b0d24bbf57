//! Font registry: substitution table from the font table part.

use crate::docx::xmltree::XmlElement;
use std::collections::HashMap;

/// Font name substitutions declared by the document.
///
/// Maps a declared font name to its alternate; names without an alternate
/// map to themselves.
#[derive(Debug, Default)]
pub struct FontRegistry {
    map: HashMap<String, String>,
}

impl FontRegistry {
    /// An empty registry (used when the font table part is absent).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry from the font table part.
    pub fn from_part(xml: &[u8]) -> crate::common::error::Result<Self> {
        let root = XmlElement::parse(xml)?;
        let mut map = HashMap::new();

        for font in root.children_named("font") {
            let Some(name) = font.attr("name") else {
                continue;
            };
            let alt = font
                .child("altName")
                .and_then(|e| e.val())
                .unwrap_or(name);
            map.insert(name.to_string(), alt.to_string());
        }

        Ok(Self { map })
    }

    /// Number of declared fonts.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Resolve a font name through the substitution table.
    ///
    /// Unknown names pass through unchanged.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map(String::as_str).unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution() {
        let registry = FontRegistry::from_part(
            br#"<w:fonts xmlns:w="ns">
              <w:font w:name="SimSun"><w:altName w:val="NSimSun"/></w:font>
              <w:font w:name="Arial"/>
            </w:fonts>"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("SimSun"), "NSimSun");
        assert_eq!(registry.resolve("Arial"), "Arial");
        assert_eq!(registry.resolve("Helvetica"), "Helvetica");
    }
}
