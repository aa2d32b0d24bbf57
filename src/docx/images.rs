//! Image registry: relationship id to inline data URI.
//!
//! Entries are populated from the document relationships part before body
//! conversion begins. A run referencing an id with no entry renders with
//! the image omitted; it never raises an error.

use crate::common::diagnostics::{Diagnostic, DiagnosticKind};
use crate::docx::package::{DocxPackage, part_names};
use crate::docx::xmltree::XmlElement;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashMap;

/// Relationship-id-keyed map of embedded images, re-encoded as data URIs.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    map: HashMap<String, String>,
}

impl ImageRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the registry from the package's document relationships.
    ///
    /// Relationships that point at missing media parts are recorded as
    /// diagnostics and skipped.
    pub fn from_package(pkg: &DocxPackage, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut map = HashMap::new();

        let Some(rels_xml) = pkg.part(part_names::DOCUMENT_RELS) else {
            return Self { map };
        };
        let Ok(root) = XmlElement::parse(rels_xml) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::ParseDegraded,
                "document relationships part is not well-formed; images skipped",
            ));
            return Self { map };
        };

        for rel in root.children_named("Relationship") {
            let rel_type = rel.attr("Type").unwrap_or_default();
            if !rel_type.contains("image") {
                continue;
            }
            let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) else {
                continue;
            };

            // Targets are relative to word/ unless rooted.
            let path = if let Some(stripped) = target.strip_prefix('/') {
                stripped.to_string()
            } else {
                format!("word/{target}")
            };

            match pkg.part(&path) {
                Some(data) => {
                    let mime = mime_for_target(target);
                    let mut uri =
                        String::with_capacity(data.len() * 4 / 3 + mime.len() + 16);
                    uri.push_str("data:");
                    uri.push_str(mime);
                    uri.push_str(";base64,");
                    BASE64.encode_string(data, &mut uri);
                    map.insert(id.to_string(), uri);
                },
                None => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::ImageMissing,
                        format!("media part {path} referenced by {id} is missing"),
                    ));
                },
            }
        }

        Self { map }
    }

    /// Look up the data URI for a relationship id.
    pub fn get(&self, rel_id: &str) -> Option<&str> {
        self.map.get(rel_id).map(String::as_str)
    }

    /// Number of resolved images.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no images were resolved.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// MIME type from the target's extension; unknown extensions fall back to
/// PNG, which every consumer of the data URI can at least attempt.
fn mime_for_target(target: &str) -> &'static str {
    let ext = target
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn package_with(parts: &[(&str, &[u8])]) -> DocxPackage {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        let bytes = writer.finish().unwrap().into_inner();
        DocxPackage::from_bytes(&bytes).unwrap()
    }

    const RELS: &str = r#"<Relationships xmlns="ns">
        <Relationship Id="rId1" Type=".../image" Target="media/image1.png"/>
        <Relationship Id="rId2" Type=".../image" Target="media/missing.jpg"/>
        <Relationship Id="rId3" Type=".../hyperlink" Target="https://example.com"/>
    </Relationships>"#;

    #[test]
    fn test_data_uri_encoding() {
        let pkg = package_with(&[
            (part_names::DOCUMENT_RELS, RELS.as_bytes()),
            ("word/media/image1.png", &[1, 2, 3, 4]),
        ]);
        let mut diags = Vec::new();
        let registry = ImageRegistry::from_package(&pkg, &mut diags);

        let uri = registry.get("rId1").unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(uri.ends_with(&BASE64.encode([1u8, 2, 3, 4])));
    }

    #[test]
    fn test_missing_media_is_diagnostic_not_error() {
        let pkg = package_with(&[(part_names::DOCUMENT_RELS, RELS.as_bytes())]);
        let mut diags = Vec::new();
        let registry = ImageRegistry::from_package(&pkg, &mut diags);

        assert!(registry.get("rId2").is_none());
        assert!(
            diags
                .iter()
                .any(|d| d.kind == DiagnosticKind::ImageMissing)
        );
    }

    #[test]
    fn test_non_image_relationships_ignored() {
        let pkg = package_with(&[(part_names::DOCUMENT_RELS, RELS.as_bytes())]);
        let mut diags = Vec::new();
        let registry = ImageRegistry::from_package(&pkg, &mut diags);
        assert!(registry.get("rId3").is_none());
    }

    #[test]
    fn test_mime_table() {
        assert_eq!(mime_for_target("media/a.JPG"), "image/jpeg");
        assert_eq!(mime_for_target("media/a.gif"), "image/gif");
        assert_eq!(mime_for_target("media/a.unknown"), "image/png");
    }
}
