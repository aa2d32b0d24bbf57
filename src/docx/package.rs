//! Container validation and part access.
//!
//! A [`DocxPackage`] owns the decompressed parts of one container for the
//! duration of a single conversion call; nothing is cached across calls.

use crate::common::error::{Error, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Well-known part names inside the container.
pub mod part_names {
    /// Content types declaration
    pub const CONTENT_TYPES: &str = "[Content_Types].xml";
    /// Main document body
    pub const DOCUMENT: &str = "word/document.xml";
    /// Style definitions
    pub const STYLES: &str = "word/styles.xml";
    /// Numbering definitions
    pub const NUMBERING: &str = "word/numbering.xml";
    /// Font table
    pub const FONT_TABLE: &str = "word/fontTable.xml";
    /// Document relationships (image bindings)
    pub const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
    /// Fixed letterhead chunk paths, tried in order
    pub const LETTERHEAD_CHUNKS: &[&str] = &[
        "word/afchunk.mht",
        "word/afchunk.htm",
        "word/afchunk.html",
    ];
    /// Prefix for pattern-matched letterhead chunks
    pub const LETTERHEAD_PREFIX: &str = "word/afchunk";
}

/// Presence flags for the parts a conversion consumes.
///
/// Built once per import call, before any registry is constructed.
#[derive(Debug, Clone, Default)]
pub struct ContainerManifest {
    /// `[Content_Types].xml` is present
    pub has_content_types: bool,
    /// `word/document.xml` is present
    pub has_document: bool,
    /// `word/styles.xml` is present
    pub has_styles: bool,
    /// `word/numbering.xml` is present
    pub has_numbering: bool,
    /// `word/fontTable.xml` is present
    pub has_font_table: bool,
    /// `word/_rels/document.xml.rels` is present
    pub has_relationships: bool,
    /// Path of the letterhead chunk part, when one exists
    pub letterhead_part: Option<String>,
}

impl ContainerManifest {
    /// Whether the container carries a pre-rendered letterhead chunk.
    #[inline]
    pub fn has_letterhead(&self) -> bool {
        self.letterhead_part.is_some()
    }

    /// Whether the required parts for structural conversion are present.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.has_content_types && self.has_document
    }
}

/// One opened container: decompressed parts addressable by name.
pub struct DocxPackage {
    parts: HashMap<String, Vec<u8>>,
}

impl DocxPackage {
    /// Open a container from a byte buffer.
    ///
    /// Fails with [`Error::CorruptContainer`] when the archive cannot be
    /// read at all; individual missing parts are reported through
    /// [`DocxPackage::validate`] instead.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::CorruptContainer(format!("cannot open archive: {e}")))?;

        let mut parts = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::CorruptContainer(format!("cannot read entry {i}: {e}")))?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.insert(file.name().to_string(), data);
        }

        Ok(Self { parts })
    }

    /// Get a part's bytes by exact name.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Iterate over all part names.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Number of parts in the container.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Build the manifest of consumed parts.
    pub fn manifest(&self) -> ContainerManifest {
        ContainerManifest {
            has_content_types: self.parts.contains_key(part_names::CONTENT_TYPES),
            has_document: self.parts.contains_key(part_names::DOCUMENT),
            has_styles: self.parts.contains_key(part_names::STYLES),
            has_numbering: self.parts.contains_key(part_names::NUMBERING),
            has_font_table: self.parts.contains_key(part_names::FONT_TABLE),
            has_relationships: self.parts.contains_key(part_names::DOCUMENT_RELS),
            letterhead_part: self.find_letterhead_part(),
        }
    }

    /// Validate the container, returning the manifest on success.
    ///
    /// Missing content types or document body yield
    /// [`Error::CorruptContainer`], which signals "try the next strategy",
    /// not "abort the conversion".
    pub fn validate(&self) -> Result<ContainerManifest> {
        let manifest = self.manifest();
        if !manifest.has_content_types {
            return Err(Error::CorruptContainer(
                "missing content types declaration".to_string(),
            ));
        }
        if !manifest.has_document {
            return Err(Error::CorruptContainer(
                "missing document body part".to_string(),
            ));
        }
        Ok(manifest)
    }

    /// Locate the letterhead chunk part: fixed paths first, then any part
    /// under the letterhead prefix.
    fn find_letterhead_part(&self) -> Option<String> {
        for name in part_names::LETTERHEAD_CHUNKS {
            if self.parts.contains_key(*name) {
                return Some((*name).to_string());
            }
        }
        let mut candidates: Vec<&str> = self
            .parts
            .keys()
            .map(String::as_str)
            .filter(|n| {
                n.len() >= part_names::LETTERHEAD_PREFIX.len()
                    && n[..part_names::LETTERHEAD_PREFIX.len()]
                        .eq_ignore_ascii_case(part_names::LETTERHEAD_PREFIX)
            })
            .collect();
        candidates.sort_unstable();
        candidates.first().map(|n| n.to_string())
    }
}

impl std::fmt::Debug for DocxPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocxPackage")
            .field("part_count", &self.parts.len())
            .finish()
    }
}
