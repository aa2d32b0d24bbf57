//! Packaging the exported parts into the final zip container.

use crate::common::error::Result;
use crate::export::numbering::numbering_xml;
use crate::export::writer::{MediaFile, escape_xml, styles_xml};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::{Cursor, Write as IoWrite};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Assemble the complete package: content types, package and document
/// relationships, document body, styles, numbering, core properties and
/// media parts.
pub fn write_package(
    document_xml: &str,
    title: Option<&str>,
    media: &[MediaFile],
) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut add = |writer: &mut ZipWriter<Cursor<Vec<u8>>>, path: &str, data: &[u8]| -> Result<()> {
        writer.start_file(path, options)?;
        writer.write_all(data)?;
        Ok(())
    };

    add(&mut writer, "[Content_Types].xml", content_types_xml(media).as_bytes())?;
    add(&mut writer, "_rels/.rels", package_rels_xml().as_bytes())?;
    add(&mut writer, "word/document.xml", document_xml.as_bytes())?;
    add(
        &mut writer,
        "word/_rels/document.xml.rels",
        document_rels_xml(media).as_bytes(),
    )?;
    add(&mut writer, "word/styles.xml", styles_xml().as_bytes())?;
    add(&mut writer, "word/numbering.xml", numbering_xml().as_bytes())?;
    add(&mut writer, "docProps/core.xml", core_xml(title).as_bytes())?;
    for file in media {
        add(&mut writer, &file.path, &file.data)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| crate::common::error::Error::Zip(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn content_types_xml(media: &[MediaFile]) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
        "<Default Extension=\"rels\" ",
        "ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
        "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    ));

    let extensions: BTreeSet<&str> = media.iter().map(|m| m.extension).collect();
    for extension in extensions {
        let mime = match extension {
            "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            _ => "image/png",
        };
        let _ = write!(
            xml,
            "<Default Extension=\"{extension}\" ContentType=\"{mime}\"/>"
        );
    }

    xml.push_str(concat!(
        "<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.",
        "openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
        "<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.",
        "openxmlformats-officedocument.wordprocessingml.styles+xml\"/>",
        "<Override PartName=\"/word/numbering.xml\" ContentType=\"application/vnd.",
        "openxmlformats-officedocument.wordprocessingml.numbering+xml\"/>",
        "<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.",
        "openxmlformats-package.core-properties+xml\"/>",
        "</Types>",
    ));
    xml
}

fn package_rels_xml() -> String {
    concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/",
        "2006/relationships/officeDocument\" Target=\"word/document.xml\"/>",
        "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/",
        "relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>",
        "</Relationships>",
    )
    .to_string()
}

fn document_rels_xml(media: &[MediaFile]) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/",
        "2006/relationships/styles\" Target=\"styles.xml\"/>",
        "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/",
        "2006/relationships/numbering\" Target=\"numbering.xml\"/>",
    ));

    for file in media {
        let target = file.path.strip_prefix("word/").unwrap_or(&file.path);
        let _ = write!(
            xml,
            "<Relationship Id=\"{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/\
             2006/relationships/image\" Target=\"{target}\"/>",
            file.rel_id
        );
    }

    xml.push_str("</Relationships>");
    xml
}

fn core_xml(title: Option<&str>) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        "<cp:coreProperties",
        " xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\"",
        " xmlns:dc=\"http://purl.org/dc/elements/1.1/\">",
    ));
    if let Some(title) = title {
        let _ = write!(xml, "<dc:title>{}</dc:title>", escape_xml(title));
    }
    xml.push_str("</cp:coreProperties>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_package_layout() {
        let bytes = write_package("<w:document/>", Some("Report"), &[]).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/numbering.xml",
            "docProps/core.xml",
        ] {
            assert!(archive.by_name(expected).is_ok(), "missing {expected}");
        }
    }

    #[test]
    fn test_media_parts_and_rels() {
        let media = vec![MediaFile {
            path: "word/media/image1.png".to_string(),
            extension: "png",
            rel_id: "rId3".to_string(),
            data: vec![1, 2, 3],
        }];
        let bytes = write_package("<w:document/>", None, &media).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut data = Vec::new();
        archive
            .by_name("word/media/image1.png")
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(data, vec![1, 2, 3]);

        let mut rels = String::new();
        archive
            .by_name("word/_rels/document.xml.rels")
            .unwrap()
            .read_to_string(&mut rels)
            .unwrap();
        assert!(rels.contains("Id=\"rId3\""));
        assert!(rels.contains("Target=\"media/image1.png\""));

        let mut types = String::new();
        archive
            .by_name("[Content_Types].xml")
            .unwrap()
            .read_to_string(&mut types)
            .unwrap();
        assert!(types.contains("Extension=\"png\""));
    }

    #[test]
    fn test_title_in_core_properties() {
        let bytes = write_package("<w:document/>", Some("A & B"), &[]).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut core = String::new();
        archive
            .by_name("docProps/core.xml")
            .unwrap()
            .read_to_string(&mut core)
            .unwrap();
        assert!(core.contains("<dc:title>A &amp; B</dc:title>"));
    }
}
