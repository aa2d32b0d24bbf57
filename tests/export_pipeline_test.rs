//! Export pipeline tests: compose editor HTML, unzip the package, and
//! re-parse the emitted parts.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use longan::docx::numbering::{NumberFormat, NumberingRegistry};
use longan::docx::styles::StyleRegistry;
use longan::docx::xmltree::XmlElement;
use longan::export::{ExportOptions, html_to_docx};
use longan::import::{ImportOptions, convert_to_html};
use std::io::{Cursor, Read};
use zip::ZipArchive;

fn read_part(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut file = archive.by_name(name).unwrap_or_else(|_| panic!("missing part {name}"));
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    data
}

fn sample_html() -> String {
    let png = BASE64.encode(noise_png());
    format!(
        concat!(
            r#"<h1 style="text-align: center">Annual Report</h1>"#,
            r#"<p>Intro with <strong>bold</strong>, <em>italic</em>, "#,
            r#"<u>underline</u>, <s>strike</s>, <sup>sup</sup> and "#,
            r#"<span style="color: rgb(37, 99, 235)">blue</span>.</p>"#,
            r#"<ul><li>alpha<ul><li>alpha nested</li></ul></li><li>beta</li></ul>"#,
            r#"<ol><li>first</li><li>second</li></ol>"#,
            r#"<table><tr><th>Name</th><th>Value</th></tr>"#,
            r#"<tr><td colspan="2">merged cell</td></tr></table>"#,
            r#"<blockquote><p>quoted wisdom</p></blockquote>"#,
            "<pre><code>let x = 1;\nlet y = 2;</code></pre>",
            r#"<div class="page-break" data-type="page-break"></div>"#,
            r#"<p><img src="data:image/png;base64,{png}" width="120" height="60"></p>"#,
        ),
        png = png
    )
}

fn noise_png() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4]
}

#[test]
fn test_document_part_structure() {
    let bytes = html_to_docx(&sample_html(), &ExportOptions::default()).unwrap();
    let document = XmlElement::parse(&read_part(&bytes, "word/document.xml")).unwrap();
    let body = document.child("body").unwrap();

    // Heading with preserved centering.
    let heading = body
        .children_named("p")
        .find(|p| {
            p.child("pPr")
                .and_then(|ppr| ppr.child("pStyle"))
                .and_then(|s| s.val())
                == Some("Heading1")
        })
        .expect("heading paragraph");
    assert_eq!(
        heading
            .child("pPr")
            .and_then(|ppr| ppr.child("jc"))
            .and_then(|jc| jc.val()),
        Some("center")
    );
    assert_eq!(heading.text(), "Annual Report");

    // Inline marks landed on the leaf runs.
    let intro = body
        .children_named("p")
        .find(|p| p.text().starts_with("Intro with"))
        .expect("intro paragraph");
    let bold_run = intro
        .children_named("r")
        .find(|r| r.text() == "bold")
        .expect("bold run");
    assert!(bold_run.child("rPr").is_some_and(|rpr| rpr.has_child("b")));
    let blue_run = intro
        .children_named("r")
        .find(|r| r.text() == "blue")
        .expect("blue run");
    assert_eq!(
        blue_run
            .child("rPr")
            .and_then(|rpr| rpr.child("color"))
            .and_then(|c| c.val()),
        Some("2563EB")
    );

    // Bullet items reference numbering 1; levels nest; ordered items use 2.
    let num_refs: Vec<(Option<&str>, Option<&str>)> = body
        .children_named("p")
        .filter_map(|p| p.child("pPr").and_then(|ppr| ppr.child("numPr")))
        .map(|num_pr| {
            (
                num_pr.child("numId").and_then(|e| e.val()),
                num_pr.child("ilvl").and_then(|e| e.val()),
            )
        })
        .collect();
    assert_eq!(
        num_refs,
        vec![
            (Some("1"), Some("0")),
            (Some("1"), Some("1")),
            (Some("1"), Some("0")),
            (Some("2"), Some("0")),
            (Some("2"), Some("0")),
        ]
    );

    // The table keeps its spans and header shading.
    let table = body.child("tbl").expect("table");
    let rows: Vec<_> = table.children_named("tr").collect();
    assert_eq!(rows.len(), 2);
    let header_cell = rows[0].children_named("tc").next().unwrap();
    assert_eq!(
        header_cell
            .child("tcPr")
            .and_then(|pr| pr.child("shd"))
            .and_then(|shd| shd.attr("fill")),
        Some("F5F5F5")
    );
    let merged = rows[1].children_named("tc").next().unwrap();
    assert_eq!(
        merged
            .child("tcPr")
            .and_then(|pr| pr.child("gridSpan"))
            .and_then(|g| g.val()),
        Some("2")
    );

    // Blockquote paragraph: indented with a left border.
    let quote = body
        .children_named("p")
        .find(|p| p.text() == "quoted wisdom")
        .expect("quote paragraph");
    let quote_props = quote.child("pPr").unwrap();
    assert!(quote_props.has_child("pBdr"));
    assert_eq!(
        quote_props.child("ind").and_then(|i| i.attr("left")),
        Some("720")
    );

    // Code block: one shaded paragraph per line.
    let code_paras: Vec<_> = body
        .children_named("p")
        .filter(|p| {
            p.child("pPr")
                .and_then(|ppr| ppr.child("shd"))
                .and_then(|shd| shd.attr("fill"))
                == Some("1F2937")
        })
        .collect();
    assert_eq!(code_paras.len(), 2);
    assert_eq!(code_paras[0].text(), "let x = 1;");

    // Explicit page break.
    assert!(
        body.children_named("p")
            .any(|p| p.descendant("br").and_then(|br| br.attr("type")) == Some("page"))
    );

    // Image drawing bound to the allocated relationship, EMU-sized.
    let blip = body.descendant("blip").expect("image blip");
    assert_eq!(blip.attr("embed"), Some("rId3"));
    let extent = body.descendant("extent").unwrap();
    assert_eq!(extent.attr("cx"), Some("1143000")); // 120 px
    assert_eq!(extent.attr("cy"), Some("571500")); // 60 px

    // Fixed page geometry: one page size, four margins.
    let sect = body.child("sectPr").expect("section properties");
    let pg_sz = sect.child("pgSz").unwrap();
    assert_eq!(pg_sz.attr("w"), Some("11906"));
    assert_eq!(pg_sz.attr("h"), Some("16838"));
    let margin = sect.child("pgMar").unwrap();
    for side in ["top", "right", "bottom", "left"] {
        assert_eq!(margin.attr(side), Some("1440"));
    }
}

#[test]
fn test_generated_numbering_definitions() {
    let bytes = html_to_docx(&sample_html(), &ExportOptions::default()).unwrap();
    let registry = NumberingRegistry::from_part(&read_part(&bytes, "word/numbering.xml")).unwrap();

    // Ten levels total across the two list kinds.
    let bullets = registry.levels_for_instance(1).expect("bullet levels");
    let ordered = registry.levels_for_instance(2).expect("ordered levels");
    assert_eq!(bullets.len() + ordered.len(), 10);

    assert!(bullets.iter().all(|l| l.format == NumberFormat::Bullet));
    // Bullet glyphs vary by depth.
    assert_eq!(bullets[0].text, "\u{25CF}");
    assert_eq!(bullets[1].text, "\u{25CB}");
    // Ordered formats cycle decimal / letter / roman / decimal / letter.
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
}

#[test]
fn test_media_and_relationships() {
    let bytes = html_to_docx(&sample_html(), &ExportOptions::default()).unwrap();

    let media = read_part(&bytes, "word/media/image1.png");
    assert_eq!(media, noise_png());

    let rels = String::from_utf8(read_part(&bytes, "word/_rels/document.xml.rels")).unwrap();
    assert!(rels.contains(r#"Id="rId3""#));
    assert!(rels.contains(r#"Target="media/image1.png""#));

    let types = String::from_utf8(read_part(&bytes, "[Content_Types].xml")).unwrap();
    assert!(types.contains(r#"Extension="png""#));
}

#[test]
fn test_exported_styles_resolve() {
    let bytes = html_to_docx("<h3>x</h3>", &ExportOptions::default()).unwrap();
    let registry = StyleRegistry::from_part(&read_part(&bytes, "word/styles.xml")).unwrap();

    let resolved = registry.resolve_run("Heading3");
    assert_eq!(resolved.bold, Some(true));
    assert!(resolved.size_half_points.is_some());
}

#[test]
fn test_title_metadata() {
    let options = ExportOptions {
        title: Some("Quarterly Plan".to_string()),
    };
    let bytes = html_to_docx("<p>x</p>", &options).unwrap();
    let core = String::from_utf8(read_part(&bytes, "docProps/core.xml")).unwrap();
    assert!(core.contains("<dc:title>Quarterly Plan</dc:title>"));
}

#[test]
fn test_unknown_nodes_degrade_to_paragraphs() {
    let bytes = html_to_docx(
        "<article><custom-widget>widget text</custom-widget></article>",
        &ExportOptions::default(),
    )
    .unwrap();
    let document = XmlElement::parse(&read_part(&bytes, "word/document.xml")).unwrap();
    // The text survives as a plain paragraph; nothing is dropped.
    assert!(document.text().contains("widget text"));
}

#[test]
fn test_package_survives_storage() {
    // The storage collaborator treats the package as an opaque byte
    // stream; a disk round trip must not disturb it.
    let bytes = html_to_docx("<p>stored</p>", &ExportOptions::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exported.docx");
    std::fs::write(&path, &bytes).unwrap();
    let reloaded = std::fs::read(&path).unwrap();
    assert_eq!(bytes, reloaded);

    let result = convert_to_html(&reloaded, &ImportOptions::default()).unwrap();
    assert!(result.html.contains("stored"));
}

#[test]
fn test_export_import_round_trip() {
    let bytes = html_to_docx(&sample_html(), &ExportOptions::default()).unwrap();
    let result = convert_to_html(&bytes, &ImportOptions::default()).unwrap();

    // The heading comes back as a heading because the exported style name
    // encodes its level.
    assert!(result.html.contains("<h1"));
    assert!(result.html.contains("Annual Report"));

    // Table, list, quote, code and image content all survive the trip.
    assert_eq!(result.html.matches("<table").count(), 1);
    assert!(result.html.contains("merged cell"));
    assert!(result.html.contains("<ul>"));
    assert!(result.html.contains("alpha nested"));
    assert!(result.html.contains("<ol>"));
    assert!(result.html.contains("quoted wisdom"));
    assert!(result.html.contains("let x = 1;"));
    assert!(result.html.contains("data:image/png;base64,"));
}
