//! Plain-text round-trip for the minimal DOCX artifacts this pipeline
//! produces: pull paragraph text back out for cleaning, and rewrite a
//! cleaned paragraph list back into `word/document.xml`.
//!
//! Shares the zip+quick-xml approach used throughout `classify::docx` and
//! `transcode::native` rather than pulling in a full document-model parser,
//! which would carry headers, footers, notes and numbering this pipeline
//! never needs.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

pub fn extract_paragraphs(path: &Path) -> crate::error::Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("word/document.xml")?, &mut xml)?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"p" => {
                in_paragraph = true;
                current.clear();
            }
            Ok(Event::Text(t)) if in_paragraph => {
                if let Ok(text) = t.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" => {
                in_paragraph = false;
                if !current.trim().is_empty() {
                    paragraphs.push(current.clone());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(crate::error::PipelineError::Internal(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

pub fn extract_text(path: &Path) -> crate::error::Result<String> {
    Ok(extract_paragraphs(path)?.join("\n\n"))
}

/// Overwrites `path`'s `word/document.xml` in place with one paragraph per
/// entry in `text` (split on blank lines), or one heading paragraph when an
/// entry begins with `#` markers.
pub fn write_text(path: &Path, text: &str) -> crate::error::Result<()> {
    let paragraphs: Vec<&str> = text.split("\n\n").filter(|p| !p.trim().is_empty()).collect();

    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#,
    )?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
    )?;

    zip.start_file("word/document.xml", options)?;
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    for paragraph in &paragraphs {
        let trimmed = paragraph.trim();
        let (style, text) = if let Some(heading_text) = trimmed.strip_prefix("# ").or_else(|| trimmed.strip_prefix('#')) {
            ("Heading1", heading_text.trim())
        } else {
            ("Normal", trimmed)
        };
        body.push_str(&format!(
            "<w:p><w:pPr><w:pStyle w:val=\"{style}\"/></w:pPr><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape_xml(text)
        ));
    }
    body.push_str("</w:body></w:document>");
    zip.write_all(body.as_bytes())?;
    zip.finish()?;
    Ok(())
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plain_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.docx");
        write_text(&path, "First paragraph.\n\nSecond paragraph.").unwrap();
        let text = extract_text(&path).unwrap();
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));
    }

    #[test]
    fn heading_marker_is_preserved_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.docx");
        write_text(&path, "# Title\n\nBody text here.").unwrap();
        let text = extract_text(&path).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("Body text here."));
    }
}
