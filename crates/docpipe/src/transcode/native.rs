//! Native fallback engine: specific format pairs implemented directly in
//! Rust when no headless converter is available.
//!
//! `.txt`/`.md` → `.docx` wraps each line as a paragraph; `.pdf` → `.docx`
//! extracts per-page text via `lopdf`'s content-stream decoder (the same
//! crate the classifier already uses for its structural scan). Building the
//! OOXML package by hand with `zip::write::ZipWriter` follows the same
//! pattern used elsewhere in this crate's test fixtures.

use super::TargetFormat;
use lopdf::content::Content;
use lopdf::Document as PdfDocument;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

pub async fn convert(input: &Path, target: TargetFormat, temp_dir: &Path) -> Option<PathBuf> {
    if target != TargetFormat::Docx {
        return None;
    }

    let extension = input.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase())?;
    let paragraphs = match extension.as_str() {
        "txt" | "md" => text_to_paragraphs(input).ok()?,
        "pdf" => pdf_to_paragraphs(input).ok()?,
        "docx" => {
            let out = temp_dir.join(format!("temp_{}.docx", uuid::Uuid::new_v4().simple()));
            tokio::fs::copy(input, &out).await.ok()?;
            return Some(out);
        }
        _ => return None,
    };

    let out = temp_dir.join(format!("temp_{}.docx", uuid::Uuid::new_v4().simple()));
    write_minimal_docx(&out, &paragraphs).ok()?;
    Some(out)
}

fn text_to_paragraphs(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(|l| l.to_string()).collect())
}

fn pdf_to_paragraphs(path: &Path) -> std::io::Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let document = PdfDocument::load_mem(&bytes).map_err(std::io::Error::other)?;
    let mut paragraphs = Vec::new();
    for (_, page_id) in document.get_pages() {
        if let Ok(raw) = document.get_page_content(page_id) {
            if let Ok(content) = Content::decode(&raw) {
                let mut line = String::new();
                for op in &content.operations {
                    if op.operator == "Tj" || op.operator == "TJ" {
                        for operand in &op.operands {
                            collect_text(operand, &mut line);
                        }
                    }
                }
                if !line.trim().is_empty() {
                    paragraphs.push(line);
                }
            }
        }
    }
    Ok(paragraphs)
}

fn collect_text(obj: &lopdf::Object, out: &mut String) {
    match obj {
        lopdf::Object::String(bytes, _) => out.push_str(&String::from_utf8_lossy(bytes)),
        lopdf::Object::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}

fn write_minimal_docx(path: &Path, paragraphs: &[String]) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

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
    for paragraph in paragraphs {
        body.push_str("<w:p><w:r><w:t xml:space=\"preserve\">");
        body.push_str(&escape_xml(paragraph));
        body.push_str("</w:t></w:r></w:p>");
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

    #[tokio::test]
    async fn text_wraps_each_line_into_a_paragraph() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.txt");
        std::fs::write(&input, "line one\nline two").unwrap();
        let out = convert(&input, TargetFormat::Docx, dir.path()).await.unwrap();
        assert!(out.is_file());
        let bytes = std::fs::read(out).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut doc_xml = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("word/document.xml").unwrap(), &mut doc_xml).unwrap();
        assert!(doc_xml.contains("line one"));
        assert!(doc_xml.contains("line two"));
    }

    #[tokio::test]
    async fn non_docx_target_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.txt");
        std::fs::write(&input, "x").unwrap();
        let out = convert(&input, TargetFormat::Xlsx, dir.path()).await;
        assert!(out.is_none());
    }
}
