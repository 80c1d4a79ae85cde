//! DOCX structural classification.
//!
//! A `.docx` is a zip of OOXML parts. Rather than building a full document
//! model (a fuller OOXML parser would do that for content
//! extraction), classification only needs three yes/no structural questions,
//! so this reads `word/document.xml` once and scans it directly with
//! `quick_xml`, grounded on the same zip+quick-xml pairing.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::path::Path;

pub fn classify_docx(path: &Path) -> (bool, String) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return (false, format!("error opening file: {e}")),
    };
    let mut archive = match zip::ZipArchive::new(file) {
        Ok(a) => a,
        Err(e) => return (false, format!("error reading docx archive: {e}")),
    };

    let media_count = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|e| e.name().to_string()))
        .filter(|name| name.starts_with("word/media/"))
        .count();

    let document_xml = match read_entry(&mut archive, "word/document.xml") {
        Ok(x) => x,
        Err(e) => return (false, format!("error reading document.xml: {e}")),
    };

    let structure = scan_document_xml(&document_xml);

    if structure.table_count > 0 {
        return (false, format!("contains {} table(s)", structure.table_count));
    }
    if media_count > 0 {
        return (false, format!("contains {media_count} embedded image(s)"));
    }
    if structure.drawing_count > 0 {
        return (false, format!("contains {} embedded graphic object(s)", structure.drawing_count));
    }
    if !structure.has_text {
        return (false, "document has no non-empty paragraphs".to_string());
    }

    (true, format!("pure-text document ({} paragraphs)", structure.paragraph_count))
}

#[derive(Default)]
struct DocxStructure {
    table_count: usize,
    drawing_count: usize,
    paragraph_count: usize,
    has_text: bool,
}

fn scan_document_xml(xml: &str) -> DocxStructure {
    let mut structure = DocxStructure::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut in_paragraph = false;
    let mut paragraph_has_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"tbl" => structure.table_count += 1,
                b"drawing" => structure.drawing_count += 1,
                b"p" => {
                    in_paragraph = true;
                    paragraph_has_text = false;
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_paragraph => {
                if let Ok(text) = t.unescape() {
                    if !text.trim().is_empty() {
                        paragraph_has_text = true;
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" => {
                in_paragraph = false;
                if paragraph_has_text {
                    structure.paragraph_count += 1;
                    structure.has_text = true;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    structure
}

fn read_entry<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> std::io::Result<String> {
    use std::io::Read;
    let mut entry = archive
        .by_name(name)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let mut buf = String::new();
    entry.read_to_string(&mut buf)?;
    Ok(buf)
}
