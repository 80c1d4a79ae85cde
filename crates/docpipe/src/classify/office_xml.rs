//! Spreadsheet and presentation classification.
//!
//! Both formats are tabular/rich by definition, so these never
//! return `is_text_only = true`; the only job left is producing a reason
//! that names what the file actually contains.

use std::fs::File;
use std::path::Path;

pub fn classify_spreadsheet(path: &Path) -> (bool, String) {
    match sheet_count(path) {
        Ok(n) => (false, format!("spreadsheet file ({n} worksheet(s))")),
        Err(e) => (false, format!("error reading spreadsheet: {e}")),
    }
}

pub fn classify_presentation(path: &Path) -> (bool, String) {
    match slide_count(path) {
        Ok(n) => (false, format!("presentation file ({n} slide(s))")),
        Err(e) => (false, format!("error reading presentation: {e}")),
    }
}

fn sheet_count(path: &Path) -> std::io::Result<usize> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok((0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|e| e.name().to_string()))
        .filter(|name| name.starts_with("xl/worksheets/sheet") && name.ends_with(".xml"))
        .count())
}

fn slide_count(path: &Path) -> std::io::Result<usize> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok((0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|e| e.name().to_string()))
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_with_entries(entries: &[&str]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for e in entries {
                zip.start_file(*e, options).unwrap();
                zip.write_all(b"<x/>").unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn xlsx_is_never_text_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.xlsx");
        std::fs::write(&path, zip_with_entries(&["xl/worksheets/sheet1.xml", "xl/worksheets/sheet2.xml"])).unwrap();
        let (is_text_only, reason) = classify_spreadsheet(&path);
        assert!(!is_text_only);
        assert!(reason.contains('2'));
    }

    #[test]
    fn pptx_is_never_text_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pptx");
        std::fs::write(&path, zip_with_entries(&["ppt/slides/slide1.xml"])).unwrap();
        let (is_text_only, _) = classify_presentation(&path);
        assert!(!is_text_only);
    }
}
