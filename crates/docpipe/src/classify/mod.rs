//! Text-only / rich-media classification.
//!
//! Extension dispatch to per-format detectors; every detector returns a
//! human-readable reason alongside its verdict so the caller can surface it
//! without re-deriving it later.

mod docx;
mod office_xml;
mod pdf;

use crate::types::Classification;
use std::path::Path;

/// Inspects a file on disk and decides whether it is pure text, by a strict
/// structural definition, or rich media.
pub fn classify(path: &Path) -> Classification {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let (is_text_only, reason) = match extension.as_str() {
        "txt" | "md" => classify_plain_text(path),
        "docx" => docx::classify_docx(path),
        "xlsx" | "xls" => office_xml::classify_spreadsheet(path),
        "pptx" | "ppt" => office_xml::classify_presentation(path),
        "pdf" => pdf::classify_pdf(path),
        "doc" => (false, "legacy word document, requires transcoding before classification".to_string()),
        other => (false, format!("unsupported format: .{other}")),
    };

    Classification { is_text_only, reason }
}

fn classify_plain_text(path: &Path) -> (bool, String) {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return (false, format!("error reading file: {e}")),
    };
    if IMG_MARKDOWN.is_match(&content) || content.to_lowercase().contains("<img") {
        return (false, "contains image reference".to_string());
    }
    (true, "pure text file".to_string())
}

static IMG_MARKDOWN: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"!\[.*?\]\(.*?\)").unwrap());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        dir
    }

    #[test]
    fn plain_markdown_without_images_is_text_only() {
        let dir = write_tmp("a.md", "# Title\n\nJust words.");
        let result = classify(&dir.path().join("a.md"));
        assert!(result.is_text_only);
    }

    #[test]
    fn markdown_with_image_reference_is_rich_media() {
        let dir = write_tmp("a.md", "See ![alt](pic.png) above.");
        let result = classify(&dir.path().join("a.md"));
        assert!(!result.is_text_only);
    }

    #[test]
    fn unknown_extension_is_never_text_only() {
        let dir = write_tmp("a.xyz", "anything");
        let result = classify(&dir.path().join("a.xyz"));
        assert!(!result.is_text_only);
        assert!(result.reason.contains("unsupported"));
    }
}
