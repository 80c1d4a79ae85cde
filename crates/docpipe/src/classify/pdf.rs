//! PDF structural classification, built on the same `lopdf::Document` used
//! elsewhere in this crate for raster extraction. Classification reuses
//! its page-image enumeration and adds a content-stream scan for vector
//! drawing primitives, since lopdf has no higher-level "is this a table" API.

use lopdf::content::Content;
use lopdf::Document;
use std::path::Path;

/// At or above this many simple line/rectangle primitives on
/// a single page, assume a ruled table rather than incidental decoration.
const LINE_PRIMITIVE_THRESHOLD: usize = 11;

pub fn classify_pdf(path: &Path) -> (bool, String) {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => return (false, format!("error reading file: {e}")),
    };
    let document = match Document::load_mem(&bytes) {
        Ok(d) => d,
        Err(e) => return (false, format!("invalid pdf: {e}")),
    };

    let pages = document.get_pages();
    let mut total_images = 0usize;
    let mut total_curves = 0usize;
    let mut max_line_primitives = 0usize;

    for (_, page_id) in pages.iter() {
        if let Ok(images) = document.get_page_images(*page_id) {
            total_images += images.len();
        }
        if let Ok(bytes) = document.get_page_content(*page_id) {
            if let Ok(content) = Content::decode(&bytes) {
                let mut line_primitives = 0usize;
                for op in &content.operations {
                    match op.operator.as_str() {
                        "re" | "l" => line_primitives += 1,
                        "c" | "v" | "y" => total_curves += 1,
                        _ => {}
                    }
                }
                max_line_primitives = max_line_primitives.max(line_primitives);
            }
        }
    }

    if total_images > 0 {
        return (false, format!("contains {total_images} raster image(s)"));
    }
    if total_curves > 0 {
        return (false, format!("contains {total_curves} complex vector drawing primitive(s)"));
    }
    if max_line_primitives >= LINE_PRIMITIVE_THRESHOLD {
        return (
            false,
            format!("page contains {max_line_primitives} line/rectangle primitives, likely a ruled table"),
        );
    }

    (true, format!("pure-text pdf ({} page(s))", pages.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    fn minimal_pdf_with_content(content_ops: &[u8]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content_ops.to_vec()));
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! { "Font" => dictionary! { "F1" => font_id } });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn plain_text_stream_is_text_only() {
        let bytes = minimal_pdf_with_content(b"BT /F1 12 Tf (Hello) Tj ET");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, bytes).unwrap();
        let (is_text_only, _) = classify_pdf(&path);
        assert!(is_text_only);
    }

    #[test]
    fn heavy_ruled_grid_is_rich_media() {
        let mut ops = Vec::new();
        for _ in 0..12 {
            ops.extend_from_slice(b"0 0 10 10 re S ");
        }
        let bytes = minimal_pdf_with_content(&ops);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, bytes).unwrap();
        let (is_text_only, reason) = classify_pdf(&path);
        assert!(!is_text_only);
        assert!(reason.contains("table"));
    }
}
