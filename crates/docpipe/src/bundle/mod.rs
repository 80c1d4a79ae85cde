//! Archive construction for one download category.
//!
//! Entry paths are normalised to forward slashes with no leading `/` before
//! being written, and a partially-built archive is removed on error rather
//! than left behind half-written.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{SimpleFileOptions, ZipWriter};

pub struct BundleEntry {
    pub source_path: PathBuf,
    pub archive_path: String,
}

/// Writes entries to `output_path` as a deflate zip. Missing sources are
/// logged and skipped rather than failing the whole archive; any write error
/// removes the partially-written file before returning.
pub fn build_archive(entries: &[BundleEntry], output_path: &Path) -> crate::error::Result<()> {
    match build_archive_inner(entries, output_path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = std::fs::remove_file(output_path);
            Err(e)
        }
    }
}

fn build_archive_inner(entries: &[BundleEntry], output_path: &Path) -> crate::error::Result<()> {
    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in entries {
        if !entry.source_path.is_file() {
            tracing::warn!(source = %entry.source_path.display(), "bundle source missing, skipping");
            continue;
        }
        let arcname = normalize_archive_path(&entry.archive_path);
        if arcname.is_empty() {
            tracing::warn!(source = %entry.source_path.display(), "empty archive path, skipping");
            continue;
        }

        let bytes = std::fs::read(&entry.source_path)?;
        zip.start_file(&arcname, options)?;
        zip.write_all(&bytes)?;
    }

    zip.finish()?;
    Ok(())
}

fn normalize_archive_path(path: &str) -> String {
    let forward = path.replace('\\', "/");
    forward.strip_prefix('/').unwrap_or(&forward).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_archive_preserving_relative_structure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, b"hello").unwrap();

        let entries = vec![BundleEntry { source_path: src.clone(), archive_path: "docs/a.txt".to_string() }];
        let out = dir.path().join("out.zip");
        build_archive(&entries, &out).unwrap();

        let file = File::open(&out).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert!(archive.by_name("docs/a.txt").is_ok());
    }

    #[test]
    fn missing_source_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![BundleEntry {
            source_path: dir.path().join("missing.txt"),
            archive_path: "missing.txt".to_string(),
        }];
        let out = dir.path().join("out.zip");
        assert!(build_archive(&entries, &out).is_ok());
    }

    #[test]
    fn leading_slash_and_backslashes_are_normalized() {
        assert_eq!(normalize_archive_path("/a\\b\\c.txt"), "a/b/c.txt");
    }
}
