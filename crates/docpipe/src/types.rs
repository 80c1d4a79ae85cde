//! Shared data model: tasks, per-file results, buckets, and status payloads.
//!
//! Field names mirror the programmatic job interface exposed to external
//! callers, so a `status()` result can be serialised directly without a
//! translation layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `batch_<YYYYMMDD_HHMMSS>_<6 hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        let now = Utc::now();
        let suffix: u32 = uuid::Uuid::new_v4().as_u128() as u32;
        Self(format!("batch_{}_{:06x}", now.format("%Y%m%d_%H%M%S"), suffix & 0xFF_FFFF))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory, stem, and extension decomposition of an input's logical relative path.
///
/// `full_path` always uses forward slashes and never starts with `/`, matching
/// the archive-entry normalisation rules applied on output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathInfo {
    pub full_path: String,
    pub directory: String,
    pub filename: String,
    pub stem: String,
    pub extension: String,
}

impl PathInfo {
    pub fn from_relative_path(path: &str) -> Self {
        let normalized = path.replace('\\', "/");
        let normalized = normalized.strip_prefix('/').unwrap_or(&normalized);
        let p = Path::new(normalized);
        let directory = p.parent().map(|d| d.to_string_lossy().replace('\\', "/")).unwrap_or_default();
        let directory = if directory == "." { String::new() } else { directory };
        let filename = p.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_else(|| normalized.to_string());
        let stem = p.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let extension = p
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self { full_path: normalized.to_string(), directory, filename, stem, extension }
    }

    /// The same relative path with its extension swapped for `new_ext` (e.g. `"docx"`).
    pub fn with_extension(&self, new_ext: &str) -> String {
        if self.directory.is_empty() {
            format!("{}.{}", self.stem, new_ext)
        } else {
            format!("{}/{}.{}", self.directory, self.stem, new_ext)
        }
    }
}

/// Why a file did not proceed through normal classification/conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    None,
    Duplicate,
    TempFile,
    Error,
}

/// Result of the classifier for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub is_text_only: bool,
    pub reason: String,
}

/// Statistics returned by the text pipeline for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    pub original_length: usize,
    pub normalized_length: usize,
    pub noise_removed_count: usize,
    pub paragraphs_original: usize,
    pub paragraphs_exact_dup: usize,
    pub paragraphs_near_dup: usize,
    pub paragraphs_too_short: usize,
    pub paragraphs_after_dedup: usize,
}

/// Outcome of the text pipeline for one document.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub success: bool,
    pub doc_duplicate: bool,
    pub cleaned_text: String,
    pub message: String,
    pub stats: PipelineStats,
}

/// Per-input outcome, assigned to exactly one of the eight terminal buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub index: usize,
    pub path_info: PathInfo,
    pub original_path: PathBuf,
    pub converted_path: Option<PathBuf>,
    pub converted_archive_path: Option<String>,
    pub classification: Option<Classification>,
    pub disposition: Disposition,
    pub error_message: Option<String>,
    pub stats: Option<PipelineStats>,
    pub doc_duplicate: bool,
    pub raw_byte_hash: String,
}

impl FileResult {
    pub fn is_text_only(&self) -> bool {
        self.classification.as_ref().map(|c| c.is_text_only).unwrap_or(false)
    }
}

/// One of the eight disjoint result categories a task's files are partitioned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadCategory {
    PureTextConverted,
    RichMediaOriginal,
    All,
    UniquePureText,
    UniqueRichMedia,
    Duplicates,
    Failed,
    TempFiles,
}

impl DownloadCategory {
    pub const ALL: [DownloadCategory; 8] = [
        DownloadCategory::PureTextConverted,
        DownloadCategory::RichMediaOriginal,
        DownloadCategory::All,
        DownloadCategory::UniquePureText,
        DownloadCategory::UniqueRichMedia,
        DownloadCategory::Duplicates,
        DownloadCategory::Failed,
        DownloadCategory::TempFiles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadCategory::PureTextConverted => "pure_text_converted",
            DownloadCategory::RichMediaOriginal => "rich_media_original",
            DownloadCategory::All => "all",
            DownloadCategory::UniquePureText => "unique_pure_text",
            DownloadCategory::UniqueRichMedia => "unique_rich_media",
            DownloadCategory::Duplicates => "duplicates",
            DownloadCategory::Failed => "failed",
            DownloadCategory::TempFiles => "temp_files",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pure_text_converted" => DownloadCategory::PureTextConverted,
            "rich_media_original" => DownloadCategory::RichMediaOriginal,
            "all" => DownloadCategory::All,
            "unique_pure_text" => DownloadCategory::UniquePureText,
            "unique_rich_media" => DownloadCategory::UniqueRichMedia,
            "duplicates" => DownloadCategory::Duplicates,
            "failed" => DownloadCategory::Failed,
            "temp_files" => DownloadCategory::TempFiles,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    pub pure_text_count: usize,
    pub rich_media_count: usize,
    pub unique_pure_count: usize,
    pub unique_rich_count: usize,
    pub duplicate_count: usize,
    pub failed_count: usize,
    pub temp_file_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupStats {
    pub original_duplicates: usize,
    pub doc_duplicates: usize,
    pub para_exact_dup_total: usize,
    pub para_near_dup_total: usize,
    pub noise_removed_total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PureTextEntry {
    pub original_path: String,
    pub converted_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichMediaEntry {
    pub path: String,
    pub reason: String,
}

/// The full `status(task_id)` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: Progress,
    pub pure_text_files: Vec<PureTextEntry>,
    pub rich_media_files: Vec<RichMediaEntry>,
    pub downloads: std::collections::BTreeMap<String, Option<String>>,
    pub dedup_stats: DedupStats,
}

/// An input file as it comes into `submit`: a logical relative path plus bytes.
pub struct InputFile {
    pub relative_path: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_info_normalizes_separators() {
        let info = PathInfo::from_relative_path("finance\\reports\\q1.docx");
        assert_eq!(info.full_path, "finance/reports/q1.docx");
        assert_eq!(info.directory, "finance/reports");
        assert_eq!(info.stem, "q1");
        assert_eq!(info.extension, ".docx");
    }

    #[test]
    fn path_info_strips_leading_slash() {
        let info = PathInfo::from_relative_path("/a.txt");
        assert_eq!(info.full_path, "a.txt");
        assert_eq!(info.directory, "");
    }

    #[test]
    fn with_extension_swaps_suffix_preserving_directory() {
        let info = PathInfo::from_relative_path("docs/a.md");
        assert_eq!(info.with_extension("docx"), "docs/a.docx");
    }

    #[test]
    fn task_id_matches_expected_shape() {
        let id = TaskId::new();
        assert!(id.as_str().starts_with("batch_"));
        let rest = &id.as_str()["batch_".len()..];
        assert_eq!(rest.len(), "YYYYMMDD_HHMMSS_".len() + 6);
    }

    #[test]
    fn download_category_round_trips() {
        for cat in DownloadCategory::ALL {
            assert_eq!(DownloadCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(DownloadCategory::parse("bogus"), None);
    }
}
