//! Phase C: partitions a task's `FileResult`s into the eight disjoint
//! download buckets and rolls up `Progress`/`DedupStats` for the status
//! snapshot.

use crate::bundle::BundleEntry;
use crate::dedup::sha256_bytes;
use crate::types::{DedupStats, Disposition, DownloadCategory, FileResult, Progress, PureTextEntry, RichMediaEntry};
use std::collections::{HashMap, HashSet};

pub struct BucketAssignment {
    pure_text_converted: Vec<usize>,
    rich_media_original: Vec<usize>,
    unique_pure_text: Vec<usize>,
    unique_rich_media: Vec<usize>,
    duplicates: Vec<usize>,
    failed: Vec<usize>,
    temp_files: Vec<usize>,
    results: Vec<FileResult>,
}

impl BucketAssignment {
    fn indices_for(&self, category: DownloadCategory) -> &[usize] {
        match category {
            DownloadCategory::PureTextConverted => &self.pure_text_converted,
            DownloadCategory::RichMediaOriginal => &self.rich_media_original,
            DownloadCategory::UniquePureText => &self.unique_pure_text,
            DownloadCategory::UniqueRichMedia => &self.unique_rich_media,
            DownloadCategory::Duplicates => &self.duplicates,
            DownloadCategory::Failed => &self.failed,
            DownloadCategory::TempFiles => &self.temp_files,
            DownloadCategory::All => unreachable!("handled separately, no single index list"),
        }
    }

    pub fn entries_for(&self, category: DownloadCategory) -> Vec<BundleEntry> {
        if category == DownloadCategory::All {
            let mut indices: Vec<usize> = self
                .pure_text_converted
                .iter()
                .chain(self.rich_media_original.iter())
                .copied()
                .collect();
            indices.sort_unstable();
            return indices.iter().map(|&i| self.entry_for_index(i)).collect();
        }
        self.indices_for(category).iter().map(|&i| self.entry_for_index(i)).collect()
    }

    fn entry_for_index(&self, index: usize) -> BundleEntry {
        let result = &self.results[index];
        let source_path = result.converted_path.clone().unwrap_or_else(|| result.original_path.clone());
        BundleEntry { source_path, archive_path: result.path_info.full_path.clone() }
    }

    pub fn pure_text_entries(&self) -> Vec<PureTextEntry> {
        self.pure_text_converted
            .iter()
            .map(|&i| {
                let r = &self.results[i];
                PureTextEntry {
                    original_path: r.path_info.full_path.clone(),
                    converted_path: r.converted_archive_path.clone().unwrap_or_default(),
                }
            })
            .collect()
    }

    pub fn rich_media_entries(&self) -> Vec<RichMediaEntry> {
        self.rich_media_original
            .iter()
            .map(|&i| {
                let r = &self.results[i];
                RichMediaEntry {
                    path: r.path_info.full_path.clone(),
                    reason: r.classification.as_ref().map(|c| c.reason.clone()).unwrap_or_default(),
                }
            })
            .collect()
    }
}

/// Builds the eight-way partition plus the `Progress`/`DedupStats` rollup for
/// a completed task, re-imposing order by original input index within each
/// bucket: Phase B completions have no cross-file ordering guarantee, so
/// Phase C re-imposes one by original input index.
pub fn assign(results: &[FileResult]) -> (BucketAssignment, DedupStats, Progress) {
    let mut sorted: Vec<&FileResult> = results.iter().collect();
    sorted.sort_by_key(|r| r.index);

    let mut pure_text_converted = Vec::new();
    let mut rich_media_original = Vec::new();
    let mut duplicates = Vec::new();
    let mut failed = Vec::new();
    let mut temp_files = Vec::new();

    for result in &sorted {
        match result.disposition {
            Disposition::Duplicate => duplicates.push(result.index),
            Disposition::TempFile => temp_files.push(result.index),
            Disposition::Error => failed.push(result.index),
            Disposition::None => {
                if result.is_text_only() {
                    pure_text_converted.push(result.index);
                } else {
                    rich_media_original.push(result.index);
                }
            }
        }
    }

    let unique_pure_text = dedup_by_content_hash(results, &pure_text_converted, |r| {
        r.converted_path.as_ref().and_then(|p| crate::docx_text::extract_text(p).ok()).map(|t| sha256_text_of(&t))
    });
    let unique_rich_media = dedup_by_content_hash(results, &rich_media_original, |r| {
        let path = r.converted_path.as_ref().unwrap_or(&r.original_path);
        std::fs::read(path).ok().map(|b| sha256_bytes(&b))
    });

    let mut dedup_stats = DedupStats {
        original_duplicates: duplicates.len(),
        ..Default::default()
    };
    for result in &sorted {
        if result.doc_duplicate {
            dedup_stats.doc_duplicates += 1;
        }
        if let Some(stats) = &result.stats {
            dedup_stats.para_exact_dup_total += stats.paragraphs_exact_dup;
            dedup_stats.para_near_dup_total += stats.paragraphs_near_dup;
            dedup_stats.noise_removed_total += stats.noise_removed_count;
        }
    }

    let progress = Progress {
        total: results.len(),
        completed: results.len(),
        pure_text_count: pure_text_converted.len(),
        rich_media_count: rich_media_original.len(),
        unique_pure_count: unique_pure_text.len(),
        unique_rich_count: unique_rich_media.len(),
        duplicate_count: duplicates.len(),
        failed_count: failed.len(),
        temp_file_count: temp_files.len(),
    };

    let assignment = BucketAssignment {
        pure_text_converted,
        rich_media_original,
        unique_pure_text,
        unique_rich_media,
        duplicates,
        failed,
        temp_files,
        results: results.to_vec(),
    };

    (assignment, dedup_stats, progress)
}

fn sha256_text_of(text: &str) -> String {
    crate::dedup::sha256_text(text)
}

/// Deduplicates `indices` (already in original-input order) by a content
/// hash, earliest occurrence wins.
fn dedup_by_content_hash(
    results: &[FileResult],
    indices: &[usize],
    hash_of: impl Fn(&FileResult) -> Option<String>,
) -> Vec<usize> {
    let by_index: HashMap<usize, &FileResult> = results.iter().map(|r| (r.index, r)).collect();
    let mut seen_hashes = HashSet::new();
    let mut kept = Vec::new();
    for &index in indices {
        let Some(result) = by_index.get(&index) else { continue };
        let Some(hash) = hash_of(result) else {
            kept.push(index);
            continue;
        };
        if seen_hashes.insert(hash) {
            kept.push(index);
        }
    }
    kept
}
