//! Batch ingestion orchestration: the five-phase pipeline that
//! turns a list of uploaded files into eight bucketed archives.
//!
//! Phase B's bounded-concurrency fan-out/fan-in is a `Semaphore` gate plus a
//! `JoinSet` keyed by original index, so results land back in input order
//! regardless of completion order.

mod buckets;

use crate::bundle::build_archive;
use crate::classify;
use crate::cleaner::StorageCleaner;
use crate::config::PipelineConfig;
use crate::dedup::{sha256_bytes, DedupStore};
use crate::docx_text;
use crate::error::{PipelineError, Result};
use crate::registry::JobRegistry;
use crate::textpipeline::TextPipeline;
use crate::transcode::{TargetFormat, Transcoder};
use crate::types::*;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Clone)]
pub struct BatchOrchestrator {
    config: Arc<PipelineConfig>,
    store: Arc<DedupStore>,
    registry: Arc<JobRegistry>,
    transcoder: Arc<Transcoder>,
    semaphore: Arc<Semaphore>,
}

impl BatchOrchestrator {
    pub fn new(config: PipelineConfig, store: DedupStore) -> Self {
        let transcoder = Transcoder::new(&config);
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_tasks));
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            registry: Arc::new(JobRegistry::new()),
            transcoder: Arc::new(transcoder),
            semaphore,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    fn task_dir(&self, task_id: &TaskId) -> PathBuf {
        self.config.storage_root.join("batch").join(task_id.as_str())
    }

    fn temp_dir(&self) -> PathBuf {
        self.config.storage_root.join("temp")
    }

    /// Allocates the task directory, persists raw bytes (Phase A), and
    /// dispatches Phase B..E on a background task. Returns immediately.
    pub async fn submit(&self, files: Vec<InputFile>) -> Result<TaskId> {
        let task_id = TaskId::new();
        let task_dir = self.task_dir(&task_id);
        for sub in ["original", "converted", "downloads"] {
            tokio::fs::create_dir_all(task_dir.join(sub)).await?;
        }
        tokio::fs::create_dir_all(self.temp_dir()).await?;

        self.registry.insert(StatusSnapshot {
            task_id: task_id.to_string(),
            status: TaskStatus::Processing,
            progress: Progress { total: files.len(), ..Default::default() },
            pure_text_files: Vec::new(),
            rich_media_files: Vec::new(),
            downloads: std::collections::BTreeMap::new(),
            dedup_stats: DedupStats::default(),
        });

        let orchestrator = self.clone();
        let task_id_for_task = task_id.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run_task(&task_id_for_task, files).await {
                tracing::error!(task_id = %task_id_for_task, error = %e, "task failed catastrophically");
                orchestrator.registry.set_status(task_id_for_task.as_str(), TaskStatus::Failed);
            }
        });

        Ok(task_id)
    }

    pub fn status(&self, task_id: &str) -> Result<StatusSnapshot> {
        self.registry.get(task_id).ok_or_else(|| PipelineError::TaskNotFound(task_id.to_string()))
    }

    pub fn download_archive_path(&self, task_id: &str, category: DownloadCategory) -> Result<PathBuf> {
        let snapshot = self.status(task_id)?;
        let relative = snapshot
            .downloads
            .get(category.as_str())
            .cloned()
            .flatten()
            .ok_or_else(|| PipelineError::Internal(format!("no archive produced for category {}", category.as_str())))?;
        Ok(self.config.storage_root.join("batch").join(task_id).join(relative))
    }

    async fn run_task(&self, task_id: &TaskId, files: Vec<InputFile>) -> Result<()> {
        let task_dir = self.task_dir(task_id);
        let results = self.phase_a_ingest(&task_dir, files).await?;
        let results = self.phase_b_process(&task_dir, &self.temp_dir(), results).await;
        let (buckets, dedup_stats, progress) = buckets::assign(&results);
        self.phase_d_bundle(task_id, &task_dir, &buckets).await?;

        self.registry.update(task_id.as_str(), |snapshot| {
            snapshot.status = TaskStatus::Completed;
            snapshot.progress = progress;
            snapshot.dedup_stats = dedup_stats;
            snapshot.pure_text_files = buckets.pure_text_entries();
            snapshot.rich_media_files = buckets.rich_media_entries();
        });
        Ok(())
    }

    async fn phase_a_ingest(&self, task_dir: &Path, files: Vec<InputFile>) -> Result<Vec<FileResult>> {
        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            let path_info = PathInfo::from_relative_path(&file.relative_path);
            let raw_hash = sha256_bytes(&file.bytes);
            let disposition = if seen.contains(&raw_hash) { Disposition::Duplicate } else { Disposition::None };
            seen.insert(raw_hash.clone());

            let original_path = task_dir.join("original").join(&path_info.full_path);
            if let Some(parent) = original_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&original_path, &file.bytes).await?;

            results.push(FileResult {
                index,
                path_info,
                original_path,
                converted_path: None,
                converted_archive_path: None,
                classification: None,
                disposition,
                error_message: None,
                stats: None,
                doc_duplicate: false,
                raw_byte_hash: raw_hash,
            });
        }

        Ok(results)
    }

    async fn phase_b_process(&self, task_dir: &Path, temp_dir: &Path, results: Vec<FileResult>) -> Vec<FileResult> {
        let mut set = JoinSet::new();
        let mut final_results: Vec<Option<FileResult>> = Vec::with_capacity(results.len());
        final_results.resize_with(results.len(), || None);

        for result in results {
            if result.disposition != Disposition::None {
                final_results[result.index] = Some(result);
                continue;
            }

            let semaphore = Arc::clone(&self.semaphore);
            let store = Arc::clone(&self.store);
            let transcoder = Arc::clone(&self.transcoder);
            let config = Arc::clone(&self.config);
            let task_dir = task_dir.to_path_buf();
            let temp_dir = temp_dir.to_path_buf();

            set.spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                let index = result.index;
                let processed = process_one_file(result, &task_dir, &temp_dir, &store, &transcoder, &config).await;
                (index, processed)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => final_results[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "phase B worker panicked"),
            }
        }

        final_results.into_iter().flatten().collect()
    }

    async fn phase_d_bundle(
        &self,
        task_id: &TaskId,
        task_dir: &Path,
        buckets: &buckets::BucketAssignment,
    ) -> Result<()> {
        let downloads_dir = task_dir.join("downloads");
        let mut downloads = std::collections::BTreeMap::new();

        for category in DownloadCategory::ALL {
            let entries = buckets.entries_for(category);
            if entries.is_empty() {
                downloads.insert(category.as_str().to_string(), None);
                continue;
            }
            let filename = format!("{}_{}.zip", category.as_str(), task_id);
            let archive_path = downloads_dir.join(&filename);
            build_archive(&entries, &archive_path)?;
            downloads.insert(category.as_str().to_string(), Some(format!("downloads/{filename}")));
        }

        self.registry.update(task_id.as_str(), |snapshot| {
            snapshot.downloads = downloads.clone();
        });
        Ok(())
    }

    pub async fn clean_all(&self, days: i64) -> crate::cleaner::CombinedCleanResult {
        StorageCleaner::new(self.config.storage_root.clone()).clean_all(days)
    }

    pub async fn dedup_cache_stats(&self) -> DedupStats {
        self.store.stats().await
    }

    pub async fn dedup_cache_clear(&self) {
        self.store.clear_all().await
    }
}

/// Classification, target-extension decision, transcoding, and text-pipeline
/// invocation for one non-duplicate file. Errors are caught at this boundary
/// and folded into `Disposition::Error` rather than propagated — an uncaught
/// error here never fails the whole task, only this one file.
async fn process_one_file(
    mut result: FileResult,
    task_dir: &Path,
    temp_dir: &Path,
    store: &Arc<DedupStore>,
    transcoder: &Transcoder,
    config: &PipelineConfig,
) -> FileResult {
    if config.skip_temp_files && result.path_info.filename.starts_with("~$") {
        result.disposition = Disposition::TempFile;
        return result;
    }

    match process_one_file_inner(&result, task_dir, temp_dir, store, transcoder, config).await {
        Ok((classification, converted_path, converted_archive_path, stats, doc_duplicate)) => {
            result.classification = Some(classification);
            result.converted_path = converted_path;
            result.converted_archive_path = converted_archive_path;
            result.stats = stats;
            result.doc_duplicate = doc_duplicate;
            result
        }
        Err(e) => {
            result.disposition = Disposition::Error;
            result.error_message = Some(e.to_string());
            result
        }
    }
}

type ProcessedFile = (Classification, Option<PathBuf>, Option<String>, Option<PipelineStats>, bool);

async fn process_one_file_inner(
    result: &FileResult,
    task_dir: &Path,
    temp_dir: &Path,
    store: &Arc<DedupStore>,
    transcoder: &Transcoder,
    config: &PipelineConfig,
) -> Result<ProcessedFile> {
    let mut classification = classify::classify(&result.original_path);
    let target = decide_target(&result.path_info.extension, classification.is_text_only);

    let Some(target) = target else {
        return Ok((classification, None, None, None, false));
    };

    let converted_archive_rel = result.path_info.with_extension(target.extension());
    let converted_dest = task_dir.join("converted").join(&converted_archive_rel);
    if let Some(parent) = converted_dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let Some(temp_output) = transcoder.convert(&result.original_path, target, temp_dir).await else {
        return Err(PipelineError::TranscodeFailed(format!("conversion to {:?} failed", target)));
    };
    if tokio::fs::rename(&temp_output, &converted_dest).await.is_err() {
        tokio::fs::copy(&temp_output, &converted_dest).await?;
        let _ = tokio::fs::remove_file(&temp_output).await;
    }

    classification = finalize_classification(&result.path_info.extension, &converted_dest, classification);

    if !classification.is_text_only {
        return Ok((classification, Some(converted_dest), Some(converted_archive_rel), None, false));
    }

    let pipeline = TextPipeline::new(Arc::clone(store), config);
    let extracted = docx_text::extract_text(&converted_dest)?;
    let outcome = pipeline.process(&extracted, &result.path_info.stem).await;
    docx_text::write_text(&converted_dest, &outcome.cleaned_text)?;

    Ok((classification, Some(converted_dest), Some(converted_archive_rel), Some(outcome.stats), outcome.doc_duplicate))
}

fn is_legacy_extension(extension: &str) -> bool {
    matches!(extension, ".doc" | ".xls" | ".ppt")
}

/// Legacy formats (.doc/.xls/.ppt) carry a placeholder classification from
/// `classify::classify`, since there is nothing to structurally inspect until
/// the file has been transcoded to its modern equivalent. Once `converted_dest`
/// exists, re-classify it and use that verdict for bucket/pipeline decisions
/// instead of the placeholder.
fn finalize_classification(extension: &str, converted_dest: &Path, placeholder: Classification) -> Classification {
    if is_legacy_extension(extension) {
        classify::classify(converted_dest)
    } else {
        placeholder
    }
}

fn decide_target(extension: &str, is_text_only: bool) -> Option<TargetFormat> {
    match (extension, is_text_only) {
        (".doc", _) => Some(TargetFormat::Docx),
        (".xls", _) => Some(TargetFormat::Xlsx),
        (".ppt", _) => Some(TargetFormat::Pptx),
        (".docx", true) => Some(TargetFormat::Docx),
        (".docx", false) => None,
        (".xlsx", _) | (".pptx", _) => None,
        (".txt", true) | (".md", true) => Some(TargetFormat::Docx),
        (".pdf", true) => Some(TargetFormat::Docx),
        (".pdf", false) => None,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_decision_covers_legacy_and_modern_formats() {
        assert_eq!(decide_target(".doc", true), Some(TargetFormat::Docx));
        assert_eq!(decide_target(".doc", false), Some(TargetFormat::Docx));
        assert_eq!(decide_target(".xls", false), Some(TargetFormat::Xlsx));
        assert_eq!(decide_target(".docx", true), Some(TargetFormat::Docx));
        assert_eq!(decide_target(".docx", false), None);
        assert_eq!(decide_target(".xlsx", false), None);
        assert_eq!(decide_target(".txt", true), Some(TargetFormat::Docx));
        assert_eq!(decide_target(".pdf", true), Some(TargetFormat::Docx));
        assert_eq!(decide_target(".pdf", false), None);
    }

    #[test]
    fn legacy_extensions_are_recognized() {
        assert!(is_legacy_extension(".doc"));
        assert!(is_legacy_extension(".xls"));
        assert!(is_legacy_extension(".ppt"));
        assert!(!is_legacy_extension(".docx"));
        assert!(!is_legacy_extension(".txt"));
    }

    fn write_minimal_docx(path: &std::path::Path, document_xml: &str) {
        use std::io::Write;
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn legacy_doc_is_reclassified_from_its_transcoded_artifact_text_only() {
        let dir = tempfile::tempdir().unwrap();
        let converted = dir.path().join("memo.docx");
        let xml = r#"<w:document xmlns:w="ns"><w:body><w:p><w:r><w:t>Plain paragraph only.</w:t></w:r></w:p></w:body></w:document>"#;
        write_minimal_docx(&converted, xml);

        let placeholder = Classification { is_text_only: false, reason: "legacy word document, requires transcoding before classification".to_string() };
        let result = finalize_classification(".doc", &converted, placeholder);

        assert!(result.is_text_only, "a plain-paragraphs-only transcoded .doc must end up text-only");
    }

    #[test]
    fn legacy_doc_with_table_stays_rich_media_after_reclassification() {
        let dir = tempfile::tempdir().unwrap();
        let converted = dir.path().join("report.docx");
        let xml = r#"<w:document xmlns:w="ns"><w:body><w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body></w:document>"#;
        write_minimal_docx(&converted, xml);

        let placeholder = Classification { is_text_only: false, reason: "legacy word document, requires transcoding before classification".to_string() };
        let result = finalize_classification(".doc", &converted, placeholder);

        assert!(!result.is_text_only);
        assert!(result.reason.contains("table"));
    }

    #[test]
    fn non_legacy_extension_keeps_the_placeholder_classification_untouched() {
        let placeholder = Classification { is_text_only: true, reason: "pure text file".to_string() };
        let result = finalize_classification(".txt", std::path::Path::new("/does/not/exist.docx"), placeholder.clone());
        assert_eq!(result.is_text_only, placeholder.is_text_only);
        assert_eq!(result.reason, placeholder.reason);
    }

    #[tokio::test]
    async fn submit_returns_immediately_and_status_is_queryable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.storage_root = dir.path().to_path_buf();
        config.max_concurrent_tasks = 2;
        let orchestrator = BatchOrchestrator::new(config, DedupStore::memory());

        let files = vec![InputFile { relative_path: "a.txt".to_string(), bytes: b"hello world".to_vec(), content_type: None }];
        let task_id = orchestrator.submit(files).await.unwrap();
        let snapshot = orchestrator.status(task_id.as_str()).unwrap();
        assert_eq!(snapshot.progress.total, 1);
    }
}
