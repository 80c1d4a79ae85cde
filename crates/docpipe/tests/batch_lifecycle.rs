//! End-to-end exercises of `submit -> status -> download` against the
//! real filesystem, using the in-memory dedup store and native transcoder
//! fallback (no LibreOffice binary required in this environment).

use docpipe::config::PipelineConfig;
use docpipe::dedup::DedupStore;
use docpipe::orchestrator::BatchOrchestrator;
use docpipe::types::{DownloadCategory, InputFile, TaskStatus};
use std::time::Duration;

fn test_config(storage_root: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.storage_root = storage_root.to_path_buf();
    config.max_concurrent_tasks = 2;
    config
}

async fn wait_for_completion(orchestrator: &BatchOrchestrator, task_id: &str) -> docpipe::types::StatusSnapshot {
    for _ in 0..200 {
        let snapshot = orchestrator.status(task_id).expect("task must exist once submitted");
        if snapshot.status != TaskStatus::Processing {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("task {task_id} did not finish within the test timeout");
}

#[tokio::test]
async fn submit_pure_text_files_and_download_the_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = DedupStore::memory();
    let orchestrator = BatchOrchestrator::new(config, store);

    let files = vec![
        InputFile { relative_path: "notes/a.txt".to_string(), bytes: b"hello world, this paragraph is long enough.".to_vec(), content_type: None },
        InputFile { relative_path: "notes/b.txt".to_string(), bytes: b"a second distinct paragraph of real content.".to_vec(), content_type: None },
    ];

    let task_id = orchestrator.submit(files).await.expect("submit should succeed");
    let snapshot = wait_for_completion(&orchestrator, task_id.as_str()).await;

    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(snapshot.progress.total, 2);
    assert_eq!(snapshot.progress.completed, 2);
    assert_eq!(snapshot.progress.pure_text_count, 2);
    assert_eq!(snapshot.progress.failed_count, 0);

    let archive_path = orchestrator
        .download_archive_path(task_id.as_str(), DownloadCategory::PureTextConverted)
        .expect("pure_text_converted bucket should be non-empty");
    assert!(archive_path.exists());

    let bytes = std::fs::read(&archive_path).unwrap();
    let reader = std::io::Cursor::new(bytes);
    let archive = zip::ZipArchive::new(reader).expect("bundle must be a valid zip");
    assert_eq!(archive.len(), 2);
}

#[tokio::test]
async fn identical_raw_bytes_are_deduplicated_within_a_task() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = DedupStore::memory();
    let orchestrator = BatchOrchestrator::new(config, store);

    let content = b"the exact same bytes, twice over, nothing unique.".to_vec();
    let files = vec![
        InputFile { relative_path: "x/one.txt".to_string(), bytes: content.clone(), content_type: None },
        InputFile { relative_path: "x/two.txt".to_string(), bytes: content, content_type: None },
    ];

    let task_id = orchestrator.submit(files).await.unwrap();
    let snapshot = wait_for_completion(&orchestrator, task_id.as_str()).await;

    assert_eq!(snapshot.progress.total, 2);
    assert_eq!(snapshot.progress.duplicate_count, 1);
    assert_eq!(snapshot.progress.pure_text_count, 1);
}

#[tokio::test]
async fn unknown_task_id_status_lookup_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = DedupStore::memory();
    let orchestrator = BatchOrchestrator::new(config, store);

    let result = orchestrator.status("batch_does_not_exist");
    assert!(result.is_err());
}

#[tokio::test]
async fn empty_bucket_download_returns_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = DedupStore::memory();
    let orchestrator = BatchOrchestrator::new(config, store);

    let files = vec![InputFile {
        relative_path: "only.txt".to_string(),
        bytes: b"a single pure text paragraph for this task.".to_vec(),
        content_type: None,
    }];
    let task_id = orchestrator.submit(files).await.unwrap();
    wait_for_completion(&orchestrator, task_id.as_str()).await;

    let result = orchestrator.download_archive_path(task_id.as_str(), DownloadCategory::Failed);
    assert!(result.is_err(), "no files failed, so the failed bucket should have no archive");
}

#[tokio::test]
async fn cache_stats_and_clear_are_queryable_through_the_orchestrator() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = DedupStore::memory();
    let orchestrator = BatchOrchestrator::new(config, store);

    let files = vec![InputFile {
        relative_path: "doc.txt".to_string(),
        bytes: b"content that becomes a document fingerprint entry.".to_vec(),
        content_type: None,
    }];
    let task_id = orchestrator.submit(files).await.unwrap();
    wait_for_completion(&orchestrator, task_id.as_str()).await;

    orchestrator.dedup_cache_clear().await;
    let stats = orchestrator.dedup_cache_stats().await;
    assert_eq!(stats.doc_duplicates, 0);
}
