//! Scheduled and on-demand storage maintenance.
//!
//! Four operations over a fixed directory layout (`batch/`, `original/`,
//! `converted/`), all using age-comparison-by-mtime via `walkdir` and
//! `std::fs::remove_dir_all`.

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanResult {
    pub deleted: usize,
    pub total_size: u64,
    pub errors: usize,
}

impl CleanResult {
    pub fn total_size_mb(&self) -> f64 {
        self.total_size as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinedCleanResult {
    pub batch_tasks: CleanResult,
    pub single_files: CleanResult,
    pub total_deleted: usize,
    pub total_size_mb: f64,
    pub total_errors: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub file_count: usize,
    pub total_size: u64,
    pub total_size_mb: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageInfo {
    pub original: DirectoryInfo,
    pub converted: DirectoryInfo,
    pub batch: DirectoryInfo,
    pub temp: DirectoryInfo,
}

/// One hour; temp/ ages out far faster than whole task directories so it gets its own clock.
pub const TEMP_SWEEP_MAX_AGE_SECS: u64 = 3600;

pub struct StorageCleaner {
    base_dir: PathBuf,
}

impl StorageCleaner {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn batch_dir(&self) -> PathBuf {
        self.base_dir.join("batch")
    }
    fn original_dir(&self) -> PathBuf {
        self.base_dir.join("original")
    }
    fn converted_dir(&self) -> PathBuf {
        self.base_dir.join("converted")
    }
    fn temp_dir(&self) -> PathBuf {
        self.base_dir.join("temp")
    }

    /// Removes whole task directories under `batch/` older than `days`.
    pub fn clean_old_batch_tasks(&self, days: i64) -> CleanResult {
        let mut result = CleanResult::default();
        let dir = self.batch_dir();
        if !dir.is_dir() {
            return result;
        }
        let cutoff = Utc::now() - ChronoDuration::days(days);

        let Ok(entries) = std::fs::read_dir(&dir) else {
            return result;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match dir_mtime(&path) {
                Some(mtime) if mtime < cutoff => {
                    let size = dir_size(&path);
                    if std::fs::remove_dir_all(&path).is_ok() {
                        result.deleted += 1;
                        result.total_size += size;
                        tracing::info!(path = %path.display(), bytes = size, "removed aged task directory");
                    } else {
                        result.errors += 1;
                    }
                }
                Some(_) => {}
                None => result.errors += 1,
            }
        }
        result
    }

    /// Removes individual files under `original/` and `converted/` older than `days`.
    pub fn clean_old_single_files(&self, days: i64) -> CleanResult {
        let cutoff = Utc::now() - ChronoDuration::days(days);
        let mut result = CleanResult::default();
        for dir in [self.original_dir(), self.converted_dir()] {
            if !dir.is_dir() {
                continue;
            }
            clean_files_older_than(&dir, cutoff, &mut result);
        }
        result
    }

    pub fn clean_all(&self, days: i64) -> CombinedCleanResult {
        let batch_tasks = self.clean_old_batch_tasks(days);
        let single_files = self.clean_old_single_files(days);
        CombinedCleanResult {
            total_deleted: batch_tasks.deleted + single_files.deleted,
            total_size_mb: (batch_tasks.total_size + single_files.total_size) as f64 / (1024.0 * 1024.0),
            total_errors: batch_tasks.errors + single_files.errors,
            batch_tasks,
            single_files,
        }
    }

    /// Independent of the day-granularity sweeps: removes anything under
    /// `temp/` older than `TEMP_SWEEP_MAX_AGE_SECS`.
    pub fn sweep_temp_files(&self) -> CleanResult {
        let mut result = CleanResult::default();
        let dir = self.temp_dir();
        if !dir.is_dir() {
            return result;
        }
        let cutoff = Utc::now() - ChronoDuration::seconds(TEMP_SWEEP_MAX_AGE_SECS as i64);
        clean_files_older_than(&dir, cutoff, &mut result);
        result
    }

    pub fn get_storage_info(&self) -> StorageInfo {
        StorageInfo {
            original: dir_info(&self.original_dir()),
            converted: dir_info(&self.converted_dir()),
            batch: dir_info(&self.batch_dir()),
            temp: dir_info(&self.temp_dir()),
        }
    }
}

fn clean_files_older_than(dir: &Path, cutoff: chrono::DateTime<Utc>, result: &mut CleanResult) {
    for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        match file_mtime(entry.path()) {
            Some(mtime) if mtime < cutoff => {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                if std::fs::remove_file(entry.path()).is_ok() {
                    result.deleted += 1;
                    result.total_size += size;
                } else {
                    result.errors += 1;
                }
            }
            Some(_) => {}
            None => result.errors += 1,
        }
    }
}

fn dir_info(dir: &Path) -> DirectoryInfo {
    if !dir.is_dir() {
        return DirectoryInfo::default();
    }
    let mut info = DirectoryInfo::default();
    for entry in walkdir::WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        if entry.file_type().is_file() {
            info.file_count += 1;
            info.total_size += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
    info.total_size_mb = info.total_size as f64 / (1024.0 * 1024.0);
    info
}

fn dir_size(dir: &Path) -> u64 {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

fn dir_mtime(path: &Path) -> Option<chrono::DateTime<Utc>> {
    std::fs::metadata(path).ok()?.modified().ok().map(chrono::DateTime::<Utc>::from)
}

fn file_mtime(path: &Path) -> Option<chrono::DateTime<Utc>> {
    dir_mtime(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn old_batch_task_directory_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cleaner = StorageCleaner::new(dir.path());
        let task_dir = dir.path().join("batch").join("batch_old");
        std::fs::create_dir_all(&task_dir).unwrap();
        std::fs::write(task_dir.join("f.txt"), b"data").unwrap();

        let old_time = SystemTime::now() - Duration::from_secs(60 * 60 * 24 * 30);
        set_mtime(&task_dir, old_time);

        let result = cleaner.clean_old_batch_tasks(7);
        assert_eq!(result.deleted, 1);
        assert!(!task_dir.exists());
    }

    #[test]
    fn recent_batch_task_directory_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let cleaner = StorageCleaner::new(dir.path());
        let task_dir = dir.path().join("batch").join("batch_new");
        std::fs::create_dir_all(&task_dir).unwrap();

        let result = cleaner.clean_old_batch_tasks(7);
        assert_eq!(result.deleted, 0);
        assert!(task_dir.exists());
    }

    #[test]
    fn storage_info_reports_file_counts_without_deleting() {
        let dir = tempfile::tempdir().unwrap();
        let cleaner = StorageCleaner::new(dir.path());
        let original = dir.path().join("original");
        std::fs::create_dir_all(&original).unwrap();
        std::fs::write(original.join("a.txt"), b"hello").unwrap();

        let info = cleaner.get_storage_info();
        assert_eq!(info.original.file_count, 1);
        assert!(original.join("a.txt").exists());
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = std::fs::File::open(path).unwrap();
        file.set_modified(time).unwrap();
    }
}
