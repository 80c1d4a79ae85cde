//! Document transcoding: produce a modern artifact in `{docx, xlsx, pptx}`
//! from an arbitrary supported input.
//!
//! Engine selection is a tagged enum, not a trait object, mirroring the
//! `DedupStore`'s rationale: exactly two engines, resolved once at process
//! start and cached, via a `which`-based discovery call in `transcode::external`.

mod external;
mod native;

use crate::config::PipelineConfig;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Docx,
    Xlsx,
    Pptx,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Docx => "docx",
            TargetFormat::Xlsx => "xlsx",
            TargetFormat::Pptx => "pptx",
        }
    }
}

pub struct Transcoder {
    libreoffice_path: OnceLock<Option<PathBuf>>,
    configured_path: Option<PathBuf>,
    default_paths: Vec<PathBuf>,
    timeout: Duration,
}

impl Transcoder {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            libreoffice_path: OnceLock::new(),
            configured_path: config.libreoffice_path.as_ref().map(PathBuf::from),
            default_paths: config.libreoffice_default_paths.iter().map(PathBuf::from).collect(),
            timeout: Duration::from_secs(config.conversion_timeout_secs),
        }
    }

    /// Resolved once per process and cached for its lifetime.
    fn resolve_external(&self) -> Option<&PathBuf> {
        self.libreoffice_path
            .get_or_init(|| external::discover(self.configured_path.as_deref(), &self.default_paths))
            .as_ref()
    }

    /// Converts `input` to `target`, writing a freshly-named intermediate
    /// under `temp_dir`. Returns `None` on any failure rather than raising.
    pub async fn convert(&self, input: &Path, target: TargetFormat, temp_dir: &Path) -> Option<PathBuf> {
        if let Some(soffice) = self.resolve_external() {
            if let Some(out) = external::convert(soffice, input, target, temp_dir, self.timeout).await {
                return Some(out);
            }
            tracing::debug!(input = %input.display(), "external converter failed, falling back to native");
        }
        native::convert(input, target, temp_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_native_when_no_external_converter_configured() {
        let mut config = PipelineConfig::default();
        config.libreoffice_path = Some("/nonexistent/soffice".to_string());
        config.libreoffice_default_paths = vec![];
        let transcoder = Transcoder::new(&config);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.txt");
        std::fs::write(&input, "hello world").unwrap();
        let out = transcoder.convert(&input, TargetFormat::Docx, dir.path()).await;
        assert!(out.is_some());
    }
}
