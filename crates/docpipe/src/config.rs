//! Layered configuration: file → environment variable → compiled default.
//!
//! Discovery mirrors a conventional upward-directory config-search
//! pattern: walk upward from the current directory looking for a conventional
//! file name, sniffing the format from its extension.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_BASENAMES: [&str; 3] = ["pipeline.toml", "pipeline.yaml", "pipeline.json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_concurrent_tasks: usize,
    pub conversion_timeout_secs: u64,
    pub skip_temp_files: bool,
    pub libreoffice_path: Option<String>,
    pub libreoffice_default_paths: Vec<String>,
    pub min_paragraph_len: usize,
    pub simhash_distance_threshold: u32,
    pub enable_near_duplicate: bool,
    pub enable_cross_doc_dedup: bool,
    pub custom_noise_patterns: Vec<String>,
    pub redis_enabled: bool,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: i64,
    pub redis_password: Option<String>,
    pub redis_doc_hashes_key: String,
    pub redis_para_hashes_key: String,
    pub redis_para_simhash_key: String,
    pub clean_keep_days: i64,
    pub log_level: String,
    pub storage_root: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: num_cpus::get(),
            conversion_timeout_secs: 60,
            skip_temp_files: true,
            libreoffice_path: None,
            libreoffice_default_paths: default_libreoffice_paths(),
            min_paragraph_len: 10,
            simhash_distance_threshold: 3,
            enable_near_duplicate: true,
            enable_cross_doc_dedup: false,
            custom_noise_patterns: Vec::new(),
            redis_enabled: false,
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_db: 1,
            redis_password: None,
            redis_doc_hashes_key: "kbjx:doc:hashes".to_string(),
            redis_para_hashes_key: "kbjx:para:hashes".to_string(),
            redis_para_simhash_key: "kbjx:para:simhash".to_string(),
            clean_keep_days: 7,
            log_level: "info".to_string(),
            storage_root: PathBuf::from("storage"),
        }
    }
}

fn default_libreoffice_paths() -> Vec<String> {
    vec![
        "/usr/bin/soffice".to_string(),
        "/usr/bin/libreoffice".to_string(),
        "/opt/libreoffice/program/soffice".to_string(),
        "/Applications/LibreOffice.app/Contents/MacOS/soffice".to_string(),
        "C:\\Program Files\\LibreOffice\\program\\soffice.exe".to_string(),
    ]
}

impl PipelineConfig {
    /// Reject configurations that would make the pipeline misbehave at runtime
    /// rather than failing lazily at first use.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_tasks == 0 {
            return Err(PipelineError::Config("max_concurrent_tasks must be > 0".into()));
        }
        if self.conversion_timeout_secs == 0 {
            return Err(PipelineError::Config("conversion_timeout_secs must be > 0".into()));
        }
        if self.redis_enabled && self.redis_host.trim().is_empty() {
            return Err(PipelineError::Config("redis_host must not be empty when redis_enabled".into()));
        }
        for pattern in &self.custom_noise_patterns {
            regex::Regex::new(pattern)
                .map_err(|e| PipelineError::Config(format!("invalid custom noise pattern {pattern:?}: {e}")))?;
        }
        Ok(())
    }

    pub fn from_str_with_format(text: &str, format: ConfigFormat) -> Result<Self> {
        Ok(match format {
            ConfigFormat::Toml => toml::from_str(text)?,
            ConfigFormat::Yaml => serde_yaml_ng::from_str(text)?,
            ConfigFormat::Json => serde_json::from_str(text)?,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            PipelineError::Config(format!("unrecognized config extension: {}", path.display()))
        })?;
        let text = std::fs::read_to_string(path)?;
        Self::from_str_with_format(&text, format)
    }

    /// Walk upward from the current directory looking for one of
    /// `pipeline.{toml,yaml,json}`. Returns `Ok(None)` if none is found.
    pub fn discover() -> Result<Option<Self>> {
        let mut dir = std::env::current_dir()?;
        loop {
            for basename in CONFIG_BASENAMES {
                let candidate = dir.join(basename);
                if candidate.is_file() {
                    return Ok(Some(Self::from_file(&candidate)?));
                }
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Apply `env`-sourced overrides for the supported configuration fields,
    /// on top of whatever `self` already holds.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_usize("MAX_CONCURRENT_TASKS") {
            self.max_concurrent_tasks = v;
        }
        if let Some(v) = env_u64("CONVERSION_TIMEOUT") {
            self.conversion_timeout_secs = v;
        }
        if let Some(v) = env_bool("SKIP_TEMP_FILES") {
            self.skip_temp_files = v;
        }
        if let Ok(v) = std::env::var("LIBREOFFICE_PATH") {
            self.libreoffice_path = Some(v);
        }
        if let Some(v) = env_usize("MIN_PARAGRAPH_LEN") {
            self.min_paragraph_len = v;
        }
        if let Some(v) = env_u32("SIMHASH_DISTANCE_THRESHOLD") {
            self.simhash_distance_threshold = v;
        }
        if let Some(v) = env_bool("ENABLE_NEAR_DUPLICATE") {
            self.enable_near_duplicate = v;
        }
        if let Some(v) = env_bool("ENABLE_CROSS_DOC_DEDUP") {
            self.enable_cross_doc_dedup = v;
        }
        if let Some(v) = env_bool("REDIS_ENABLED") {
            self.redis_enabled = v;
        }
        if let Ok(v) = std::env::var("REDIS_HOST") {
            self.redis_host = v;
        }
        if let Some(v) = env_u16("REDIS_PORT") {
            self.redis_port = v;
        }
        if let Some(v) = env_i64("REDIS_DB") {
            self.redis_db = v;
        }
        if let Ok(v) = std::env::var("REDIS_PASSWORD") {
            self.redis_password = Some(v);
        }
        if let Some(v) = env_i64("CLEAN_KEEP_DAYS") {
            self.clean_keep_days = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.log_level = v;
        }
    }

    /// File → env → default, in that precedence order (file/env both win over default;
    /// env wins over file).
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut cfg = match explicit_path {
            Some(p) => Self::from_file(p)?,
            None => Self::discover()?.unwrap_or_default(),
        };
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    fn from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref() {
            Some("toml") => Some(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Some(ConfigFormat::Yaml),
            Some("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
fn env_u16(key: &str) -> Option<u16> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|v| match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.max_concurrent_tasks = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_noise_pattern_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.custom_noise_patterns.push("(unclosed".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn min_paragraph_len_zero_is_accepted() {
        let mut cfg = PipelineConfig::default();
        cfg.min_paragraph_len = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn toml_round_trip() {
        let cfg = PipelineConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let parsed = PipelineConfig::from_str_with_format(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(parsed.max_concurrent_tasks, cfg.max_concurrent_tasks);
    }

    #[test]
    fn config_format_from_extension() {
        assert!(matches!(ConfigFormat::from_extension(Path::new("a.toml")), Some(ConfigFormat::Toml)));
        assert!(matches!(ConfigFormat::from_extension(Path::new("a.yaml")), Some(ConfigFormat::Yaml)));
        assert!(matches!(ConfigFormat::from_extension(Path::new("a.json")), Some(ConfigFormat::Json)));
        assert!(ConfigFormat::from_extension(Path::new("a.ini")).is_none());
    }
}
