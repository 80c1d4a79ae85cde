//! Command-line front-end for the document ingestion and text-normalisation
//! pipeline. Thin client over `docpipe`'s programmatic interface: `submit`,
//! `status`, `download`, `clean`, `cache stats`/`cache clear`.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docpipe::dedup::DedupStore;
use docpipe::orchestrator::BatchOrchestrator;
use docpipe::types::{DownloadCategory, InputFile};
use docpipe::PipelineConfig;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docpipe")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (TOML, YAML, or JSON). If absent, searches for
    /// pipeline.toml/yaml/json in the current and parent directories.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a batch of files (or directories, recursed) for processing.
    Submit {
        /// Files or directories to ingest.
        paths: Vec<PathBuf>,
    },

    /// Show a task's progress and bucket-count snapshot.
    Status {
        task_id: String,

        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Write one task's category archive to a file, or stdout if `--output` is omitted.
    Download {
        task_id: String,
        category: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove aged task directories and single files.
    Clean {
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Inspect or reset the shared deduplication store.
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    Stats,
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("invalid format: {s}. Use 'json' or 'table'")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let store = DedupStore::from_config(&config).await;
    let orchestrator = BatchOrchestrator::new(config, store);

    match cli.command {
        Commands::Submit { paths } => {
            let files = collect_input_files(&paths)?;
            if files.is_empty() {
                anyhow::bail!("no input files found under the given paths");
            }
            let task_id = orchestrator
                .submit(files)
                .await
                .context("failed to submit batch")?;
            println!("{task_id}");
        }

        Commands::Status { task_id, format } => {
            let snapshot = orchestrator
                .status(&task_id)
                .with_context(|| format!("failed to fetch status for task '{task_id}'"))?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&snapshot).context("failed to serialize status")?);
                }
                OutputFormat::Table => {
                    println!("Task: {}", snapshot.task_id);
                    println!("Status: {:?}", snapshot.status);
                    println!(
                        "Progress: {}/{} (pure_text={}, rich_media={}, duplicates={}, failed={}, temp_files={})",
                        snapshot.progress.completed,
                        snapshot.progress.total,
                        snapshot.progress.pure_text_count,
                        snapshot.progress.rich_media_count,
                        snapshot.progress.duplicate_count,
                        snapshot.progress.failed_count,
                        snapshot.progress.temp_file_count,
                    );
                    for (category, path) in &snapshot.downloads {
                        match path {
                            Some(p) => println!("  {category}: {p}"),
                            None => println!("  {category}: (empty)"),
                        }
                    }
                }
            }
        }

        Commands::Download { task_id, category, output } => {
            let category = DownloadCategory::parse(&category)
                .ok_or_else(|| anyhow::anyhow!("unknown download category '{category}'"))?;
            let archive_path = orchestrator
                .download_archive_path(&task_id, category)
                .with_context(|| format!("failed to locate archive for task '{task_id}'"))?;
            let bytes = std::fs::read(&archive_path)
                .with_context(|| format!("failed to read archive at '{}'", archive_path.display()))?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write archive to '{}'", path.display()))?;
                    println!("wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&bytes).context("failed to write archive to stdout")?;
                }
            }
        }

        Commands::Clean { days } => {
            let result = orchestrator.clean_all(days).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "batch_tasks": result.batch_tasks,
                    "single_files": result.single_files,
                    "total_deleted": result.total_deleted,
                    "total_size_mb": result.total_size_mb,
                    "total_errors": result.total_errors,
                }))
                .context("failed to serialize clean result")?
            );
        }

        Commands::Cache { command } => match command {
            CacheCommands::Stats => {
                let stats = orchestrator.dedup_cache_stats().await;
                println!("{}", serde_json::to_string_pretty(&stats).context("failed to serialize cache stats")?);
            }
            CacheCommands::Clear => {
                orchestrator.dedup_cache_clear().await;
                println!("dedup cache cleared");
            }
        },
    }

    Ok(())
}

/// Reads a config file, auto-discovers one, or falls back to compiled
/// defaults, following the file → env → default precedence that
/// `PipelineConfig::load` implements.
fn load_config(explicit_path: Option<&Path>) -> Result<PipelineConfig> {
    PipelineConfig::load(explicit_path).with_context(|| match explicit_path {
        Some(p) => format!("failed to load configuration from '{}'", p.display()),
        None => "failed to load configuration".to_string(),
    })
}

/// Expands `paths` (files and directories) into `InputFile`s, preserving each
/// file's path relative to the root it was given under.
fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_dir() {
            for entry in walkdir::WalkDir::new(root).into_iter().filter_map(std::result::Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                let bytes = std::fs::read(entry.path())
                    .with_context(|| format!("failed to read '{}'", entry.path().display()))?;
                files.push(InputFile { relative_path: relative.to_string_lossy().to_string(), bytes, content_type: None });
            }
        } else {
            let bytes = std::fs::read(root).with_context(|| format!("failed to read '{}'", root.display()))?;
            let relative_path = root.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| root.to_string_lossy().to_string());
            files.push(InputFile { relative_path, bytes, content_type: None });
        }
    }
    Ok(files)
}
