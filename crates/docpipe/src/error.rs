use thiserror::Error;

/// Crate-wide error type.
///
/// Per-file failures are always recovered into a [`crate::types::FileResult`]
/// before they can reach a caller; the variants below surface either from
/// constructing the pipeline's own infrastructure (config, task lookup) or
/// from a component that has no per-file recovery boundary of its own.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("document already seen")]
    PipelineDocDuplicate,

    #[error("I/O error: {0}")]
    FileIo(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("unknown task: {0}")]
    TaskNotFound(String),

    #[error("unknown download category: {0}")]
    UnknownCategory(String),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
