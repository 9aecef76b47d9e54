//! Error types for the image sampling pipeline.
//!
//! Errors are organized by stage so a log line names the step that failed and
//! the file it failed on. Below the async wrapper every error collapses into
//! "no output"; callers of [`crate::pipeline::Processor`] see them directly.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for imgsample operations.
#[derive(Error, Debug)]
pub enum SamplerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A request is already in flight on this sampler
    #[error("Sampler is busy: a request is already running")]
    Busy,

    /// The request itself is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Submitted outside of a Tokio runtime
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Magic bytes do not match a supported raster format
    #[error("Unsupported format for {path}: {message}")]
    UnsupportedFormat { path: PathBuf, message: String },

    /// Header could not be read or reported no usable dimensions
    #[error("Probe error for {path}: {message}")]
    Probe { path: PathBuf, message: String },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Orientation metadata could not be read (non-fatal)
    #[error("Orientation read failed for {path}: {message}")]
    Rotation { path: PathBuf, message: String },

    /// Output directory creation or file write failed
    #[error("IO error for {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Run was abandoned by its caller before producing output
    #[error("Abandoned before {stage} for {path}")]
    Abandoned { path: PathBuf, stage: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },
}

/// Convenience type alias for imgsample results.
pub type Result<T> = std::result::Result<T, SamplerError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
