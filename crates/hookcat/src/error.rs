//! Error types for hookcat.

use std::path::PathBuf;
use thiserror::Error;

/// hookcat error type.
#[derive(Error, Debug)]
pub enum HookcatError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file could not be parsed
    #[error("Failed to parse config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// IO error (stdin, stdout, config file reads)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a status of 400 or above
    #[error("Webhook rejected message with status {status}")]
    Rejected { status: u16 },

    /// Payload serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input processing was interrupted by a shutdown signal
    #[error("Processing cancelled by shutdown signal")]
    Cancelled,
}

impl HookcatError {
    /// Whether another delivery attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HookcatError::Http(_) | HookcatError::Rejected { .. })
    }
}

/// Result type for hookcat operations.
pub type HookcatResult<T> = Result<T, HookcatError>;

/// Process exit code for the outcome of a run.
///
/// Cancellation only counts as a failure when `verbose` is set.
pub fn exit_code(result: &HookcatResult<()>, verbose: bool) -> i32 {
    match result {
        Ok(()) => 0,
        Err(HookcatError::Cancelled) if !verbose => 0,
        Err(_) => 1,
    }
}
