//! Structured error types for the BlockFund CLI

use lib_funding::FundingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to load script from {path}: {reason}")]
    ScriptLoadFailed { path: String, reason: String },

    #[error("Script step {step} ({op}) failed: {source}")]
    StepFailed {
        step: usize,
        op: String,
        #[source]
        source: FundingError,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Engine error: {0}")]
    Engine(#[from] FundingError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
