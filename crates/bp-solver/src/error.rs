//! Error types for solver invocations.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of an external solver call.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Failed to launch solver '{program}': {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("Solver exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("Failed to decode solver output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Malformed solver output: {0}")]
    Shape(#[from] bp_core::CoreError),

    #[error("No replay output for test '{label}' at {path}")]
    MissingReplay { label: String, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SolverResult<T> = Result<T, SolverError>;
