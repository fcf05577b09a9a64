//! bp-results: run cache and timeseries storage.

pub mod convert;
pub mod hash;
pub mod store;
pub mod types;

pub use convert::{records_from_result, result_from_records};
pub use hash::{compute_config_hash, compute_run_id};
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Stored records cannot be rebuilt: {message}")]
    InvalidRecords { message: String },
}

impl From<bp_post::PostError> for ResultsError {
    fn from(e: bp_post::PostError) -> Self {
        ResultsError::InvalidRecords {
            message: e.to_string(),
        }
    }
}
