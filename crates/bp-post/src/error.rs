//! Error types for post-processing.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Duplicate result label: {label}")]
    DuplicateLabel { label: String },
}

pub type PostResult<T> = Result<T, PostError>;

impl From<bp_core::CoreError> for PostError {
    fn from(e: bp_core::CoreError) -> Self {
        PostError::InvalidInput(e.to_string())
    }
}
