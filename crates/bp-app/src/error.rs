//! Error types for the bp-app service layer.

/// Application error type that wraps errors from the backend crates
/// and gives the CLI one error to report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Solver failed for test '{test}': {message}")]
    Solver { test: String, message: String },

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("All {count} tests failed; first failure: {first}")]
    AllTestsFailed { count: usize, first: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bp-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<bp_config::ConfigError> for AppError {
    fn from(err: bp_config::ConfigError) -> Self {
        match err {
            bp_config::ConfigError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Config(other.to_string()),
        }
    }
}

impl From<bp_config::ValidationError> for AppError {
    fn from(err: bp_config::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<bp_post::PostError> for AppError {
    fn from(err: bp_post::PostError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<bp_results::ResultsError> for AppError {
    fn from(err: bp_results::ResultsError) -> Self {
        match err {
            bp_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}

impl AppError {
    /// Wrap a solver failure with the test it belongs to.
    pub fn solver(test: &str, err: bp_solver::SolverError) -> Self {
        AppError::Solver {
            test: test.to_string(),
            message: err.to_string(),
        }
    }
}
