//! Shared application service layer for packsim.
//!
//! Centralizes configuration handling, multi-test execution with caching,
//! and result querying for the command-line front end.

pub mod config_service;
pub mod error;
pub mod progress;
pub mod query;
pub mod run_service;

// Re-export key types for convenience
pub use config_service::{
    ConfigSummary, TestSummary, env_lines, load_config, resolve_config, save_config,
    summarize_config, to_yaml, validate_config,
};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use query::{
    PackView, RunSummary, Series, extract_series, get_run_summary, pack_view, series_to_csv,
    write_series_csv,
};
pub use run_service::{
    FailurePolicy, RunOptions, RunRequest, RunResponse, RunTimingSummary, TestFailure, TestRun,
    list_runs, load_result, load_run, run_tests, run_tests_with_progress,
};
