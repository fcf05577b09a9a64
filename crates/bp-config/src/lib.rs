//! bp-config: pack simulation configuration, its sources and validation.

pub mod env;
pub mod period;
pub mod schema;
pub mod validate;

pub use env::{parse_current_tests, parse_temperature_tests};
pub use period::ExperimentPeriod;
pub use schema::*;
pub use validate::{ValidationError, validate_config};

use std::path::Path;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to parse {key}: {message}")]
    Parse { key: String, message: String },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Yaml,
    Json,
}

fn document_format(path: &Path) -> ConfigResult<DocumentFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "yaml" | "yml" => Ok(DocumentFormat::Yaml),
        "json" => Ok(DocumentFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat { extension }),
    }
}

/// Load and validate a configuration document (`.yaml`, `.yml` or `.json`).
pub fn load_config(path: &Path) -> ConfigResult<PackConfig> {
    let format = document_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let config: PackConfig = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(&content)?,
        DocumentFormat::Json => serde_json::from_str(&content)?,
    };
    validate_config(&config)?;
    Ok(config)
}

/// Validate and write a configuration document, format chosen by extension.
pub fn save_config(path: &Path, config: &PackConfig) -> ConfigResult<()> {
    let format = document_format(path)?;
    validate_config(config)?;
    let content = match format {
        DocumentFormat::Yaml => serde_yaml::to_string(config)?,
        DocumentFormat::Json => serde_json::to_string_pretty(config)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
