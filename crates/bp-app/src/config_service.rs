//! Configuration loading, saving, validation, and introspection.

use std::path::Path;

use bp_config::PackConfig;

use crate::error::{AppError, AppResult};

/// One test as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSummary {
    pub label: String,
    pub current_a: f64,
    pub ambient_temperature_k: f64,
}

/// Summary of a configuration for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSummary {
    pub num_parallel: usize,
    pub num_series: usize,
    pub cell_count: usize,
    pub nominal_capacity_ah: f64,
    pub cutoff_voltage_v: f64,
    pub experiment_time_s: f64,
    pub period_s: f64,
    pub tests: Vec<TestSummary>,
}

/// Load and validate a configuration document.
pub fn load_config(path: &Path) -> AppResult<PackConfig> {
    Ok(bp_config::load_config(path)?)
}

/// Validate and save a configuration document.
pub fn save_config(path: &Path, config: &PackConfig) -> AppResult<()> {
    Ok(bp_config::save_config(path, config)?)
}

pub fn validate_config(config: &PackConfig) -> AppResult<()> {
    Ok(bp_config::validate_config(config)?)
}

/// Configuration from `path` when given, otherwise from the process
/// environment. Either way the result is validated.
pub fn resolve_config(path: Option<&Path>) -> AppResult<PackConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = PackConfig::from_env()?;
            validate_config(&config)?;
            Ok(config)
        }
    }
}

pub fn to_yaml(config: &PackConfig) -> AppResult<String> {
    serde_yaml::to_string(config)
        .map_err(|e| AppError::Config(format!("Failed to serialize configuration: {}", e)))
}

/// `KEY=VALUE` lines for a subprocess environment.
pub fn env_lines(config: &PackConfig) -> Vec<String> {
    config
        .to_env_pairs()
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect()
}

pub fn summarize_config(config: &PackConfig) -> ConfigSummary {
    ConfigSummary {
        num_parallel: config.topology.num_parallel,
        num_series: config.topology.num_series,
        cell_count: config.cell_count(),
        nominal_capacity_ah: config.nominal_capacity_ah,
        cutoff_voltage_v: config.cutoff_voltage_v,
        experiment_time_s: config.experiment.time_s,
        period_s: config.experiment.period.as_seconds(),
        tests: config
            .tests
            .iter()
            .map(|t| TestSummary {
                label: t.name.clone(),
                current_a: t.current_a,
                ambient_temperature_k: config.ambient_for(t),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_tests_in_order() {
        let summary = summarize_config(&PackConfig::default());
        assert_eq!(summary.cell_count, 12);
        assert_eq!(summary.period_s, 10.0);
        let labels: Vec<_> = summary.tests.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["0.5C", "1C", "2C"]);
    }

    #[test]
    fn env_lines_are_key_value() {
        let lines = env_lines(&PackConfig::default());
        assert!(lines.contains(&"NUM_SERIES=4".to_string()));
        assert!(lines.iter().all(|l| l.contains('=')));
    }

    #[test]
    fn yaml_roundtrips() {
        let config = PackConfig::default();
        let yaml = to_yaml(&config).unwrap();
        let parsed: PackConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn invalid_document_is_a_validation_error() {
        let path = std::env::temp_dir().join("bp_app_invalid_config.yaml");
        std::fs::write(&path, "topology:\n  num_parallel: 0\n  num_series: 4\n").unwrap();
        assert!(matches!(load_config(&path), Err(AppError::Validation(_))));
    }
}
