//! Configuration validation logic.

use crate::schema::{PackConfig, TestCase};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate test name: {name}")]
    DuplicateTest { name: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No tests configured")]
    NoTests,
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if finite(field, value)? > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if finite(field, value)? >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be non-negative"))
    }
}

pub fn validate_config(config: &PackConfig) -> Result<(), ValidationError> {
    positive("ambient_temperature_k", config.ambient_temperature_k)?;
    positive("initial_temperature_k", config.initial_temperature_k)?;

    if config.topology.num_parallel == 0 {
        return Err(invalid("topology.num_parallel", 0, "must be at least 1"));
    }
    if config.topology.num_series == 0 {
        return Err(invalid("topology.num_series", 0, "must be at least 1"));
    }

    non_negative("resistances.busbar_ohm", config.resistances.busbar_ohm)?;
    non_negative("resistances.connection_ohm", config.resistances.connection_ohm)?;
    non_negative("resistances.internal_ohm", config.resistances.internal_ohm)?;

    finite("initial_voltage_v", config.initial_voltage_v)?;
    finite("cutoff_voltage_v", config.cutoff_voltage_v)?;
    if config.cutoff_voltage_v >= config.initial_voltage_v {
        return Err(invalid(
            "cutoff_voltage_v",
            config.cutoff_voltage_v,
            "must be below initial_voltage_v",
        ));
    }

    let soc = finite("initial_soc", config.initial_soc)?;
    if !(0.0..=1.0).contains(&soc) {
        return Err(invalid("initial_soc", soc, "must be within [0, 1]"));
    }

    positive("nominal_capacity_ah", config.nominal_capacity_ah)?;
    non_negative("heat_transfer_coefficient", config.heat_transfer_coefficient)?;
    positive("experiment.period", config.experiment.period.as_seconds())?;
    positive("experiment.time_s", config.experiment.time_s)?;

    if config.circuit.dpi == 0 {
        return Err(invalid("circuit.dpi", 0, "must be at least 1"));
    }
    positive("circuit.component_size", config.circuit.component_size)?;
    positive("circuit.node_spacing", config.circuit.node_spacing)?;

    validate_tests(&config.tests)
}

fn validate_tests(tests: &[TestCase]) -> Result<(), ValidationError> {
    if tests.is_empty() {
        return Err(ValidationError::NoTests);
    }

    let mut names = HashSet::new();
    for test in tests {
        if test.name.trim().is_empty() {
            return Err(invalid("tests.name", &test.name, "must not be empty"));
        }
        // ',' and ':' delimit the flat CURRENT_TESTS form
        if test.name.contains([',', ':']) {
            return Err(invalid("tests.name", &test.name, "must not contain ',' or ':'"));
        }
        // labels name replay and record files
        if test.name.contains(['/', '\\']) || test.name == "." || test.name == ".." {
            return Err(invalid("tests.name", &test.name, "must not be a path"));
        }
        if !names.insert(test.name.as_str()) {
            return Err(ValidationError::DuplicateTest {
                name: test.name.clone(),
            });
        }
        finite("tests.current_a", test.current_a)?;
        if let Some(ambient) = test.ambient_temperature_k {
            positive("tests.ambient_temperature_k", ambient)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        validate_config(&PackConfig::default()).unwrap();
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = PackConfig {
            nominal_capacity_ah: 0.0,
            ..PackConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("nominal_capacity_ah"));
    }

    #[test]
    fn soc_outside_unit_interval_is_rejected() {
        let config = PackConfig {
            initial_soc: 1.5,
            ..PackConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn duplicate_test_names_are_rejected() {
        let config = PackConfig {
            tests: vec![TestCase::new("1C", 5.0), TestCase::new("1C", 10.0)],
            ..PackConfig::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::DuplicateTest { .. })
        ));
    }

    #[test]
    fn empty_test_list_is_rejected() {
        let config = PackConfig {
            tests: vec![],
            ..PackConfig::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::NoTests)
        ));
    }

    #[test]
    fn delimiter_in_test_name_is_rejected() {
        let config = PackConfig {
            tests: vec![TestCase::new("a:b", 5.0)],
            ..PackConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn path_like_test_names_are_rejected() {
        for name in ["../escape", "a/b", "a\\b", ".."] {
            let config = PackConfig {
                tests: vec![TestCase::new(name, 5.0)],
                ..PackConfig::default()
            };
            assert!(validate_config(&config).is_err(), "{name} accepted");
        }
        let config = PackConfig {
            tests: vec![TestCase::new("0.5C", 5.0)],
            ..PackConfig::default()
        };
        validate_config(&config).unwrap();
    }

    #[test]
    fn cutoff_above_initial_voltage_is_rejected() {
        let config = PackConfig {
            cutoff_voltage_v: 4.5,
            ..PackConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
