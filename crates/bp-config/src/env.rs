//! Flat key/value configuration source (process environment or equivalent).
//!
//! Keys match the ones the simulation scripts have always read, so a
//! configuration exported with [`PackConfig::to_env_pairs`] can be handed to
//! an external solver process unchanged.

use std::fmt::Display;
use std::str::FromStr;

use bp_core::units::celsius_to_kelvin;

use crate::schema::{
    CircuitDiagramDef, ExperimentDef, PackConfig, PackTopology, Resistances, TestCase,
};
use crate::{ConfigError, ConfigResult, ExperimentPeriod};

pub mod keys {
    pub const AMBIENT_TEMP: &str = "AMBIENT_TEMP";
    pub const INITIAL_TEMP: &str = "INITIAL_TEMP";
    pub const NUM_PARALLEL: &str = "NUM_PARALLEL";
    pub const NUM_SERIES: &str = "NUM_SERIES";
    pub const BUSBAR_RESISTANCE: &str = "BUSBAR_RESISTANCE";
    pub const CONNECTION_RESISTANCE: &str = "CONNECTION_RESISTANCE";
    pub const INTERNAL_RESISTANCE: &str = "INTERNAL_RESISTANCE";
    pub const INITIAL_VOLTAGE: &str = "INITIAL_VOLTAGE";
    pub const CUT_OFF_VOLTAGE: &str = "CUT_OFF_VOLTAGE";
    pub const INITIAL_SOC: &str = "INITIAL_SOC";
    pub const NOMINAL_CAPACITY: &str = "NOMINAL_CAPACITY";
    pub const HEAT_TRANSFER_COEFFICIENT: &str = "HEAT_TRANSFER_COEFFICIENT";
    pub const EXPERIMENT_PERIOD: &str = "EXPERIMENT_PERIOD";
    pub const EXPERIMENT_TIME: &str = "EXPERIMENT_TIME";
    pub const CURRENT_TESTS: &str = "CURRENT_TESTS";
    pub const TEMPERATURE_TESTS: &str = "TEMPERATURE_TESTS";
    pub const TEMPERATURE_TEST_CURRENT: &str = "TEMPERATURE_TEST_CURRENT";
    pub const DRAW_CIRCUIT: &str = "DRAW_CIRCUIT";
    pub const CIRCUIT_DPI: &str = "CIRCUIT_DPI";
    pub const CIRCUIT_CPT_SIZE: &str = "CIRCUIT_CPT_SIZE";
    pub const CIRCUIT_NODE_SPACING: &str = "CIRCUIT_NODE_SPACING";
}

fn parse_value<T>(key: &str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Parse {
        key: key.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

fn read_or<F, T>(lookup: &F, key: &str, default: T) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => parse_value(key, &raw),
        _ => Ok(default),
    }
}

fn parse_flag(key: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Parse {
            key: key.to_string(),
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

/// Parse `"name:amps,name:amps,..."`.
///
/// A bare number is accepted and named after its float form, so `5` becomes
/// `"5.0A"`. An optional third field (`name:amps:ambient_k`) overrides the
/// ambient temperature for that test.
pub fn parse_current_tests(text: &str) -> ConfigResult<Vec<TestCase>> {
    let mut tests = Vec::new();
    for entry in text.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        if !entry.contains(':') {
            let current_a: f64 = parse_value(keys::CURRENT_TESTS, entry)?;
            tests.push(TestCase::new(format!("{:?}A", current_a), current_a));
            continue;
        }

        let mut fields = entry.splitn(3, ':');
        let name = fields.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(ConfigError::Parse {
                key: keys::CURRENT_TESTS.to_string(),
                message: format!("test entry '{}' has an empty name", entry),
            });
        }
        let current_a: f64 = parse_value(keys::CURRENT_TESTS, fields.next().unwrap_or_default())?;
        let mut test = TestCase::new(name, current_a);
        if let Some(ambient) = fields.next() {
            test = test.with_ambient(parse_value(keys::CURRENT_TESTS, ambient)?);
        }
        tests.push(test);
    }
    Ok(tests)
}

/// Parse a list of ambient temperatures in degrees Celsius into tests that
/// all discharge at `current_a`.
pub fn parse_temperature_tests(text: &str, current_a: f64) -> ConfigResult<Vec<TestCase>> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let t_c: f64 = parse_value(keys::TEMPERATURE_TESTS, entry)?;
            Ok(TestCase::new(format!("{}°C", t_c), current_a).with_ambient(celsius_to_kelvin(t_c)))
        })
        .collect()
}

fn format_current_tests(tests: &[TestCase]) -> String {
    tests
        .iter()
        .map(|t| match t.ambient_temperature_k {
            Some(ambient) => format!("{}:{}:{}", t.name, t.current_a, ambient),
            None => format!("{}:{}", t.name, t.current_a),
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl PackConfig {
    /// Resolve a configuration from a key lookup, falling back to defaults
    /// for missing or blank keys.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PackConfig::default();
        let nominal_capacity_ah =
            read_or(&lookup, keys::NOMINAL_CAPACITY, defaults.nominal_capacity_ah)?;

        let mut tests = match lookup(keys::CURRENT_TESTS) {
            Some(text) if !text.trim().is_empty() => parse_current_tests(&text)?,
            _ => defaults.tests.clone(),
        };
        if let Some(text) = lookup(keys::TEMPERATURE_TESTS) {
            let current_a = read_or(&lookup, keys::TEMPERATURE_TEST_CURRENT, nominal_capacity_ah)?;
            tests.extend(parse_temperature_tests(&text, current_a)?);
        }

        let period = match lookup(keys::EXPERIMENT_PERIOD) {
            Some(text) if !text.trim().is_empty() => ExperimentPeriod::parse(&text)?,
            _ => defaults.experiment.period,
        };

        let draw = match lookup(keys::DRAW_CIRCUIT) {
            Some(raw) => parse_flag(keys::DRAW_CIRCUIT, &raw)?,
            None => defaults.circuit.draw,
        };

        Ok(Self {
            ambient_temperature_k: read_or(
                &lookup,
                keys::AMBIENT_TEMP,
                defaults.ambient_temperature_k,
            )?,
            initial_temperature_k: read_or(
                &lookup,
                keys::INITIAL_TEMP,
                defaults.initial_temperature_k,
            )?,
            topology: PackTopology {
                num_parallel: read_or(
                    &lookup,
                    keys::NUM_PARALLEL,
                    defaults.topology.num_parallel,
                )?,
                num_series: read_or(&lookup, keys::NUM_SERIES, defaults.topology.num_series)?,
            },
            resistances: Resistances {
                busbar_ohm: read_or(
                    &lookup,
                    keys::BUSBAR_RESISTANCE,
                    defaults.resistances.busbar_ohm,
                )?,
                connection_ohm: read_or(
                    &lookup,
                    keys::CONNECTION_RESISTANCE,
                    defaults.resistances.connection_ohm,
                )?,
                internal_ohm: read_or(
                    &lookup,
                    keys::INTERNAL_RESISTANCE,
                    defaults.resistances.internal_ohm,
                )?,
            },
            initial_voltage_v: read_or(&lookup, keys::INITIAL_VOLTAGE, defaults.initial_voltage_v)?,
            cutoff_voltage_v: read_or(&lookup, keys::CUT_OFF_VOLTAGE, defaults.cutoff_voltage_v)?,
            initial_soc: read_or(&lookup, keys::INITIAL_SOC, defaults.initial_soc)?,
            nominal_capacity_ah,
            heat_transfer_coefficient: read_or(
                &lookup,
                keys::HEAT_TRANSFER_COEFFICIENT,
                defaults.heat_transfer_coefficient,
            )?,
            experiment: ExperimentDef {
                period,
                time_s: read_or(&lookup, keys::EXPERIMENT_TIME, defaults.experiment.time_s)?,
            },
            tests,
            circuit: CircuitDiagramDef {
                draw,
                dpi: read_or(&lookup, keys::CIRCUIT_DPI, defaults.circuit.dpi)?,
                component_size: read_or(
                    &lookup,
                    keys::CIRCUIT_CPT_SIZE,
                    defaults.circuit.component_size,
                )?,
                node_spacing: read_or(
                    &lookup,
                    keys::CIRCUIT_NODE_SPACING,
                    defaults.circuit.node_spacing,
                )?,
            },
        })
    }

    /// Resolve a configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Export as key/value pairs readable by [`PackConfig::from_lookup`].
    pub fn to_env_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (keys::AMBIENT_TEMP, self.ambient_temperature_k.to_string()),
            (keys::INITIAL_TEMP, self.initial_temperature_k.to_string()),
            (keys::NUM_PARALLEL, self.topology.num_parallel.to_string()),
            (keys::NUM_SERIES, self.topology.num_series.to_string()),
            (
                keys::BUSBAR_RESISTANCE,
                self.resistances.busbar_ohm.to_string(),
            ),
            (
                keys::CONNECTION_RESISTANCE,
                self.resistances.connection_ohm.to_string(),
            ),
            (
                keys::INTERNAL_RESISTANCE,
                self.resistances.internal_ohm.to_string(),
            ),
            (keys::INITIAL_VOLTAGE, self.initial_voltage_v.to_string()),
            (keys::CUT_OFF_VOLTAGE, self.cutoff_voltage_v.to_string()),
            (keys::INITIAL_SOC, self.initial_soc.to_string()),
            (keys::NOMINAL_CAPACITY, self.nominal_capacity_ah.to_string()),
            (
                keys::HEAT_TRANSFER_COEFFICIENT,
                self.heat_transfer_coefficient.to_string(),
            ),
            (keys::EXPERIMENT_PERIOD, self.experiment.period.to_string()),
            (keys::EXPERIMENT_TIME, self.experiment.time_s.to_string()),
            (keys::CURRENT_TESTS, format_current_tests(&self.tests)),
            (keys::DRAW_CIRCUIT, self.circuit.draw.to_string()),
            (keys::CIRCUIT_DPI, self.circuit.dpi.to_string()),
            (
                keys::CIRCUIT_CPT_SIZE,
                self.circuit.component_size.to_string(),
            ),
            (
                keys::CIRCUIT_NODE_SPACING,
                self.circuit.node_spacing.to_string(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_lookup_gives_defaults() {
        let config = PackConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, PackConfig::default());
        assert_eq!(config.cell_count(), 12);
    }

    #[test]
    fn named_current_tests_keep_order() {
        let tests = parse_current_tests(" 2C:30 , 0.5C:7.5,,1C:15.0").unwrap();
        let names: Vec<_> = tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["2C", "0.5C", "1C"]);
        assert_eq!(tests[0].current_a, 30.0);
    }

    #[test]
    fn bare_current_is_named_in_amps() {
        let tests = parse_current_tests("7.5").unwrap();
        assert_eq!(tests, vec![TestCase::new("7.5A", 7.5)]);
        let tests = parse_current_tests("5, 10").unwrap();
        let names: Vec<_> = tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["5.0A", "10.0A"]);
    }

    #[test]
    fn third_field_overrides_ambient() {
        let tests = parse_current_tests("hot:5:333.15").unwrap();
        assert_eq!(tests[0].ambient_temperature_k, Some(333.15));
    }

    #[test]
    fn malformed_current_is_a_parse_error() {
        let err = parse_current_tests("1C:fast").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref key, .. } if key == keys::CURRENT_TESTS));
        assert!(parse_current_tests(":5").is_err());
    }

    #[test]
    fn temperature_tests_append_after_current_tests() {
        let config = PackConfig::from_lookup(lookup_from(&[
            (keys::CURRENT_TESTS, "1C:5"),
            (keys::TEMPERATURE_TESTS, "-20, 40"),
        ]))
        .unwrap();
        let names: Vec<_> = config.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["1C", "-20°C", "40°C"]);
        // defaults to a 1C discharge of the nominal capacity
        assert_eq!(config.tests[2].current_a, 5.0);
        assert!((config.ambient_for(&config.tests[1]) - 253.15).abs() < 1e-9);
    }

    #[test]
    fn bad_number_names_its_key() {
        let err = PackConfig::from_lookup(lookup_from(&[(keys::NUM_SERIES, "four")])).unwrap_err();
        assert!(err.to_string().contains(keys::NUM_SERIES));
    }

    #[test]
    fn draw_circuit_flag() {
        let on = PackConfig::from_lookup(lookup_from(&[(keys::DRAW_CIRCUIT, "TRUE")])).unwrap();
        assert!(on.circuit.draw);
        let off = PackConfig::from_lookup(lookup_from(&[(keys::DRAW_CIRCUIT, "false")])).unwrap();
        assert!(!off.circuit.draw);
        assert!(PackConfig::from_lookup(lookup_from(&[(keys::DRAW_CIRCUIT, "maybe")])).is_err());
    }
}
