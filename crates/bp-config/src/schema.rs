//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

use crate::ExperimentPeriod;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackConfig {
    /// Ambient temperature (K)
    #[serde(default = "default_ambient_temperature_k")]
    pub ambient_temperature_k: f64,
    /// Cell temperature at the start of the experiment (K)
    #[serde(default = "default_initial_temperature_k")]
    pub initial_temperature_k: f64,
    #[serde(default)]
    pub topology: PackTopology,
    #[serde(default)]
    pub resistances: Resistances,
    /// Initial guess for cell terminal voltage (V)
    #[serde(default = "default_initial_voltage_v")]
    pub initial_voltage_v: f64,
    /// Lower voltage bound that ends a discharge (V)
    #[serde(default = "default_cutoff_voltage_v")]
    pub cutoff_voltage_v: f64,
    /// Initial state of charge, fraction in [0, 1]
    #[serde(default = "default_initial_soc")]
    pub initial_soc: f64,
    /// Nominal cell capacity (Ah)
    #[serde(default = "default_nominal_capacity_ah")]
    pub nominal_capacity_ah: f64,
    /// Per-cell total heat transfer coefficient (W/m^2/K)
    #[serde(default = "default_heat_transfer_coefficient")]
    pub heat_transfer_coefficient: f64,
    #[serde(default)]
    pub experiment: ExperimentDef,
    #[serde(default = "default_tests")]
    pub tests: Vec<TestCase>,
    #[serde(default)]
    pub circuit: CircuitDiagramDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackTopology {
    /// Cells in parallel (Np)
    pub num_parallel: usize,
    /// Cells in series (Ns)
    pub num_series: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Resistances {
    pub busbar_ohm: f64,
    pub connection_ohm: f64,
    pub internal_ohm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentDef {
    pub period: ExperimentPeriod,
    /// Upper bound on discharge duration (s)
    pub time_s: f64,
}

/// One named discharge test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub name: String,
    /// Pack discharge current (A)
    pub current_a: f64,
    /// Overrides `PackConfig::ambient_temperature_k` for this test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_temperature_k: Option<f64>,
}

/// Rendering options forwarded to the solver's circuit-diagram output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircuitDiagramDef {
    pub draw: bool,
    pub dpi: u32,
    pub component_size: f64,
    pub node_spacing: f64,
}

impl PackConfig {
    /// Total number of cells (Np * Ns).
    pub fn cell_count(&self) -> usize {
        self.topology.cell_count()
    }

    /// Ambient temperature that applies to `test`.
    pub fn ambient_for(&self, test: &TestCase) -> f64 {
        test.ambient_temperature_k
            .unwrap_or(self.ambient_temperature_k)
    }

    pub fn find_test(&self, name: &str) -> Option<&TestCase> {
        self.tests.iter().find(|t| t.name == name)
    }

    /// Scalars handed to the post-processor.
    pub fn post_config(&self) -> bp_post::PostConfig {
        bp_post::PostConfig {
            initial_soc: self.initial_soc,
            nominal_capacity_ah: self.nominal_capacity_ah,
            cutoff_voltage: self.cutoff_voltage_v,
        }
    }
}

impl PackTopology {
    pub fn cell_count(&self) -> usize {
        self.num_parallel * self.num_series
    }
}

impl TestCase {
    pub fn new(name: impl Into<String>, current_a: f64) -> Self {
        Self {
            name: name.into(),
            current_a,
            ambient_temperature_k: None,
        }
    }

    pub fn with_ambient(mut self, ambient_temperature_k: f64) -> Self {
        self.ambient_temperature_k = Some(ambient_temperature_k);
        self
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            ambient_temperature_k: default_ambient_temperature_k(),
            initial_temperature_k: default_initial_temperature_k(),
            topology: PackTopology::default(),
            resistances: Resistances::default(),
            initial_voltage_v: default_initial_voltage_v(),
            cutoff_voltage_v: default_cutoff_voltage_v(),
            initial_soc: default_initial_soc(),
            nominal_capacity_ah: default_nominal_capacity_ah(),
            heat_transfer_coefficient: default_heat_transfer_coefficient(),
            experiment: ExperimentDef::default(),
            tests: default_tests(),
            circuit: CircuitDiagramDef::default(),
        }
    }
}

impl Default for PackTopology {
    fn default() -> Self {
        Self {
            num_parallel: 3,
            num_series: 4,
        }
    }
}

impl Default for Resistances {
    fn default() -> Self {
        Self {
            busbar_ohm: 1e-3,
            connection_ohm: 1e-2,
            internal_ohm: 5e-2,
        }
    }
}

impl Default for ExperimentDef {
    fn default() -> Self {
        Self {
            period: ExperimentPeriod::default(),
            time_s: 15_000.0,
        }
    }
}

impl Default for CircuitDiagramDef {
    fn default() -> Self {
        Self {
            draw: false,
            dpi: 1200,
            component_size: 1.0,
            node_spacing: 2.5,
        }
    }
}

fn default_ambient_temperature_k() -> f64 {
    333.15
}

fn default_initial_temperature_k() -> f64 {
    293.15
}

fn default_initial_voltage_v() -> f64 {
    4.0
}

fn default_cutoff_voltage_v() -> f64 {
    2.5
}

fn default_initial_soc() -> f64 {
    1.0
}

fn default_nominal_capacity_ah() -> f64 {
    5.0
}

fn default_heat_transfer_coefficient() -> f64 {
    10.0
}

pub(crate) fn default_tests() -> Vec<TestCase> {
    vec![
        TestCase::new("0.5C", 7.5),
        TestCase::new("1C", 15.0),
        TestCase::new("2C", 30.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pack_has_twelve_cells() {
        let config = PackConfig::default();
        assert_eq!(config.cell_count(), 12);
        assert_eq!(config.tests.len(), 3);
    }

    #[test]
    fn test_ambient_overrides_pack_ambient() {
        let config = PackConfig::default();
        let cold = TestCase::new("cold", 5.0).with_ambient(263.15);
        assert_eq!(config.ambient_for(&cold), 263.15);
        assert_eq!(config.ambient_for(&config.tests[0]), 333.15);
    }

    #[test]
    fn post_config_follows_pack() {
        let config = PackConfig {
            nominal_capacity_ah: 4.85,
            cutoff_voltage_v: 3.0,
            ..PackConfig::default()
        };
        let post = config.post_config();
        assert_eq!(post.nominal_capacity_ah, 4.85);
        assert_eq!(post.cutoff_voltage, 3.0);
        assert_eq!(post.initial_soc, 1.0);
    }
}
