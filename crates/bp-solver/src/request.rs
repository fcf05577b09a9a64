//! What a solver is asked to simulate.

use bp_config::env::keys as config_keys;
use bp_config::{
    CircuitDiagramDef, ExperimentPeriod, PackConfig, PackTopology, Resistances, TestCase,
};

/// Extra keys exported to subprocess solvers on top of the configuration keys.
pub mod keys {
    pub const TEST_LABEL: &str = "TEST_LABEL";
    pub const DISCHARGE_CURRENT: &str = "DISCHARGE_CURRENT";
    pub const EXPERIMENT: &str = "EXPERIMENT";
}

/// Constant-current discharge step.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    /// Pack discharge current (A)
    pub current_a: f64,
    /// Maximum duration (s)
    pub duration_s: f64,
    /// Voltage at which the solver may stop early (V)
    pub cutoff_voltage_v: f64,
    /// Output sampling period
    pub period: ExperimentPeriod,
}

impl Experiment {
    /// Textual form understood by the cell-model library.
    pub fn describe(&self) -> String {
        format!(
            "Discharge at {} A for {} s or until {} V",
            self.current_a, self.duration_s, self.cutoff_voltage_v
        )
    }
}

/// Everything a solver needs for one named test.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveRequest {
    pub label: String,
    pub topology: PackTopology,
    pub resistances: Resistances,
    /// Initial guess for the cell terminal voltage (V)
    pub initial_voltage_v: f64,
    pub initial_soc: f64,
    pub ambient_temperature_k: f64,
    pub initial_temperature_k: f64,
    /// Per-cell total heat transfer coefficient (W/m^2/K)
    pub heat_transfer_coefficient: f64,
    pub experiment: Experiment,
    pub circuit: CircuitDiagramDef,
}

impl SolveRequest {
    pub fn for_test(config: &PackConfig, test: &TestCase) -> Self {
        Self {
            label: test.name.clone(),
            topology: config.topology,
            resistances: config.resistances,
            initial_voltage_v: config.initial_voltage_v,
            initial_soc: config.initial_soc,
            ambient_temperature_k: config.ambient_for(test),
            initial_temperature_k: config.initial_temperature_k,
            heat_transfer_coefficient: config.heat_transfer_coefficient,
            experiment: Experiment {
                current_a: test.current_a,
                duration_s: config.experiment.time_s,
                cutoff_voltage_v: config.cutoff_voltage_v,
                period: config.experiment.period,
            },
            circuit: config.circuit.clone(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.topology.cell_count()
    }

    /// One heat transfer coefficient per cell.
    pub fn heat_transfer_coefficients(&self) -> Vec<f64> {
        vec![self.heat_transfer_coefficient; self.cell_count()]
    }

    /// Environment handed to a subprocess solver.
    pub fn env_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (keys::TEST_LABEL, self.label.clone()),
            (keys::DISCHARGE_CURRENT, self.experiment.current_a.to_string()),
            (keys::EXPERIMENT, self.experiment.describe()),
            (config_keys::AMBIENT_TEMP, self.ambient_temperature_k.to_string()),
            (config_keys::INITIAL_TEMP, self.initial_temperature_k.to_string()),
            (config_keys::NUM_PARALLEL, self.topology.num_parallel.to_string()),
            (config_keys::NUM_SERIES, self.topology.num_series.to_string()),
            (
                config_keys::BUSBAR_RESISTANCE,
                self.resistances.busbar_ohm.to_string(),
            ),
            (
                config_keys::CONNECTION_RESISTANCE,
                self.resistances.connection_ohm.to_string(),
            ),
            (
                config_keys::INTERNAL_RESISTANCE,
                self.resistances.internal_ohm.to_string(),
            ),
            (config_keys::INITIAL_VOLTAGE, self.initial_voltage_v.to_string()),
            (
                config_keys::CUT_OFF_VOLTAGE,
                self.experiment.cutoff_voltage_v.to_string(),
            ),
            (config_keys::INITIAL_SOC, self.initial_soc.to_string()),
            (
                config_keys::HEAT_TRANSFER_COEFFICIENT,
                self.heat_transfer_coefficient.to_string(),
            ),
            (
                config_keys::EXPERIMENT_PERIOD,
                self.experiment.period.to_string(),
            ),
            (
                config_keys::EXPERIMENT_TIME,
                self.experiment.duration_s.to_string(),
            ),
            (config_keys::DRAW_CIRCUIT, self.circuit.draw.to_string()),
            (config_keys::CIRCUIT_DPI, self.circuit.dpi.to_string()),
            (
                config_keys::CIRCUIT_CPT_SIZE,
                self.circuit.component_size.to_string(),
            ),
            (
                config_keys::CIRCUIT_NODE_SPACING,
                self.circuit.node_spacing.to_string(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_text_matches_library_syntax() {
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[1]);
        assert_eq!(
            request.experiment.describe(),
            "Discharge at 15 A for 15000 s or until 2.5 V"
        );
    }

    #[test]
    fn test_ambient_override_reaches_request() {
        let config = PackConfig::default();
        let test = TestCase::new("cold", 5.0).with_ambient(253.15);
        let request = SolveRequest::for_test(&config, &test);
        assert_eq!(request.ambient_temperature_k, 253.15);
        assert_eq!(request.label, "cold");
    }

    #[test]
    fn one_heat_transfer_coefficient_per_cell() {
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[0]);
        assert_eq!(request.heat_transfer_coefficients(), vec![10.0; 12]);
    }

    #[test]
    fn env_pairs_carry_current_and_topology() {
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[2]);
        let pairs = request.env_pairs();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get(keys::DISCHARGE_CURRENT).as_deref(), Some("30"));
        assert_eq!(get(keys::TEST_LABEL).as_deref(), Some("2C"));
        assert_eq!(get(config_keys::NUM_PARALLEL).as_deref(), Some("3"));
        assert_eq!(get(config_keys::EXPERIMENT_PERIOD).as_deref(), Some("10 second"));
    }
}
