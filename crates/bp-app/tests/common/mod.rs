//! Synthetic pack solver shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use bp_config::{ExperimentDef, ExperimentPeriod, PackConfig};
use bp_core::RawSimulationOutput;
use bp_solver::{PackSolver, SolveRequest, SolverError, SolverResult};

/// Linear discharge: every cell carries `I / Np`, voltage falls 1.5 V over
/// the nominal 5 Ah, temperature follows the ambient.
#[derive(Default)]
pub struct LinearSolver {
    pub calls: AtomicUsize,
    pub fail_labels: Vec<String>,
}

impl LinearSolver {
    pub fn failing(labels: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PackSolver for LinearSolver {
    fn name(&self) -> &str {
        "linear"
    }

    fn solve(&self, request: &SolveRequest) -> SolverResult<RawSimulationOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_labels.contains(&request.label) {
            return Err(SolverError::Backend {
                message: format!("diverged on {}", request.label),
            });
        }

        let dt = request.experiment.period.as_seconds();
        let steps = (request.experiment.duration_s / dt) as usize + 1;
        let cells = request.cell_count();
        let cell_current = request.experiment.current_a / request.topology.num_parallel as f64;

        let time: Vec<f64> = (0..steps).map(|i| i as f64 * dt).collect();
        let table = |f: &dyn Fn(f64) -> f64| -> Vec<Vec<f64>> {
            time.iter().map(|t| vec![f(*t); cells]).collect()
        };
        let current = table(&|_| cell_current);
        let voltage = table(&|t| 4.2 - 1.5 * cell_current * t / 3600.0 / 5.0);
        let temperature = table(&|_| request.ambient_temperature_k);
        let heating = table(&|_| 1.0e4);

        Ok(RawSimulationOutput::from_rows(
            time.clone(),
            &current,
            &voltage,
            &temperature,
            &heating,
        )?)
    }
}

/// Default pack, one hour at 10 s resolution.
pub fn hour_config() -> PackConfig {
    PackConfig {
        experiment: ExperimentDef {
            period: ExperimentPeriod::parse("10 second").unwrap(),
            time_s: 3600.0,
        },
        ..PackConfig::default()
    }
}

pub fn temp_store(name: &str) -> bp_results::RunStore {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    bp_results::RunStore::new(dir).unwrap()
}
