use std::path::PathBuf;

use bp_config::PackConfig;
use bp_core::RawSimulationOutput;
use bp_solver::*;

/// Solver that returns a fixed two-step trace for any request.
struct FixedSolver;

impl PackSolver for FixedSolver {
    fn name(&self) -> &str {
        "fixed"
    }

    fn solve(&self, request: &SolveRequest) -> SolverResult<RawSimulationOutput> {
        let cells = request.cell_count();
        let current = request.experiment.current_a / request.topology.num_parallel as f64;
        let rows = |v: f64| vec![vec![v; cells]; 2];
        Ok(RawSimulationOutput::from_rows(
            vec![0.0, 10.0],
            &rows(current),
            &rows(4.0),
            &rows(300.0),
            &rows(1.0),
        )?)
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn recorded_output_replays_identically() {
    let dir = temp_dir("bp_solver_replay");
    let config = PackConfig::default();
    let request = SolveRequest::for_test(&config, &config.tests[0]);

    let recorder = RecordingSolver::new(FixedSolver, &dir).unwrap();
    let live = recorder.solve(&request).unwrap();
    assert!(dir.join("0.5C.json").exists());

    let replayed = ReplaySolver::new(&dir).solve(&request).unwrap();
    assert_eq!(live, replayed);
    assert_eq!(replayed.cell_count(), 12);
}

#[test]
fn missing_replay_names_the_test() {
    let dir = temp_dir("bp_solver_replay_missing");
    let config = PackConfig::default();
    let request = SolveRequest::for_test(&config, &config.tests[1]);

    let err = ReplaySolver::new(&dir).solve(&request).unwrap_err();
    assert!(matches!(err, SolverError::MissingReplay { ref label, .. } if label == "1C"));
}

#[cfg(unix)]
mod command {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        let dir = temp_dir(name);
        std::fs::create_dir_all(&dir).unwrap();
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[0]);
        let raw = FixedSolver.solve(&request).unwrap();
        let path = dir.join("out.json");
        SolverOutputDocument::from_raw(&raw).save(&path).unwrap();
        path
    }

    #[test]
    fn reads_document_from_stdout() {
        let path = fixture("bp_solver_cmd_ok");
        let solver = CommandSolver::new("sh")
            .arg("-c")
            .arg(format!("cat '{}'", path.display()));
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[0]);

        let raw = solver.solve(&request).unwrap();
        assert_eq!(raw.steps(), 2);
        assert_eq!(solver.name(), "sh");
    }

    #[test]
    fn request_is_exported_through_environment() {
        let path = fixture("bp_solver_cmd_env");
        let solver = CommandSolver::new("sh").args([
            "-c".to_string(),
            format!(
                "test \"$DISCHARGE_CURRENT\" = 30 && test \"$TEST_LABEL\" = 2C && cat '{}'",
                path.display()
            ),
        ]);
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[2]);

        solver.solve(&request).unwrap();
    }

    #[test]
    fn non_zero_exit_is_reported_with_stderr() {
        let solver = CommandSolver::new("sh")
            .arg("-c")
            .arg("echo 'solver diverged' >&2; exit 3");
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[0]);

        let err = solver.solve(&request).unwrap_err();
        match err {
            SolverError::ExitStatus { stderr, .. } => assert_eq!(stderr, "solver diverged"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_on_stdout_is_a_decode_error() {
        let solver = CommandSolver::new("sh").arg("-c").arg("echo not-json");
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[0]);

        assert!(matches!(
            solver.solve(&request),
            Err(SolverError::Decode(_))
        ));
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let solver = CommandSolver::new("/nonexistent/pack-solver");
        let config = PackConfig::default();
        let request = SolveRequest::for_test(&config, &config.tests[0]);

        assert!(matches!(
            solver.solve(&request),
            Err(SolverError::Launch { .. })
        ));
    }
}
