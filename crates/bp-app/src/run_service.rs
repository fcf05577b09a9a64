//! Multi-test execution and caching service.
//!
//! Every test in a configuration is solved and post-processed on a bounded
//! worker pool. Results are assembled in configuration order whatever order
//! the workers finish in.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use bp_config::{PackConfig, TestCase};
use bp_post::{CutoffEvent, NamedResults, ProcessedResult};
use bp_results::{
    CutoffSummary, RunManifest, RunStore, TimeseriesRecord, compute_config_hash, compute_run_id,
    records_from_result, result_from_records,
};
use bp_solver::{PackSolver, SolveRequest};

use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};

/// What happens to the rest of a run when one test fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort on the first failure and return it.
    #[default]
    FailFast,
    /// Log the failure, report it in [`RunResponse::failures`] and carry on.
    SkipFailed,
}

/// Options for running tests.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
    /// Worker threads; `None` uses the available parallelism.
    pub max_workers: Option<usize>,
    pub failure_policy: FailurePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: "0.1.0".to_string(),
            max_workers: None,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

/// Request to execute every test of a configuration.
pub struct RunRequest<'a> {
    pub config: &'a PackConfig,
    pub solver: &'a dyn PackSolver,
    /// Where results are cached and persisted; `None` keeps them in memory.
    pub store: Option<&'a RunStore>,
    pub options: RunOptions,
}

/// Wall-clock totals summed over all tests.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub solve_time_s: f64,
    pub post_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
    pub tests_solved: usize,
    pub tests_from_cache: usize,
}

/// Per-test bookkeeping for a successful test.
#[derive(Debug, Clone)]
pub struct TestRun {
    pub label: String,
    pub run_id: String,
    pub loaded_from_cache: bool,
    pub cutoff: Option<CutoffSummary>,
}

/// A test dropped under [`FailurePolicy::SkipFailed`].
#[derive(Debug)]
pub struct TestFailure {
    pub label: String,
    pub error: AppError,
}

/// Response from a run execution.
#[derive(Debug)]
pub struct RunResponse {
    pub results: NamedResults,
    /// One entry per result, same order as `results`
    pub runs: Vec<TestRun>,
    pub failures: Vec<TestFailure>,
    pub timing: RunTimingSummary,
}

type ProgressFn<'a> = Option<&'a (dyn Fn(RunProgressEvent) + Sync)>;

struct Progress<'a> {
    callback: ProgressFn<'a>,
    started: Instant,
    completed: AtomicUsize,
    total: usize,
}

impl Progress<'_> {
    fn emit(&self, label: Option<&str>, stage: RunStage, message: Option<String>) {
        if let Some(cb) = self.callback {
            cb(RunProgressEvent {
                label: label.map(str::to_string),
                stage,
                elapsed_wall_s: self.started.elapsed().as_secs_f64(),
                completed: self.completed.load(Ordering::SeqCst),
                total: self.total,
                message,
            });
        }
    }

    fn finish(&self, label: &str, stage: RunStage, message: Option<String>) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.emit(Some(label), stage, message);
    }
}

#[derive(Default)]
struct TestTiming {
    solve_s: f64,
    post_s: f64,
    save_s: f64,
    load_cache_s: f64,
}

struct TestOutcome {
    run: TestRun,
    result: ProcessedResult,
    timing: TestTiming,
}

enum TestError {
    /// Not started because another test already failed.
    Cancelled,
    Failed(AppError),
}

/// Execute or load every test of the configuration.
pub fn run_tests(request: &RunRequest) -> AppResult<RunResponse> {
    run_tests_with_progress(request, None)
}

/// Execute or load every test and stream progress events.
///
/// The callback may be invoked from several worker threads at once.
pub fn run_tests_with_progress(
    request: &RunRequest,
    progress_cb: ProgressFn<'_>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let config = request.config;
    let progress = Progress {
        callback: progress_cb,
        started,
        completed: AtomicUsize::new(0),
        total: config.tests.len(),
    };

    progress.emit(None, RunStage::ValidatingConfig, None);
    bp_config::validate_config(config)?;

    let workers = request
        .options
        .max_workers
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .clamp(1, config.tests.len().max(1));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| AppError::Backend {
            message: format!("Failed to start worker pool: {}", e),
        })?;

    info!(
        tests = config.tests.len(),
        workers,
        solver = request.solver.name(),
        policy = ?request.options.failure_policy,
        "starting run"
    );

    let cancelled = AtomicBool::new(false);
    let fail_fast = request.options.failure_policy == FailurePolicy::FailFast;

    let outcomes: Vec<Result<TestOutcome, TestError>> = pool.install(|| {
        config
            .tests
            .par_iter()
            .map(|test| {
                if fail_fast && cancelled.load(Ordering::SeqCst) {
                    progress.finish(&test.name, RunStage::TestSkipped, None);
                    return Err(TestError::Cancelled);
                }
                let outcome = run_one(request, test, &progress);
                match &outcome {
                    Ok(done) => {
                        let message = done.run.cutoff.as_ref().map(|c| c.reason.clone());
                        progress.finish(&test.name, RunStage::TestCompleted, message);
                    }
                    Err(e) => {
                        if fail_fast {
                            cancelled.store(true, Ordering::SeqCst);
                        }
                        progress.finish(&test.name, RunStage::TestFailed, Some(e.to_string()));
                    }
                }
                outcome.map_err(TestError::Failed)
            })
            .collect()
    });

    let mut results = NamedResults::new();
    let mut runs = Vec::new();
    let mut failures = Vec::new();
    let mut timing = RunTimingSummary::default();

    for (test, outcome) in config.tests.iter().zip(outcomes) {
        match outcome {
            Ok(done) => {
                timing.solve_time_s += done.timing.solve_s;
                timing.post_time_s += done.timing.post_s;
                timing.save_time_s += done.timing.save_s;
                timing.load_cache_time_s += done.timing.load_cache_s;
                if done.run.loaded_from_cache {
                    timing.tests_from_cache += 1;
                } else {
                    timing.tests_solved += 1;
                }
                results.insert(test.name.clone(), done.result)?;
                runs.push(done.run);
            }
            Err(TestError::Cancelled) => {}
            Err(TestError::Failed(error)) => {
                if fail_fast {
                    return Err(error);
                }
                warn!(test = %test.name, error = %error, "test failed, skipping");
                failures.push(TestFailure {
                    label: test.name.clone(),
                    error,
                });
            }
        }
    }

    if results.is_empty() {
        if let Some(first) = failures.first() {
            return Err(AppError::AllTestsFailed {
                count: failures.len(),
                first: first.error.to_string(),
            });
        }
    }

    timing.total_time_s = started.elapsed().as_secs_f64();
    progress.emit(
        None,
        RunStage::Completed,
        Some(format!(
            "{} of {} tests completed",
            results.len(),
            config.tests.len()
        )),
    );
    info!(
        completed = results.len(),
        failed = failures.len(),
        from_cache = timing.tests_from_cache,
        total_time_s = timing.total_time_s,
        "run finished"
    );

    Ok(RunResponse {
        results,
        runs,
        failures,
        timing,
    })
}

fn solver_id(request: &RunRequest) -> String {
    format!("{}@{}", request.solver.name(), request.options.solver_version)
}

/// Solve and post-process one test, or load it from the store.
fn run_one(request: &RunRequest, test: &TestCase, progress: &Progress) -> AppResult<TestOutcome> {
    let config = request.config;
    let solver_version = solver_id(request);
    let run_id = compute_run_id(config, test, &solver_version);
    let mut timing = TestTiming::default();

    if let Some(store) = request.store.filter(|_| request.options.use_cache) {
        progress.emit(Some(&test.name), RunStage::CheckingCache, None);
        if store.has_run(&run_id) {
            progress.emit(Some(&test.name), RunStage::LoadingCachedResult, None);
            let load_started = Instant::now();
            match load_result(store, &run_id) {
                Ok((manifest, result)) => {
                    timing.load_cache_s = load_started.elapsed().as_secs_f64();
                    debug!(test = %test.name, run_id = %run_id, "loaded cached run");
                    return Ok(TestOutcome {
                        run: TestRun {
                            label: test.name.clone(),
                            run_id,
                            loaded_from_cache: true,
                            cutoff: manifest.cutoff,
                        },
                        result,
                        timing,
                    });
                }
                Err(e) => {
                    warn!(test = %test.name, run_id = %run_id, error = %e, "cached run unusable, solving again");
                }
            }
        }
    }

    progress.emit(
        Some(&test.name),
        RunStage::Solving,
        Some(format!("{} A", test.current_a)),
    );
    let solve_request = SolveRequest::for_test(config, test);
    let solve_started = Instant::now();
    let raw = request
        .solver
        .solve(&solve_request)
        .map_err(|e| AppError::solver(&test.name, e))?;
    timing.solve_s = solve_started.elapsed().as_secs_f64();

    progress.emit(Some(&test.name), RunStage::PostProcessing, None);
    let post_started = Instant::now();
    let mut cutoff: Option<CutoffEvent> = None;
    let mut observer = |event: &CutoffEvent| cutoff = Some(*event);
    let result = bp_post::process_observed(&raw, &config.post_config(), Some(&mut observer))
        .map_err(|e| AppError::InvalidInput(format!("test '{}': {}", test.name, e)))?;
    timing.post_s = post_started.elapsed().as_secs_f64();
    let cutoff = cutoff.as_ref().map(CutoffSummary::from);

    if let Some(store) = request.store {
        progress.emit(Some(&test.name), RunStage::SavingResults, None);
        let save_started = Instant::now();
        let records = records_from_result(&result, true);
        let manifest = RunManifest {
            run_id: run_id.clone(),
            label: test.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            solver_version,
            config_hash: compute_config_hash(config),
            current_a: test.current_a,
            ambient_temperature_k: config.ambient_for(test),
            record_count: records.len(),
            cell_count: result.cell_count(),
            cutoff: cutoff.clone(),
        };
        store.save_run(&manifest, &records)?;
        timing.save_s = save_started.elapsed().as_secs_f64();
    }

    Ok(TestOutcome {
        run: TestRun {
            label: test.name.clone(),
            run_id,
            loaded_from_cache: false,
            cutoff,
        },
        result,
        timing,
    })
}

/// All stored runs, most recent first.
pub fn list_runs(store: &RunStore) -> AppResult<Vec<RunManifest>> {
    Ok(store.list_runs()?)
}

/// Load a specific run.
pub fn load_run(store: &RunStore, run_id: &str) -> AppResult<(RunManifest, Vec<TimeseriesRecord>)> {
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_timeseries(run_id)?;

    Ok((manifest, records))
}

/// Load a specific run and rebuild its processed result.
pub fn load_result(store: &RunStore, run_id: &str) -> AppResult<(RunManifest, ProcessedResult)> {
    let (manifest, records) = load_run(store, run_id)?;
    if records.len() != manifest.record_count {
        return Err(AppError::Results(format!(
            "run {} has {} records, manifest says {}",
            run_id,
            records.len(),
            manifest.record_count
        )));
    }
    let result = result_from_records(&records)?;
    Ok((manifest, result))
}
