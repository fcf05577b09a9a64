use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use bp_app::{
    AppError, AppResult, FailurePolicy, RunOptions, RunProgressEvent, RunRequest, RunStage,
    config_service, query, run_service,
};
use bp_config::PackConfig;
use bp_results::RunStore;
use bp_solver::{CommandSolver, PackSolver, RecordingSolver, ReplaySolver};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "packsim")]
#[command(about = "packsim CLI - battery pack discharge test runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file (.yaml, .yml or .json)
        config_path: PathBuf,
    },
    /// Print the resolved configuration as YAML
    ShowConfig {
        /// Configuration file; the process environment is used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the configuration as KEY=VALUE environment lines
    Env {
        /// Configuration file; the process environment is used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run every configured test
    Run(RunArgs),
    /// List stored runs
    Runs {
        /// Run store directory
        #[arg(long)]
        store: PathBuf,
    },
    /// Show details of a stored run
    ShowRun {
        /// Run store directory
        #[arg(long)]
        store: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export one time series of a stored run as CSV
    ExportSeries {
        /// Run store directory
        #[arg(long)]
        store: PathBuf,
        /// Run ID
        run_id: String,
        /// Variable name (current, voltage, temperature, heating, capacity, soc)
        variable: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Configuration file; the process environment is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// External solver program
    #[arg(long, required_unless_present = "replay", conflicts_with = "replay")]
    solver_cmd: Option<PathBuf>,
    /// Argument passed to the solver program (repeatable)
    #[arg(long = "solver-arg", allow_hyphen_values = true)]
    solver_args: Vec<String>,
    /// Replay solver output saved as <DIR>/<test>.json
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Save every solver output to this directory for later replay
    #[arg(long)]
    record: Option<PathBuf>,
    /// Run store directory (defaults to .packsim/runs beside the config file)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Skip cache and force re-run
    #[arg(long)]
    no_cache: bool,
    /// Worker threads (defaults to available parallelism)
    #[arg(long)]
    workers: Option<usize>,
    /// Report failed tests and continue with the rest
    #[arg(long)]
    keep_going: bool,
    /// Write pack-level plot series as CSV files into this directory
    #[arg(long)]
    pack_csv: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::ShowConfig { config } => cmd_show_config(config.as_deref()),
        Commands::Env { config } => cmd_env(config.as_deref()),
        Commands::Run(args) => cmd_run(&args),
        Commands::Runs { store } => cmd_runs(&store),
        Commands::ShowRun { store, run_id } => cmd_show_run(&store, &run_id),
        Commands::ExportSeries {
            store,
            run_id,
            variable,
            output,
        } => cmd_export_series(&store, &run_id, &variable, output.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = config_service::load_config(config_path)?;
    let summary = config_service::summarize_config(&config);
    println!("✓ Configuration is valid");
    println!(
        "  Pack: {}P{}S ({} cells), {} Ah nominal, cutoff {} V",
        summary.num_parallel,
        summary.num_series,
        summary.cell_count,
        summary.nominal_capacity_ah,
        summary.cutoff_voltage_v
    );
    println!(
        "  Experiment: {} s sampled every {} s",
        summary.experiment_time_s, summary.period_s
    );
    println!("  Tests:");
    for test in summary.tests {
        println!(
            "    {} - {} A at {:.2} K",
            test.label, test.current_a, test.ambient_temperature_k
        );
    }
    Ok(())
}

fn cmd_show_config(config_path: Option<&Path>) -> AppResult<()> {
    let config = config_service::resolve_config(config_path)?;
    print!("{}", config_service::to_yaml(&config)?);
    Ok(())
}

fn cmd_env(config_path: Option<&Path>) -> AppResult<()> {
    let config = config_service::resolve_config(config_path)?;
    for line in config_service::env_lines(&config) {
        println!("{}", line);
    }
    Ok(())
}

fn build_solver(args: &RunArgs) -> AppResult<Box<dyn PackSolver>> {
    let solver: Box<dyn PackSolver> = match (&args.solver_cmd, &args.replay) {
        (Some(program), None) => {
            Box::new(CommandSolver::new(program.clone()).args(args.solver_args.iter().cloned()))
        }
        (None, Some(dir)) => Box::new(ReplaySolver::new(dir.clone())),
        _ => {
            return Err(AppError::InvalidInput(
                "exactly one of --solver-cmd or --replay is required".to_string(),
            ));
        }
    };

    match &args.record {
        Some(dir) => {
            let recorder = RecordingSolver::new(solver, dir.clone()).map_err(|e| {
                AppError::InvalidInput(format!("cannot record to {}: {}", dir.display(), e))
            })?;
            Ok(Box::new(recorder))
        }
        None => Ok(solver),
    }
}

fn open_store(args: &RunArgs) -> AppResult<Option<RunStore>> {
    let store = match (&args.store, &args.config) {
        (Some(dir), _) => Some(RunStore::new(dir.clone())?),
        (None, Some(config_path)) => Some(RunStore::for_config(config_path)?),
        (None, None) => None,
    };
    Ok(store)
}

fn cmd_run(args: &RunArgs) -> AppResult<()> {
    let config = config_service::resolve_config(args.config.as_deref())?;
    let solver = build_solver(args)?;
    let store = open_store(args)?;

    println!(
        "Running {} tests on a {}P{}S pack with solver '{}'",
        config.tests.len(),
        config.topology.num_parallel,
        config.topology.num_series,
        solver.name()
    );

    let request = RunRequest {
        config: &config,
        solver: solver.as_ref(),
        store: store.as_ref(),
        options: RunOptions {
            use_cache: !args.no_cache,
            max_workers: args.workers,
            failure_policy: if args.keep_going {
                FailurePolicy::SkipFailed
            } else {
                FailurePolicy::FailFast
            },
            ..RunOptions::default()
        },
    };

    let progress = ProgressLine::new();
    let last_emit = Mutex::new(Instant::now());
    let render = |event: RunProgressEvent| {
        // stage transitions of a test always render; intermediate stages are throttled
        let force = matches!(
            event.stage,
            RunStage::TestCompleted | RunStage::TestFailed | RunStage::Completed
        );
        if let Ok(mut last) = last_emit.lock() {
            if force || last.elapsed().as_millis() >= 100 {
                progress.draw(&event);
                *last = Instant::now();
            }
        }
    };
    let outcome = run_service::run_tests_with_progress(&request, Some(&render));
    progress.finish();
    let response = outcome?;

    for (run, (label, result)) in response.runs.iter().zip(response.results.iter()) {
        let source = if run.loaded_from_cache { "cached" } else { "solved" };
        println!("✓ {} ({}): {}", label, source, run.run_id);
        println!(
            "  Time points: {}  final capacity: {:.4} Ah  final SoC: {:.2}%",
            result.len(),
            result.final_capacity_ah().unwrap_or(0.0),
            result.final_soc().unwrap_or(0.0) * 100.0
        );
        match &run.cutoff {
            Some(cutoff) => println!("  {}", cutoff.reason),
            None => println!("  No cutoff reached"),
        }
    }
    for failure in &response.failures {
        println!("✗ {}: {}", failure.label, failure.error);
    }

    if let Some(dir) = &args.pack_csv {
        write_pack_csv(dir, &config, &response)?;
    }

    print_timing_summary(&response.timing);
    Ok(())
}

fn write_pack_csv(dir: &Path, config: &PackConfig, response: &bp_app::RunResponse) -> AppResult<()> {
    std::fs::create_dir_all(dir)?;
    for (label, result) in response.results.iter() {
        let view = query::pack_view(result, &config.topology);
        let panels = [
            ("voltage_vs_capacity", &view.voltage_vs_capacity),
            ("soc_percent", &view.soc_percent_vs_time),
            ("temperature_c", &view.temperature_c_vs_time),
            ("capacity", &view.capacity_vs_time),
        ];
        for (name, series) in panels {
            let path = dir.join(format!("{}_{}.csv", label, name));
            query::write_series_csv(&path, series)?;
        }
    }
    println!(
        "✓ Wrote pack series for {} tests to {}",
        response.results.len(),
        dir.display()
    );
    Ok(())
}

/// Progress drawn on one stdout line. Only a drawn line is cleared.
struct ProgressLine {
    drawn: AtomicBool,
}

impl ProgressLine {
    fn new() -> Self {
        Self {
            drawn: AtomicBool::new(false),
        }
    }

    fn draw(&self, event: &RunProgressEvent) {
        self.drawn.store(true, Ordering::Relaxed);
        render_cli_progress(event);
    }

    /// Returns whether a line was cleared.
    fn finish(&self) -> bool {
        let drawn = self.drawn.swap(false, Ordering::Relaxed);
        if drawn {
            clear_progress_line();
        }
        drawn
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let width = 28usize;
    let fraction = event.fraction_complete();
    let filled = ((fraction * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    let mut line = format!(
        "\r[{}] {}/{}  {}",
        bar,
        event.completed,
        event.total,
        event.stage.label()
    );
    if let Some(label) = &event.label {
        line.push_str(&format!(" {}", label));
    }
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    line.push_str(&format!("  elapsed={:.1}s", event.elapsed_wall_s));
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_timing_summary(timing: &bp_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let solve_pct = 100.0 * timing.solve_time_s / total;
    let post_pct = 100.0 * timing.post_time_s / total;
    let save_pct = 100.0 * timing.save_time_s / total;

    println!("\nTiming summary (per-test times summed over workers):");
    println!("  Solve:   {:.3}s ({:.1}%)", timing.solve_time_s, solve_pct);
    println!("  Post:    {:.3}s ({:.1}%)", timing.post_time_s, post_pct);
    println!("  Save:    {:.3}s ({:.1}%)", timing.save_time_s, save_pct);
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:   {:.3}s", timing.total_time_s);
    println!(
        "  Tests solved: {}  from cache: {}",
        timing.tests_solved, timing.tests_from_cache
    );
}

fn cmd_runs(store_dir: &Path) -> AppResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    let runs = run_service::list_runs(&store)?;

    if runs.is_empty() {
        println!("No stored runs in {}", store_dir.display());
    } else {
        println!("Stored runs in {}:", store_dir.display());
        for manifest in runs {
            println!(
                "  {} {} ({}, {} points)",
                manifest.run_id, manifest.label, manifest.timestamp, manifest.record_count
            );
        }
    }
    Ok(())
}

fn cmd_show_run(store_dir: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let store = RunStore::new(store_dir.to_path_buf())?;
    let (manifest, records) = run_service::load_run(&store, run_id)?;
    let summary = query::get_run_summary(&records)?;

    println!("\nRun Summary:");
    println!("  Test: {} ({} A)", manifest.label, manifest.current_a);
    println!("  Ambient: {:.2} K", manifest.ambient_temperature_k);
    println!("  Solver: {}", manifest.solver_version);
    println!("  Cells: {}", manifest.cell_count);
    println!("  Time points: {}", summary.record_count);
    println!(
        "  Time range: {:.3} - {:.3} s",
        summary.time_range.0, summary.time_range.1
    );
    println!("  Final capacity: {:.4} Ah", summary.final_capacity_ah);
    println!("  Final SoC: {:.2}%", summary.final_soc * 100.0);
    println!("  Min voltage: {:.3} V", summary.min_voltage_v);
    println!("  Peak temperature: {:.2} K", summary.peak_temperature_k);
    match &manifest.cutoff {
        Some(cutoff) => println!("  Cutoff: {}", cutoff.reason),
        None => println!("  Cutoff: none"),
    }

    Ok(())
}

fn cmd_export_series(
    store_dir: &Path,
    run_id: &str,
    variable: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    let (_manifest, records) = run_service::load_run(&store, run_id)?;
    let series = query::extract_series(&records, variable)?;

    // Write to file or stdout
    if let Some(path) = output {
        query::write_series_csv(path, &series)?;
        println!(
            "✓ Exported {} data points to {}",
            series.len(),
            path.display()
        );
    } else {
        print!("{}", query::series_to_csv(&series));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(stage: RunStage) -> RunProgressEvent {
        RunProgressEvent {
            label: Some("1C".to_string()),
            stage,
            elapsed_wall_s: 0.5,
            completed: 0,
            total: 2,
            message: None,
        }
    }

    #[test]
    fn undrawn_progress_line_is_left_alone() {
        let progress = ProgressLine::new();
        assert!(!progress.finish());
    }

    #[test]
    fn drawn_progress_line_is_cleared_once() {
        let progress = ProgressLine::new();
        progress.draw(&event(RunStage::Solving));
        assert!(progress.finish());
        assert!(!progress.finish());
    }
}
