//! Solver running as an external program.
//!
//! The request is exported as environment variables (see
//! [`SolveRequest::env_pairs`]); the program must write a
//! [`SolverOutputDocument`] as JSON on stdout and exit with status 0.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

use bp_core::RawSimulationOutput;
use tracing::{debug, info};

use crate::{PackSolver, SolveRequest, SolverError, SolverOutputDocument, SolverResult};

#[derive(Debug, Clone)]
pub struct CommandSolver {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| program.display().to_string());
        Self {
            name,
            program,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl PackSolver for CommandSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, request: &SolveRequest) -> SolverResult<RawSimulationOutput> {
        debug!(
            program = %self.program.display(),
            label = %request.label,
            experiment = %request.experiment.describe(),
            "launching solver process"
        );
        let started = Instant::now();

        let output = Command::new(&self.program)
            .args(&self.args)
            .envs(request.env_pairs())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SolverError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(SolverError::ExitStatus {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let document: SolverOutputDocument = serde_json::from_slice(&output.stdout)?;
        let raw = document.into_raw()?;
        info!(
            label = %request.label,
            steps = raw.steps(),
            cells = raw.cell_count(),
            elapsed_s = started.elapsed().as_secs_f64(),
            "solver process finished"
        );
        Ok(raw)
    }
}
