//! Re-running post-processing on solver output captured earlier.

use std::path::{Path, PathBuf};

use bp_core::RawSimulationOutput;
use tracing::{debug, warn};

use crate::{PackSolver, SolveRequest, SolverError, SolverOutputDocument, SolverResult};

fn replay_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("{}.json", label))
}

/// Serves `<dir>/<test label>.json` instead of calling a solver.
#[derive(Debug, Clone)]
pub struct ReplaySolver {
    dir: PathBuf,
}

impl ReplaySolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PackSolver for ReplaySolver {
    fn name(&self) -> &str {
        "replay"
    }

    fn solve(&self, request: &SolveRequest) -> SolverResult<RawSimulationOutput> {
        let path = replay_path(&self.dir, &request.label);
        if !path.exists() {
            return Err(SolverError::MissingReplay {
                label: request.label.clone(),
                path,
            });
        }
        debug!(label = %request.label, path = %path.display(), "replaying solver output");
        SolverOutputDocument::load(&path)?.into_raw()
    }
}

/// Wraps a solver and writes every successful output where a
/// [`ReplaySolver`] can find it.
pub struct RecordingSolver<S> {
    inner: S,
    dir: PathBuf,
}

impl<S: PackSolver> RecordingSolver<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> SolverResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { inner, dir })
    }
}

impl<S: PackSolver> PackSolver for RecordingSolver<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn solve(&self, request: &SolveRequest) -> SolverResult<RawSimulationOutput> {
        let raw = self.inner.solve(request)?;
        let path = replay_path(&self.dir, &request.label);
        // capture failures do not fail the run
        if let Err(e) = SolverOutputDocument::from_raw(&raw).save(&path) {
            warn!(label = %request.label, path = %path.display(), error = %e, "failed to record solver output");
        }
        Ok(raw)
    }
}
