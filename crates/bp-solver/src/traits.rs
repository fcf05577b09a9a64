use bp_core::RawSimulationOutput;

use crate::{SolveRequest, SolverResult};

/// An external pack solver.
///
/// Calls are blocking and may take a long time; implementations must be
/// shareable across the worker threads that run named tests concurrently.
pub trait PackSolver: Send + Sync {
    /// Short name used in logs and run manifests.
    fn name(&self) -> &str;

    /// Run one discharge experiment.
    fn solve(&self, request: &SolveRequest) -> SolverResult<RawSimulationOutput>;
}

impl<S: PackSolver + ?Sized> PackSolver for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, request: &SolveRequest) -> SolverResult<RawSimulationOutput> {
        (**self).solve(request)
    }
}
