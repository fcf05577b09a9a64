//! bp-solver: boundary to the external cell/pack solvers.
//!
//! The electrochemical and circuit numerics live outside this workspace.
//! This crate defines what a solver is asked ([`SolveRequest`]), what it must
//! hand back ([`bp_core::RawSimulationOutput`]) and the adapters that reach
//! real solvers: a subprocess speaking JSON on stdout, and a replay directory
//! of previously captured outputs.

pub mod command;
pub mod document;
pub mod error;
pub mod replay;
pub mod request;
pub mod traits;

pub use command::CommandSolver;
pub use document::{SolverOutputDocument, TableDoc};
pub use error::{SolverError, SolverResult};
pub use replay::{RecordingSolver, ReplaySolver};
pub use request::{Experiment, SolveRequest};
pub use traits::PackSolver;
