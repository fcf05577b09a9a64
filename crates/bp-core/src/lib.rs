//! bp-core: shared foundation for packsim.
//!
//! Contains:
//! - error (shared error types)
//! - numeric (finite checks and running sums)
//! - units (uom SI types + constructors + temperature conversion)
//! - raw (per-cell time series handed back by a pack solver)

pub mod error;
pub mod numeric;
pub mod raw;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use raw::{RawSimulationOutput, quantity};
pub use units::*;
