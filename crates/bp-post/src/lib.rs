//! bp-post: turns raw per-cell solver output into pack-level series.
//!
//! Provides:
//! - Cross-cell averaging and cumulative capacity / state of charge
//! - Ordered cutoff rules with earliest-wins truncation
//! - An insertion-ordered collection of named results

pub mod cutoff;
pub mod error;
pub mod named;
pub mod process;
pub mod processed;

pub use cutoff::{CutoffEvent, CutoffRule, default_rules, find_cutoff};
pub use error::{PostError, PostResult};
pub use named::NamedResults;
pub use process::{PostConfig, process, process_observed};
pub use processed::{ProcessedParts, ProcessedResult};
