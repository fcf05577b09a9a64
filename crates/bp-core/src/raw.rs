//! Raw per-cell time series returned by a pack solver.

use nalgebra::DMatrix;

use crate::{CoreError, CoreResult};

/// Physical quantity names used by pack solvers to key their output.
pub mod quantity {
    pub const TIME: &str = "Time [s]";
    pub const CELL_CURRENT: &str = "Cell current [A]";
    pub const TERMINAL_VOLTAGE: &str = "Terminal voltage [V]";
    pub const CELL_TEMPERATURE: &str = "Volume-averaged cell temperature [K]";
    pub const TOTAL_HEATING: &str = "Volume-averaged total heating [W.m-3]";
}

/// One solver invocation's worth of output.
///
/// Tables are indexed `[time_step, cell]`. Shape consistency between the
/// tables and `time` is checked by the post-processor, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSimulationOutput {
    /// Sample times (s)
    pub time: Vec<f64>,
    /// Cell current (A), discharge positive
    pub current: DMatrix<f64>,
    /// Cell terminal voltage (V)
    pub voltage: DMatrix<f64>,
    /// Volume-averaged cell temperature (K)
    pub temperature: DMatrix<f64>,
    /// Volume-averaged total heating (W/m^3)
    pub heating: DMatrix<f64>,
}

impl RawSimulationOutput {
    /// Build from row-major nested vectors, rejecting ragged rows.
    pub fn from_rows(
        time: Vec<f64>,
        current: &[Vec<f64>],
        voltage: &[Vec<f64>],
        temperature: &[Vec<f64>],
        heating: &[Vec<f64>],
    ) -> CoreResult<Self> {
        Ok(Self {
            time,
            current: table_from_rows(current, "current")?,
            voltage: table_from_rows(voltage, "voltage")?,
            temperature: table_from_rows(temperature, "temperature")?,
            heating: table_from_rows(heating, "heating")?,
        })
    }

    /// Number of time samples.
    pub fn steps(&self) -> usize {
        self.time.len()
    }

    /// Number of cells, taken from the current table.
    pub fn cell_count(&self) -> usize {
        self.current.ncols()
    }
}

/// Convert row-major nested vectors into a matrix.
pub fn table_from_rows(rows: &[Vec<f64>], what: &'static str) -> CoreResult<DMatrix<f64>> {
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    for (row, values) in rows.iter().enumerate() {
        if values.len() != ncols {
            return Err(CoreError::Shape {
                what,
                row,
                found: values.len(),
                expected: ncols,
            });
        }
    }
    Ok(DMatrix::from_row_iterator(
        rows.len(),
        ncols,
        rows.iter().flat_map(|r| r.iter().copied()),
    ))
}

/// Convert a matrix back into row-major nested vectors.
pub fn table_to_rows(table: &DMatrix<f64>) -> Vec<Vec<f64>> {
    table
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rectangular_rows_survive_conversion(
            nrows in 1usize..20,
            ncols in 1usize..8,
            seed in -100.0_f64..100.0,
        ) {
            let rows: Vec<Vec<f64>> = (0..nrows)
                .map(|r| (0..ncols).map(|c| seed + (r * ncols + c) as f64).collect())
                .collect();
            let m = table_from_rows(&rows, "t").unwrap();
            prop_assert_eq!(m.nrows(), nrows);
            prop_assert_eq!(m.ncols(), ncols);
            prop_assert_eq!(table_to_rows(&m), rows);
        }
    }
}
