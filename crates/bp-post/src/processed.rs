//! Post-processed result of one test.

use nalgebra::DMatrix;

use crate::{PostError, PostResult};

/// Series and tables of one processed test.
///
/// Every series and every table has the same number of rows. Values are only
/// readable through accessors; a result is never modified after it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedResult {
    time: Vec<f64>,
    current: DMatrix<f64>,
    voltage: DMatrix<f64>,
    temperature: DMatrix<f64>,
    heating: DMatrix<f64>,
    current_avg: Vec<f64>,
    voltage_avg: Vec<f64>,
    temperature_avg: Vec<f64>,
    heating_avg: Vec<f64>,
    capacity_ah: Vec<f64>,
    soc: Vec<f64>,
}

/// Loose parts used to rebuild a [`ProcessedResult`], e.g. from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedParts {
    pub time: Vec<f64>,
    pub current: DMatrix<f64>,
    pub voltage: DMatrix<f64>,
    pub temperature: DMatrix<f64>,
    pub heating: DMatrix<f64>,
    pub current_avg: Vec<f64>,
    pub voltage_avg: Vec<f64>,
    pub temperature_avg: Vec<f64>,
    pub heating_avg: Vec<f64>,
    pub capacity_ah: Vec<f64>,
    pub soc: Vec<f64>,
}

impl ProcessedResult {
    /// Assemble a result, checking that all row counts agree.
    pub fn from_parts(parts: ProcessedParts) -> PostResult<Self> {
        let rows = parts.time.len();
        let series = [
            ("current_avg", parts.current_avg.len()),
            ("voltage_avg", parts.voltage_avg.len()),
            ("temperature_avg", parts.temperature_avg.len()),
            ("heating_avg", parts.heating_avg.len()),
            ("capacity_ah", parts.capacity_ah.len()),
            ("soc", parts.soc.len()),
            ("current", parts.current.nrows()),
            ("voltage", parts.voltage.nrows()),
            ("temperature", parts.temperature.nrows()),
            ("heating", parts.heating.nrows()),
        ];
        for (name, len) in series {
            if len != rows {
                return Err(PostError::InvalidInput(format!(
                    "{} has {} rows, time has {}",
                    name, len, rows
                )));
            }
        }

        let cols = parts.current.ncols();
        for (name, table) in [
            ("voltage", &parts.voltage),
            ("temperature", &parts.temperature),
            ("heating", &parts.heating),
        ] {
            if table.ncols() != cols {
                return Err(PostError::InvalidInput(format!(
                    "{} has {} cells, current has {}",
                    name,
                    table.ncols(),
                    cols
                )));
            }
        }

        Ok(Self {
            time: parts.time,
            current: parts.current,
            voltage: parts.voltage,
            temperature: parts.temperature,
            heating: parts.heating,
            current_avg: parts.current_avg,
            voltage_avg: parts.voltage_avg,
            temperature_avg: parts.temperature_avg,
            heating_avg: parts.heating_avg,
            capacity_ah: parts.capacity_ah,
            soc: parts.soc,
        })
    }

    pub fn into_parts(self) -> ProcessedParts {
        ProcessedParts {
            time: self.time,
            current: self.current,
            voltage: self.voltage,
            temperature: self.temperature,
            heating: self.heating,
            current_avg: self.current_avg,
            voltage_avg: self.voltage_avg,
            temperature_avg: self.temperature_avg,
            heating_avg: self.heating_avg,
            capacity_ah: self.capacity_ah,
            soc: self.soc,
        }
    }

    /// Number of retained time samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.current.ncols()
    }

    /// Sample times (s)
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Cell currents (A), `[step, cell]`
    pub fn current(&self) -> &DMatrix<f64> {
        &self.current
    }

    /// Cell terminal voltages (V), `[step, cell]`
    pub fn voltage(&self) -> &DMatrix<f64> {
        &self.voltage
    }

    /// Cell temperatures (K), `[step, cell]`
    pub fn temperature(&self) -> &DMatrix<f64> {
        &self.temperature
    }

    /// Cell heating (W/m^3), `[step, cell]`
    pub fn heating(&self) -> &DMatrix<f64> {
        &self.heating
    }

    pub fn current_avg(&self) -> &[f64] {
        &self.current_avg
    }

    pub fn voltage_avg(&self) -> &[f64] {
        &self.voltage_avg
    }

    pub fn temperature_avg(&self) -> &[f64] {
        &self.temperature_avg
    }

    pub fn heating_avg(&self) -> &[f64] {
        &self.heating_avg
    }

    /// Cumulative discharged charge (A·h)
    pub fn capacity_ah(&self) -> &[f64] {
        &self.capacity_ah
    }

    /// State of charge (fraction, may go below zero)
    pub fn soc(&self) -> &[f64] {
        &self.soc
    }

    pub fn final_capacity_ah(&self) -> Option<f64> {
        self.capacity_ah.last().copied()
    }

    pub fn final_soc(&self) -> Option<f64> {
        self.soc.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(rows: usize) -> ProcessedParts {
        ProcessedParts {
            time: (0..rows).map(|i| i as f64).collect(),
            current: DMatrix::from_element(rows, 2, 1.0),
            voltage: DMatrix::from_element(rows, 2, 4.0),
            temperature: DMatrix::from_element(rows, 2, 300.0),
            heating: DMatrix::from_element(rows, 2, 0.0),
            current_avg: vec![1.0; rows],
            voltage_avg: vec![4.0; rows],
            temperature_avg: vec![300.0; rows],
            heating_avg: vec![0.0; rows],
            capacity_ah: vec![0.0; rows],
            soc: vec![1.0; rows],
        }
    }

    #[test]
    fn parts_roundtrip() {
        let result = ProcessedResult::from_parts(parts(3)).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.cell_count(), 2);
        assert_eq!(result.into_parts(), parts(3));
    }

    #[test]
    fn short_series_is_rejected() {
        let mut p = parts(3);
        p.soc.pop();
        let err = ProcessedResult::from_parts(p).unwrap_err();
        assert!(err.to_string().contains("soc"));
    }

    #[test]
    fn mismatched_cell_count_is_rejected() {
        let mut p = parts(3);
        p.heating = DMatrix::from_element(3, 1, 0.0);
        assert!(ProcessedResult::from_parts(p).is_err());
    }
}
