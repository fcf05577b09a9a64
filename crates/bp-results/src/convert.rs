//! Mapping between processed results and stored records.

use nalgebra::DMatrix;

use bp_post::{ProcessedParts, ProcessedResult};

use crate::types::{CellSnapshot, TimeseriesRecord};
use crate::{ResultsError, ResultsResult};

fn row(table: &DMatrix<f64>, r: usize) -> Vec<f64> {
    table.row(r).iter().copied().collect()
}

/// One record per retained time step. Per-cell values are kept when
/// `with_cells` is set.
pub fn records_from_result(result: &ProcessedResult, with_cells: bool) -> Vec<TimeseriesRecord> {
    (0..result.len())
        .map(|i| TimeseriesRecord {
            time_s: result.time()[i],
            current_avg_a: result.current_avg()[i],
            voltage_avg_v: result.voltage_avg()[i],
            temperature_avg_k: result.temperature_avg()[i],
            heating_avg_w_m3: result.heating_avg()[i],
            capacity_ah: result.capacity_ah()[i],
            soc: result.soc()[i],
            cells: with_cells.then(|| CellSnapshot {
                current_a: row(result.current(), i),
                voltage_v: row(result.voltage(), i),
                temperature_k: row(result.temperature(), i),
                heating_w_m3: row(result.heating(), i),
            }),
        })
        .collect()
}

fn cell_table(
    snapshots: &[&CellSnapshot],
    cells: usize,
    pick: fn(&CellSnapshot) -> &Vec<f64>,
) -> ResultsResult<DMatrix<f64>> {
    for (i, snapshot) in snapshots.iter().enumerate() {
        let found = pick(*snapshot).len();
        if found != cells {
            return Err(ResultsError::InvalidRecords {
                message: format!("record {} has {} cells, expected {}", i, found, cells),
            });
        }
    }
    Ok(DMatrix::from_fn(snapshots.len(), cells, |r, c| {
        pick(snapshots[r])[c]
    }))
}

/// Rebuild a processed result from records carrying per-cell snapshots.
pub fn result_from_records(records: &[TimeseriesRecord]) -> ResultsResult<ProcessedResult> {
    let mut snapshots = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        match &record.cells {
            Some(cells) => snapshots.push(cells),
            None => {
                return Err(ResultsError::InvalidRecords {
                    message: format!("record {} has no per-cell values", i),
                });
            }
        }
    }

    let cells = snapshots.first().map(|s| s.current_a.len()).unwrap_or(0);
    let parts = ProcessedParts {
        time: records.iter().map(|r| r.time_s).collect(),
        current: cell_table(&snapshots, cells, |s| &s.current_a)?,
        voltage: cell_table(&snapshots, cells, |s| &s.voltage_v)?,
        temperature: cell_table(&snapshots, cells, |s| &s.temperature_k)?,
        heating: cell_table(&snapshots, cells, |s| &s.heating_w_m3)?,
        current_avg: records.iter().map(|r| r.current_avg_a).collect(),
        voltage_avg: records.iter().map(|r| r.voltage_avg_v).collect(),
        temperature_avg: records.iter().map(|r| r.temperature_avg_k).collect(),
        heating_avg: records.iter().map(|r| r.heating_avg_w_m3).collect(),
        capacity_ah: records.iter().map(|r| r.capacity_ah).collect(),
        soc: records.iter().map(|r| r.soc).collect(),
    };
    Ok(ProcessedResult::from_parts(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::RawSimulationOutput;
    use bp_post::{PostConfig, process};

    fn processed() -> ProcessedResult {
        let raw = RawSimulationOutput::from_rows(
            vec![0.0, 10.0, 20.0],
            &[vec![1.0, 2.0], vec![1.5, 2.5], vec![2.0, 3.0]],
            &[vec![4.0, 4.1], vec![3.9, 4.0], vec![3.8, 3.9]],
            &[vec![300.0, 301.0], vec![302.0, 303.0], vec![304.0, 305.0]],
            &[vec![0.0, 0.0], vec![5.0, 6.0], vec![7.0, 8.0]],
        )
        .unwrap();
        process(&raw, &PostConfig::default()).unwrap()
    }

    #[test]
    fn records_with_cells_rebuild_the_result() {
        let result = processed();
        let records = records_from_result(&result, true);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].cells.as_ref().unwrap().voltage_v, vec![3.9, 4.0]);

        let rebuilt = result_from_records(&records).unwrap();
        assert_eq!(rebuilt, result);
    }

    #[test]
    fn records_without_cells_cannot_be_rebuilt() {
        let records = records_from_result(&processed(), false);
        assert!(records.iter().all(|r| r.cells.is_none()));
        assert!(matches!(
            result_from_records(&records),
            Err(ResultsError::InvalidRecords { .. })
        ));
    }

    #[test]
    fn ragged_snapshots_are_rejected() {
        let mut records = records_from_result(&processed(), true);
        if let Some(cells) = records[2].cells.as_mut() {
            cells.heating_w_m3.push(1.0);
        }
        assert!(result_from_records(&records).is_err());
    }
}
