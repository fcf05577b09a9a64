//! Query helpers for extracting data from loaded runs and processed results.

use std::path::Path;

use bp_config::PackTopology;
use bp_core::kelvin_to_celsius;
use bp_post::ProcessedResult;
use bp_results::TimeseriesRecord;

use crate::error::{AppError, AppResult};

/// `(x, y)` pairs ready for plotting or export.
pub type Series = Vec<(f64, f64)>;

/// Summary of a run's time range and data.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub time_range: (f64, f64),
    pub record_count: usize,
    pub final_capacity_ah: f64,
    pub final_soc: f64,
    pub min_voltage_v: f64,
    pub peak_temperature_k: f64,
}

/// Get run summary from timeseries records.
pub fn get_run_summary(records: &[TimeseriesRecord]) -> AppResult<RunSummary> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AppError::InvalidInput("No records in run".to_string())),
    };

    let min_voltage_v = records
        .iter()
        .map(|r| r.voltage_avg_v)
        .fold(f64::INFINITY, f64::min);
    let peak_temperature_k = records
        .iter()
        .map(|r| r.temperature_avg_k)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(RunSummary {
        time_range: (first.time_s, last.time_s),
        record_count: records.len(),
        final_capacity_ah: last.capacity_ah,
        final_soc: last.soc,
        min_voltage_v,
        peak_temperature_k,
    })
}

/// Variable names accepted by [`extract_series`].
pub const SERIES_VARIABLES: [&str; 6] = [
    "current",
    "voltage",
    "temperature",
    "heating",
    "capacity",
    "soc",
];

/// Extract the time series of a cell-averaged variable.
pub fn extract_series(records: &[TimeseriesRecord], variable: &str) -> AppResult<Series> {
    let pick: fn(&TimeseriesRecord) -> f64 = match variable {
        "current" | "current_avg_a" => |r| r.current_avg_a,
        "voltage" | "voltage_avg_v" => |r| r.voltage_avg_v,
        "temperature" | "temperature_avg_k" => |r| r.temperature_avg_k,
        "heating" | "heating_avg_w_m3" => |r| r.heating_avg_w_m3,
        "capacity" | "capacity_ah" => |r| r.capacity_ah,
        "soc" => |r| r.soc,
        _ => {
            return Err(AppError::InvalidInput(format!(
                "Unknown variable: {} (expected one of {})",
                variable,
                SERIES_VARIABLES.join(", ")
            )));
        }
    };

    Ok(records.iter().map(|r| (r.time_s, pick(r))).collect())
}

/// The four pack-level panels of a discharge.
#[derive(Debug, Clone, PartialEq)]
pub struct PackView {
    /// Pack voltage (V) against pack capacity (A·h)
    pub voltage_vs_capacity: Series,
    /// State of charge (%) against time (s)
    pub soc_percent_vs_time: Series,
    /// Average cell temperature (°C) against time (s)
    pub temperature_c_vs_time: Series,
    /// Pack capacity (A·h) against time (s)
    pub capacity_vs_time: Series,
}

/// Scale cell averages to the pack: voltage by the series count, capacity by
/// the parallel count.
pub fn pack_view(result: &ProcessedResult, topology: &PackTopology) -> PackView {
    let ns = topology.num_series as f64;
    let np = topology.num_parallel as f64;
    let time = result.time();

    PackView {
        voltage_vs_capacity: result
            .capacity_ah()
            .iter()
            .zip(result.voltage_avg())
            .map(|(q, v)| (q * np, v * ns))
            .collect(),
        soc_percent_vs_time: time
            .iter()
            .zip(result.soc())
            .map(|(t, s)| (*t, s * 100.0))
            .collect(),
        temperature_c_vs_time: time
            .iter()
            .zip(result.temperature_avg())
            .map(|(t, k)| (*t, kelvin_to_celsius(*k)))
            .collect(),
        capacity_vs_time: time
            .iter()
            .zip(result.capacity_ah())
            .map(|(t, q)| (*t, q * np))
            .collect(),
    }
}

/// `time_s,value` CSV with a header line.
pub fn series_to_csv(series: &[(f64, f64)]) -> String {
    let mut out = String::from("time_s,value\n");
    for (t, v) in series {
        out.push_str(&format!("{},{}\n", t, v));
    }
    out
}

pub fn write_series_csv(path: &Path, series: &[(f64, f64)]) -> AppResult<()> {
    std::fs::write(path, series_to_csv(series))?;
    Ok(())
}
