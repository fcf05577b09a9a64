//! Raw solver output to pack-level series.

use nalgebra::DMatrix;
use tracing::{debug, info};

use bp_core::constants::SECONDS_PER_HOUR;
use bp_core::{RawSimulationOutput, cumulative_sum, ensure_finite};

use crate::cutoff::{CutoffEvent, default_rules, find_cutoff};
use crate::processed::{ProcessedParts, ProcessedResult};
use crate::{PostError, PostResult};

/// Scalars the post-processor needs from the pack configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostConfig {
    /// State of charge at t = 0, in [0, 1]
    pub initial_soc: f64,
    /// Nominal cell capacity (A·h), > 0
    pub nominal_capacity_ah: f64,
    /// Average terminal voltage that ends the discharge (V); <= 0 disables it
    pub cutoff_voltage: f64,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            initial_soc: 1.0,
            nominal_capacity_ah: 5.0,
            cutoff_voltage: 2.5,
        }
    }
}

impl PostConfig {
    fn validate(&self) -> PostResult<()> {
        let soc = ensure_finite(self.initial_soc, "initial_soc")?;
        if !(0.0..=1.0).contains(&soc) {
            return Err(PostError::InvalidInput(format!(
                "initial_soc must be within [0, 1], got {}",
                soc
            )));
        }
        let capacity = ensure_finite(self.nominal_capacity_ah, "nominal_capacity_ah")?;
        if capacity <= 0.0 {
            return Err(PostError::InvalidInput(format!(
                "nominal_capacity_ah must be positive, got {}",
                capacity
            )));
        }
        ensure_finite(self.cutoff_voltage, "cutoff_voltage")?;
        Ok(())
    }
}

/// Process one solver output. See [`process_observed`].
pub fn process(raw: &RawSimulationOutput, config: &PostConfig) -> PostResult<ProcessedResult> {
    process_observed(raw, config, None)
}

/// Process one solver output, reporting the cutoff that fired (if any) to
/// `observer`.
///
/// Row means of every table, cumulative capacity with a uniform step
/// `time[1] - time[0]`, state of charge, then truncation to the earliest
/// cutoff index (inclusive). Reaching the end without a cutoff is not an
/// error.
pub fn process_observed(
    raw: &RawSimulationOutput,
    config: &PostConfig,
    observer: Option<&mut dyn FnMut(&CutoffEvent)>,
) -> PostResult<ProcessedResult> {
    config.validate()?;
    check_shape(raw)?;

    let current_avg = row_means(&raw.current);
    let voltage_avg = row_means(&raw.voltage);
    let temperature_avg = row_means(&raw.temperature);
    let heating_avg = row_means(&raw.heating);

    let dt = ensure_finite(raw.time[1] - raw.time[0], "time step")?;
    let capacity_ah: Vec<f64> = cumulative_sum(current_avg.iter().map(|i| i * dt))
        .into_iter()
        .map(|q| q / SECONDS_PER_HOUR)
        .collect();
    let soc: Vec<f64> = capacity_ah
        .iter()
        .map(|q| config.initial_soc - q / config.nominal_capacity_ah)
        .collect();

    let parts = ProcessedParts {
        time: raw.time.clone(),
        current: raw.current.clone(),
        voltage: raw.voltage.clone(),
        temperature: raw.temperature.clone(),
        heating: raw.heating.clone(),
        current_avg,
        voltage_avg,
        temperature_avg,
        heating_avg,
        capacity_ah,
        soc,
    };

    let rules = default_rules(config.cutoff_voltage);
    let cutoff = find_cutoff(&rules, &parts.time, &parts.voltage_avg, &parts.soc);

    let parts = match cutoff {
        Some(event) => {
            info!(
                rule = event.rule.name(),
                index = event.index,
                time_s = event.time_s,
                "{}",
                event
            );
            if let Some(observer) = observer {
                observer(&event);
            }
            truncate(parts, event.index + 1)
        }
        None => {
            debug!(steps = parts.time.len(), "no cutoff reached");
            parts
        }
    };

    ProcessedResult::from_parts(parts)
}

fn check_shape(raw: &RawSimulationOutput) -> PostResult<()> {
    let steps = raw.time.len();
    if steps < 2 {
        return Err(PostError::InvalidInput(format!(
            "need at least 2 time samples, got {}",
            steps
        )));
    }

    let cells = raw.current.ncols();
    for (name, table) in [
        ("current", &raw.current),
        ("voltage", &raw.voltage),
        ("temperature", &raw.temperature),
        ("heating", &raw.heating),
    ] {
        if table.nrows() != steps {
            return Err(PostError::InvalidInput(format!(
                "{} table has {} rows, time has {}",
                name,
                table.nrows(),
                steps
            )));
        }
        if table.ncols() == 0 {
            return Err(PostError::InvalidInput(format!("{} table has no cells", name)));
        }
        if table.ncols() != cells {
            return Err(PostError::InvalidInput(format!(
                "{} table has {} cells, current has {}",
                name,
                table.ncols(),
                cells
            )));
        }
    }
    Ok(())
}

fn row_means(table: &DMatrix<f64>) -> Vec<f64> {
    (0..table.nrows()).map(|r| table.row(r).mean()).collect()
}

fn keep_rows(table: DMatrix<f64>, rows: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, table.ncols(), |r, c| table[(r, c)])
}

fn truncate(mut parts: ProcessedParts, rows: usize) -> ProcessedParts {
    parts.time.truncate(rows);
    parts.current_avg.truncate(rows);
    parts.voltage_avg.truncate(rows);
    parts.temperature_avg.truncate(rows);
    parts.heating_avg.truncate(rows);
    parts.capacity_ah.truncate(rows);
    parts.soc.truncate(rows);
    ProcessedParts {
        current: keep_rows(parts.current, rows),
        voltage: keep_rows(parts.voltage, rows),
        temperature: keep_rows(parts.temperature, rows),
        heating: keep_rows(parts.heating, rows),
        ..parts
    }
}
