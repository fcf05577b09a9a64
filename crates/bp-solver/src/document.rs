//! Wire form of a solver result: a JSON object keyed by quantity name.

use serde::{Deserialize, Serialize};
use std::path::Path;

use bp_core::raw::{table_from_rows, table_to_rows};
use bp_core::RawSimulationOutput;

use crate::SolverResult;

/// A per-cell table, or a single column for one-cell models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableDoc {
    Cells(Vec<Vec<f64>>),
    Column(Vec<f64>),
}

impl TableDoc {
    fn into_rows(self) -> Vec<Vec<f64>> {
        match self {
            TableDoc::Cells(rows) => rows,
            TableDoc::Column(values) => values.into_iter().map(|v| vec![v]).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOutputDocument {
    #[serde(rename = "Time [s]")]
    pub time: Vec<f64>,
    #[serde(rename = "Cell current [A]")]
    pub current: TableDoc,
    #[serde(rename = "Terminal voltage [V]")]
    pub voltage: TableDoc,
    #[serde(rename = "Volume-averaged cell temperature [K]")]
    pub temperature: TableDoc,
    #[serde(rename = "Volume-averaged total heating [W.m-3]")]
    pub heating: TableDoc,
}

impl SolverOutputDocument {
    pub fn from_raw(raw: &RawSimulationOutput) -> Self {
        Self {
            time: raw.time.clone(),
            current: TableDoc::Cells(table_to_rows(&raw.current)),
            voltage: TableDoc::Cells(table_to_rows(&raw.voltage)),
            temperature: TableDoc::Cells(table_to_rows(&raw.temperature)),
            heating: TableDoc::Cells(table_to_rows(&raw.heating)),
        }
    }

    pub fn into_raw(self) -> SolverResult<RawSimulationOutput> {
        Ok(RawSimulationOutput {
            time: self.time,
            current: table_from_rows(&self.current.into_rows(), "current")?,
            voltage: table_from_rows(&self.voltage.into_rows(), "voltage")?,
            temperature: table_from_rows(&self.temperature.into_rows(), "temperature")?,
            heating: table_from_rows(&self.heating.into_rows(), "heating")?,
        })
    }

    pub fn load(path: &Path) -> SolverResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> SolverResult<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}
