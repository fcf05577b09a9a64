//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    /// Test label, e.g. "1C"
    pub label: String,
    pub timestamp: String,
    pub solver_version: String,
    pub config_hash: String,
    pub current_a: f64,
    pub ambient_temperature_k: f64,
    pub record_count: usize,
    pub cell_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<CutoffSummary>,
}

/// The cutoff rule that ended the discharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffSummary {
    pub rule: String,
    pub index: usize,
    pub time_s: f64,
    pub reason: String,
}

impl From<&bp_post::CutoffEvent> for CutoffSummary {
    fn from(event: &bp_post::CutoffEvent) -> Self {
        Self {
            rule: event.rule.name().to_string(),
            index: event.index,
            time_s: event.time_s,
            reason: event.to_string(),
        }
    }
}

/// One stored time step. Non-finite values are written as the strings
/// `"NaN"`, `"inf"` and `"-inf"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRecord {
    #[serde(with = "stored_float")]
    pub time_s: f64,
    #[serde(with = "stored_float")]
    pub current_avg_a: f64,
    #[serde(with = "stored_float")]
    pub voltage_avg_v: f64,
    #[serde(with = "stored_float")]
    pub temperature_avg_k: f64,
    #[serde(with = "stored_float")]
    pub heating_avg_w_m3: f64,
    #[serde(with = "stored_float")]
    pub capacity_ah: f64,
    #[serde(with = "stored_float")]
    pub soc: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<CellSnapshot>,
}

/// Per-cell values at one time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    #[serde(with = "stored_float::vec")]
    pub current_a: Vec<f64>,
    #[serde(with = "stored_float::vec")]
    pub voltage_v: Vec<f64>,
    #[serde(with = "stored_float::vec")]
    pub temperature_k: Vec<f64>,
    #[serde(with = "stored_float::vec")]
    pub heating_w_m3: Vec<f64>,
}

/// JSON has no NaN or infinity; keep them as tagged strings.
mod stored_float {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Number(f64),
        Text(String),
    }

    fn to_stored(value: f64) -> Stored {
        if value.is_finite() {
            Stored::Number(value)
        } else if value.is_nan() {
            Stored::Text("NaN".to_string())
        } else if value > 0.0 {
            Stored::Text("inf".to_string())
        } else {
            Stored::Text("-inf".to_string())
        }
    }

    // null is what serde_json writes for a bare non-finite f64
    fn from_stored<E: serde::de::Error>(stored: Option<Stored>) -> Result<f64, E> {
        match stored {
            None => Ok(f64::NAN),
            Some(Stored::Number(value)) => Ok(value),
            Some(Stored::Text(text)) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(E::custom(format!("invalid stored float: {other:?}"))),
            },
        }
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        to_stored(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        from_stored(Option::<Stored>::deserialize(deserializer)?)
    }

    pub mod vec {
        use super::*;

        pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(values.iter().map(|v| to_stored(*v)))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<f64>, D::Error> {
            Vec::<Option<Stored>>::deserialize(deserializer)?
                .into_iter()
                .map(from_stored::<D::Error>)
                .collect()
        }
    }

}
