//! Experiment sampling period ("10 second", "1 minute", ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Second,
    Minute,
    Hour,
}

impl PeriodUnit {
    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(Self::Second),
            "m" | "min" | "mins" | "minute" | "minutes" => Some(Self::Minute),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(Self::Hour),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
        }
    }
}

/// Sampling period of an experiment, kept in the solver's textual form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExperimentPeriod {
    pub value: f64,
    pub unit: PeriodUnit,
}

impl ExperimentPeriod {
    pub fn seconds(value: f64) -> Self {
        Self {
            value,
            unit: PeriodUnit::Second,
        }
    }

    /// Period length in seconds.
    pub fn as_seconds(&self) -> f64 {
        use bp_core::units::{hours, in_seconds, minutes, s};
        let t = match self.unit {
            PeriodUnit::Second => s(self.value),
            PeriodUnit::Minute => minutes(self.value),
            PeriodUnit::Hour => hours(self.value),
        };
        in_seconds(t)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let err = |message: &str| ConfigError::Parse {
            key: "experiment period".to_string(),
            message: format!("{message}: '{text}'"),
        };

        let trimmed = text.trim();
        let split_at = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| err("missing unit"))?;
        let (number, unit) = trimmed.split_at(split_at);

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| err("invalid number"))?;
        let unit = PeriodUnit::parse(unit.trim()).ok_or_else(|| err("unknown unit"))?;

        Ok(Self { value, unit })
    }
}

impl Default for ExperimentPeriod {
    fn default() -> Self {
        Self::seconds(10.0)
    }
}

impl fmt::Display for ExperimentPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.label())
    }
}

impl FromStr for ExperimentPeriod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ExperimentPeriod {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExperimentPeriod> for String {
    fn from(value: ExperimentPeriod) -> Self {
        value.to_string()
    }
}
