//! Early-termination rules for a discharge.
//!
//! Rules are evaluated in order. Each yields the first index at which it
//! fires; the smallest index wins, and an exact tie goes to the rule listed
//! first.

use std::fmt;

/// A named predicate over the post-processed series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoffRule {
    /// Average terminal voltage at or below the threshold (V).
    Voltage { threshold: f64 },
    /// State of charge at or below zero.
    StateOfCharge,
}

impl CutoffRule {
    pub fn name(&self) -> &'static str {
        match self {
            CutoffRule::Voltage { .. } => "voltage",
            CutoffRule::StateOfCharge => "soc",
        }
    }

    /// First index at which the rule fires, if any.
    ///
    /// NaN never satisfies a rule.
    pub fn first_index(&self, voltage_avg: &[f64], soc: &[f64]) -> Option<usize> {
        match *self {
            CutoffRule::Voltage { threshold } => voltage_avg.iter().position(|&v| v <= threshold),
            CutoffRule::StateOfCharge => soc.iter().position(|&s| s <= 0.0),
        }
    }
}

/// A rule that fired, where, and when.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffEvent {
    pub rule: CutoffRule,
    pub index: usize,
    pub time_s: f64,
}

impl fmt::Display for CutoffEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            CutoffRule::Voltage { threshold } => write!(
                f,
                "Voltage cutoff ({:?}V) reached at {:.1}s",
                threshold, self.time_s
            ),
            CutoffRule::StateOfCharge => write!(f, "SOC reached 0 at {:.1}s", self.time_s),
        }
    }
}

/// Standard rule order: voltage first, then state of charge.
pub fn default_rules(cutoff_voltage: f64) -> [CutoffRule; 2] {
    [
        CutoffRule::Voltage {
            threshold: cutoff_voltage,
        },
        CutoffRule::StateOfCharge,
    ]
}

/// Evaluate `rules` in order and return the earliest firing.
pub fn find_cutoff(
    rules: &[CutoffRule],
    time: &[f64],
    voltage_avg: &[f64],
    soc: &[f64],
) -> Option<CutoffEvent> {
    let mut best: Option<(CutoffRule, usize)> = None;
    for rule in rules {
        if let Some(index) = rule.first_index(voltage_avg, soc) {
            // strict comparison keeps the earlier rule on ties
            let earlier = best.map_or(true, |(_, current)| index < current);
            if earlier {
                best = Some((*rule, index));
            }
        }
    }
    best.map(|(rule, index)| CutoffEvent {
        rule,
        index,
        time_s: time.get(index).copied().unwrap_or(f64::NAN),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIME: [f64; 5] = [0.0, 10.0, 20.0, 30.0, 40.0];

    #[test]
    fn no_rule_fires() {
        let v = [4.0, 3.9, 3.8, 3.7, 3.6];
        let soc = [1.0, 0.9, 0.8, 0.7, 0.6];
        assert_eq!(find_cutoff(&default_rules(2.5), &TIME, &v, &soc), None);
    }

    #[test]
    fn earliest_rule_wins() {
        let v = [4.0, 3.9, 3.8, 2.4, 2.3];
        let soc = [0.5, 0.3, 0.0, -0.2, -0.4];
        let event = find_cutoff(&default_rules(2.5), &TIME, &v, &soc).unwrap();
        assert_eq!(event.rule, CutoffRule::StateOfCharge);
        assert_eq!(event.index, 2);
        assert_eq!(event.time_s, 20.0);
        assert_eq!(event.to_string(), "SOC reached 0 at 20.0s");
    }

    #[test]
    fn tie_goes_to_voltage() {
        let v = [4.0, 3.0, 2.5, 2.4, 2.3];
        let soc = [0.5, 0.3, 0.0, -0.2, -0.4];
        let event = find_cutoff(&default_rules(2.5), &TIME, &v, &soc).unwrap();
        assert_eq!(event.rule.name(), "voltage");
        assert_eq!(event.index, 2);
        assert_eq!(event.to_string(), "Voltage cutoff (2.5V) reached at 20.0s");
    }

    #[test]
    fn rule_order_decides_ties() {
        let v = [4.0, 3.0, 2.5, 2.4, 2.3];
        let soc = [0.5, 0.3, 0.0, -0.2, -0.4];
        let rules = [
            CutoffRule::StateOfCharge,
            CutoffRule::Voltage { threshold: 2.5 },
        ];
        let event = find_cutoff(&rules, &TIME, &v, &soc).unwrap();
        assert_eq!(event.rule, CutoffRule::StateOfCharge);
    }

    #[test]
    fn reason_uses_one_decimal_time_and_float_threshold() {
        let event = CutoffEvent {
            rule: CutoffRule::Voltage { threshold: 3.0 },
            index: 3,
            time_s: 1234.56,
        };
        assert_eq!(event.to_string(), "Voltage cutoff (3.0V) reached at 1234.6s");
    }

    #[test]
    fn nan_does_not_fire() {
        let v = [f64::NAN; 5];
        let soc = [f64::NAN; 5];
        assert_eq!(find_cutoff(&default_rules(2.5), &TIME, &v, &soc), None);
    }

    #[test]
    fn non_positive_threshold_disables_voltage_rule() {
        let v = [4.0, 3.0, 0.1, 0.05, 0.01];
        let soc = [1.0; 5];
        assert_eq!(find_cutoff(&default_rules(0.0), &TIME, &v, &soc), None);
    }
}
