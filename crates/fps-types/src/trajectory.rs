// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Trajectory Record
// ─────────────────────────────────────────────────────────────────────

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::error::FpsError;

/// Exogenous input scenario I_n(t).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// I_n(t) = 0.3.
    Constant,
    /// I_n(t) = 1.0 once t >= T/4, else 0.3.
    Step,
    /// I_n(t) = t / T.
    Ramp,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Constant, Scenario::Step, Scenario::Ramp];

    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Constant => "constant",
            Scenario::Step => "step",
            Scenario::Ramp => "ramp",
        }
    }

    /// Human-readable description of the input shape.
    pub fn describe(self) -> &'static str {
        match self {
            Scenario::Constant => "Constant 0.3",
            Scenario::Step => "Step to 1 at t = T/4",
            Scenario::Ramp => "Linear ramp 0→1 over [0,T]",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = FpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Scenario::Constant),
            "step" => Ok(Scenario::Step),
            "ramp" => Ok(Scenario::Ramp),
            other => Err(FpsError::UnknownScenario(other.to_string())),
        }
    }
}

/// A shock applied to the system at `time`, consumed by the resilience
/// criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationEvent {
    pub time: f64,
}

/// Complete time-series record of one FPS run.
///
/// Rows of the 2-D histories are time steps, columns are strates.
/// Built in time order by the simulation loop and never mutated after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub time: Vec<f64>,
    #[serde(rename = "S")]
    pub s: Vec<f64>,
    #[serde(rename = "C")]
    pub c: Vec<f64>,
    pub r: Vec<f64>,
    #[serde(rename = "A")]
    pub a: Vec<Vec<f64>>,
    pub f: Vec<Vec<f64>>,
    /// Extended mode only.
    pub gamma: Option<Vec<Vec<f64>>>,
    /// Extended mode only: environment series.
    #[serde(rename = "E")]
    pub e: Option<Vec<Vec<f64>>>,
    /// Extended mode only: output series.
    #[serde(rename = "O")]
    pub o: Option<Vec<Vec<f64>>>,
    /// Wall-clock cost of each step, seconds.
    pub cpu_times: Vec<f64>,
    /// Wall-clock cost of the whole run, seconds.
    pub total_time: f64,
    pub scenario: Scenario,
    pub extended: bool,
    pub config: SystemConfig,
}

impl Trajectory {
    pub fn t_steps(&self) -> usize {
        self.time.len()
    }

    /// Environment and output histories, when the run recorded them.
    pub fn environment_output(&self) -> Option<(&[Vec<f64>], &[Vec<f64>])> {
        match (&self.e, &self.o) {
            (Some(e), Some(o)) => Some((e.as_slice(), o.as_slice())),
            _ => None,
        }
    }

    /// Mean per-step wall-clock cost (0.0 for an empty record).
    pub fn mean_step_cost(&self) -> f64 {
        if self.cpu_times.is_empty() {
            return 0.0;
        }
        self.cpu_times.iter().sum::<f64>() / self.cpu_times.len() as f64
    }

    /// Last recorded (A_n, f_n) of strate `n`.
    pub fn last_state(&self, n: usize) -> Option<(f64, f64)> {
        let a = self.a.last()?.get(n).copied()?;
        let f = self.f.last()?.get(n).copied()?;
        Some((a, f))
    }

    /// Closed interval spanned by a series, `None` if empty.
    pub fn range_of(series: &[f64]) -> Option<(f64, f64)> {
        if series.is_empty() {
            return None;
        }
        Some(series.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_parse() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.as_str().parse::<Scenario>().unwrap(), scenario);
        }
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        let err = "sawtooth".parse::<Scenario>().unwrap_err();
        assert!(matches!(err, FpsError::UnknownScenario(ref s) if s == "sawtooth"));
        assert_eq!(err.to_string(), "unknown scenario: sawtooth");
    }

    #[test]
    fn test_range_of() {
        assert_eq!(Trajectory::range_of(&[0.2, -1.0, 3.5]), Some((-1.0, 3.5)));
        assert_eq!(Trajectory::range_of(&[]), None);
    }
}
