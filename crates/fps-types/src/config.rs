// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — System Configuration
// ─────────────────────────────────────────────────────────────────────

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FpsError, FpsResult};

/// Names of the per-strate vectors, in schema order.
pub const STRATE_VECTOR_NAMES: [&str; 7] = ["A0", "f0", "alpha", "beta", "k", "x0", "w"];

/// `system` section: size, horizon and seed of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSection {
    /// Number of strates.
    #[serde(rename = "N")]
    pub n: usize,
    /// Simulated duration.
    #[serde(rename = "T")]
    pub t: f64,
    /// Integration step. Default: 0.1.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Seed for every random stream of the run.
    pub seed: u64,
}

/// `spiral` section: r(t) = phi + epsilon · sin(2π·omega·t + theta).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiralParams {
    pub phi: f64,
    pub epsilon: f64,
    pub omega: f64,
    pub theta: f64,
}

/// `strates` section: one entry per strate in every vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrateParams {
    /// Peak amplitude.
    #[serde(rename = "A0")]
    pub a0: Vec<f64>,
    /// Base frequency.
    pub f0: Vec<f64>,
    /// Frequency-modulation gain.
    pub alpha: Vec<f64>,
    /// Damping; carried for the schema, unused by the recurrence.
    pub beta: Vec<f64>,
    /// Sigmoid steepness.
    pub k: Vec<f64>,
    /// Sigmoid centre.
    pub x0: Vec<f64>,
    /// Scalar coupling weight.
    pub w: Vec<f64>,
}

impl StrateParams {
    /// Every per-strate vector paired with its schema name.
    pub fn named_vectors(&self) -> [(&'static str, &[f64]); 7] {
        [
            ("A0", &self.a0),
            ("f0", &self.f0),
            ("alpha", &self.alpha),
            ("beta", &self.beta),
            ("k", &self.k),
            ("x0", &self.x0),
            ("w", &self.w),
        ]
    }
}

/// Validated, immutable configuration of one FPS run.
///
/// Built once at the boundary (JSON or the builders in `fps-physics`),
/// checked by [`SystemConfig::validate`], then handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub system: SystemSection,
    pub spiral: SpiralParams,
    pub strates: StrateParams,
    /// Spiral feedback gain λ in G(x) = tanh(λx). Default: 1.0.
    #[serde(rename = "lambda", default = "default_lambda")]
    pub lambda_feedback: f64,
}

fn default_dt() -> f64 {
    0.1
}

fn default_lambda() -> f64 {
    1.0
}

impl SystemConfig {
    pub fn n(&self) -> usize {
        self.system.n
    }

    pub fn duration(&self) -> f64 {
        self.system.t
    }

    pub fn dt(&self) -> f64 {
        self.system.dt
    }

    pub fn seed(&self) -> u64 {
        self.system.seed
    }

    /// Number of integration steps: floor(T / dt).
    pub fn t_steps(&self) -> usize {
        let steps = (self.system.t / self.system.dt).floor();
        if steps.is_finite() && steps > 0.0 {
            steps as usize
        } else {
            0
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> FpsResult<()> {
        let n = self.system.n;
        if n < 1 {
            return Err(FpsError::Config(format!("N must be >= 1, got {n}")));
        }
        if !(self.system.t.is_finite() && self.system.t > 0.0) {
            return Err(FpsError::Config(format!(
                "T must be finite and > 0, got {}",
                self.system.t
            )));
        }
        if !(self.system.dt.is_finite() && self.system.dt > 0.0) {
            return Err(FpsError::Config(format!(
                "dt must be finite and > 0, got {}",
                self.system.dt
            )));
        }
        if self.t_steps() == 0 {
            return Err(FpsError::Config(format!(
                "T={} is shorter than one step of dt={}",
                self.system.t, self.system.dt
            )));
        }

        let spiral = &self.spiral;
        for (name, value) in [
            ("phi", spiral.phi),
            ("epsilon", spiral.epsilon),
            ("omega", spiral.omega),
            ("theta", spiral.theta),
            ("lambda", self.lambda_feedback),
        ] {
            if !value.is_finite() {
                return Err(FpsError::Config(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }

        for (name, values) in self.strates.named_vectors() {
            if values.len() != n {
                return Err(FpsError::Config(format!(
                    "Strate parameter {name} length {} != N={n}",
                    values.len()
                )));
            }
            if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
                return Err(FpsError::Config(format!(
                    "Strate parameter {name}[{bad}] is not finite"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> FpsResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FpsError::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> FpsResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn to_json_pretty(&self) -> FpsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FpsError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> SystemConfig {
        SystemConfig {
            system: SystemSection {
                n,
                t: 2.0,
                dt: 0.05,
                seed: 7,
            },
            spiral: SpiralParams {
                phi: 1.618,
                epsilon: 0.05,
                omega: 0.1,
                theta: 0.0,
            },
            strates: StrateParams {
                a0: vec![1.0; n],
                f0: vec![0.5; n],
                alpha: vec![0.1; n],
                beta: vec![0.1; n],
                k: vec![2.0; n],
                x0: vec![0.5; n],
                w: vec![0.01; n],
            },
            lambda_feedback: 1.0,
        }
    }

    #[test]
    fn test_sample_validates() {
        assert!(sample(3).validate().is_ok());
        assert_eq!(sample(3).t_steps(), 40);
    }

    #[test]
    fn test_zero_strates_rejected() {
        assert!(matches!(sample(0).validate(), Err(FpsError::Config(_))));
    }

    #[test]
    fn test_every_vector_length_checked() {
        for name in STRATE_VECTOR_NAMES {
            let mut cfg = sample(4);
            let v = match name {
                "A0" => &mut cfg.strates.a0,
                "f0" => &mut cfg.strates.f0,
                "alpha" => &mut cfg.strates.alpha,
                "beta" => &mut cfg.strates.beta,
                "k" => &mut cfg.strates.k,
                "x0" => &mut cfg.strates.x0,
                _ => &mut cfg.strates.w,
            };
            v.pop();
            let err = cfg.validate().unwrap_err().to_string();
            assert!(
                err.contains(&format!("Strate parameter {name} length 3 != N=4")),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_non_positive_dt_rejected() {
        let mut cfg = sample(2);
        cfg.system.dt = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_horizon_shorter_than_step_rejected() {
        let mut cfg = sample(2);
        cfg.system.t = 0.01;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("shorter than one step"), "{err}");
    }

    #[test]
    fn test_nan_parameter_rejected() {
        let mut cfg = sample(2);
        cfg.strates.k[1] = f64::NAN;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("k[1]"), "{err}");
    }

    #[test]
    fn test_from_json_defaults_dt_and_lambda() {
        let json = r#"{
            "system": {"N": 2, "T": 1.0, "seed": 3},
            "spiral": {"phi": 1.618, "epsilon": 0.05, "omega": 0.1, "theta": 0.0},
            "strates": {
                "A0": [1.0, 1.0], "f0": [0.5, 0.6], "alpha": [0.1, 0.1],
                "beta": [0.1, 0.1], "k": [2.0, 2.0], "x0": [0.5, 0.5], "w": [0.01, 0.01]
            }
        }"#;
        let cfg = SystemConfig::from_json(json).unwrap();
        assert_eq!(cfg.dt(), 0.1);
        assert_eq!(cfg.lambda_feedback, 1.0);
        assert_eq!(cfg.t_steps(), 10);
    }

    #[test]
    fn test_from_json_missing_section() {
        let json = r#"{"system": {"N": 1, "T": 1.0, "seed": 3}}"#;
        let err = SystemConfig::from_json(json).unwrap_err().to_string();
        assert!(err.contains("spiral"), "{err}");
    }

    #[test]
    fn test_from_json_length_mismatch() {
        let json = r#"{
            "system": {"N": 2, "T": 1.0, "seed": 3, "dt": 0.1},
            "spiral": {"phi": 1.618, "epsilon": 0.05, "omega": 0.1, "theta": 0.0},
            "strates": {
                "A0": [1.0, 1.0], "f0": [0.5, 0.6], "alpha": [0.1, 0.1],
                "beta": [0.1, 0.1], "k": [2.0, 2.0], "x0": [0.5, 0.5], "w": [0.01]
            },
            "lambda": 0.5
        }"#;
        let err = SystemConfig::from_json(json).unwrap_err().to_string();
        assert!(err.contains("w length 1 != N=2"), "{err}");
    }

    #[test]
    fn test_json_keys_round_trip() {
        let json = sample(2).to_json_pretty().unwrap();
        assert!(json.contains("\"N\""));
        assert!(json.contains("\"A0\""));
        assert!(json.contains("\"lambda\""));
    }
}
