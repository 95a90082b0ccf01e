// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Companion Strata Run
// ─────────────────────────────────────────────────────────────────────
//! Noise-driven strata run with a coherence / effort log.
//!
//! Each step every stratum draws I = noise · scale, applies G(I) and
//! updates its state. Every `logging.every_step` steps one row
//! (t, C, effort, cpu_step) is recorded. Rows are persisted as
//! `<log_dir>/<run_name>.csv`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use fps_physics::rng::{seeded_stream, COMPANION_STREAM};
use fps_physics::{effort, phase_coherence, FeedbackKind, StrataDefaults, Stratum};
use fps_types::{FpsError, FpsResult};

use crate::persist::{render_csv, write_text};

pub const LOG_COLUMNS: [&str; 4] = ["t", "C", "effort", "cpu_step"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    /// U(-1, 1)
    #[default]
    Uniform,
    /// N(0, 1)
    Gaussian,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    #[serde(rename = "type")]
    pub kind: NoiseKind,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    #[serde(rename = "G")]
    pub kind: FeedbackKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub every_step: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { every_step: 10 }
    }
}

/// Configuration of one companion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run_name: String,
    /// `None` draws from OS entropy and is not written to the seed ledger.
    pub seed: Option<u64>,
    #[serde(rename = "T")]
    pub t: f64,
    pub dt: f64,
    pub n_strata: usize,
    pub strata_defaults: StrataDefaults,
    pub feedback: FeedbackConfig,
    pub noise: NoiseConfig,
    pub logging: LoggingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_name: "baseline".to_string(),
            seed: None,
            t: 1.0,
            dt: 0.01,
            n_strata: 1,
            strata_defaults: StrataDefaults::default(),
            feedback: FeedbackConfig::default(),
            noise: NoiseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> FpsResult<()> {
        if self.run_name.is_empty()
            || self.run_name.contains(['/', '\\'])
            || self.run_name.starts_with('.')
        {
            return Err(FpsError::Config(format!(
                "run_name must be a plain file stem, got {:?}",
                self.run_name
            )));
        }
        if !(self.t.is_finite() && self.t > 0.0) {
            return Err(FpsError::Config(format!("T must be > 0, got {}", self.t)));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(FpsError::Config(format!("dt must be > 0, got {}", self.dt)));
        }
        if self.n_strata < 1 {
            return Err(FpsError::Config("n_strata must be >= 1".into()));
        }
        if !(self.noise.scale.is_finite() && self.noise.scale >= 0.0) {
            return Err(FpsError::Config(format!(
                "noise scale must be >= 0, got {}",
                self.noise.scale
            )));
        }
        if self.logging.every_step < 1 {
            return Err(FpsError::Config("logging_every_step must be >= 1".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON run configuration. An unrecognised
    /// `feedback.G` is reported as [`FpsError::UnknownFeedback`].
    pub fn from_json(json: &str) -> FpsResult<Self> {
        let parse_error =
            |e: serde_json::Error| FpsError::Config(format!("JSON parse error: {e}"));
        let value: serde_json::Value = serde_json::from_str(json).map_err(parse_error)?;
        if let Some(kind) = value.pointer("/feedback/G").and_then(serde_json::Value::as_str) {
            kind.parse::<FeedbackKind>()?;
        }
        let cfg: Self = serde_json::from_value(value).map_err(parse_error)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> FpsResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn steps(&self) -> usize {
        (self.t / self.dt) as usize
    }
}

/// One logged row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompanionRow {
    pub t: f64,
    #[serde(rename = "C")]
    pub c: f64,
    pub effort: f64,
    pub cpu_step: f64,
}

/// Rows produced by a finished companion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionLog {
    pub run_name: String,
    pub rows: Vec<CompanionRow>,
}

impl CompanionLog {
    pub fn to_csv(&self) -> String {
        render_csv(
            &LOG_COLUMNS,
            self.rows.iter().map(|r| {
                vec![
                    r.t.to_string(),
                    r.c.to_string(),
                    r.effort.to_string(),
                    r.cpu_step.to_string(),
                ]
            }),
        )
    }

    /// Write `<log_dir>/<run_name>.csv` and return its path.
    pub fn persist(&self, log_dir: &Path) -> FpsResult<PathBuf> {
        let path = log_dir.join(format!("{}.csv", self.run_name));
        write_text(&path, &self.to_csv())?;
        log::info!("companion log written to {}", path.display());
        Ok(path)
    }
}

/// Append `run_name,seed` to the seed ledger. No-op without a seed.
pub fn append_seed(ledger: &Path, config: &RunConfig) -> FpsResult<()> {
    let Some(seed) = config.seed else {
        return Ok(());
    };
    if let Some(parent) = ledger.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(ledger)?;
    writeln!(file, "{},{}", config.run_name, seed)?;
    Ok(())
}

pub struct CompanionSimulation {
    config: RunConfig,
    strata: Vec<Stratum>,
    rng: ChaCha8Rng,
}

impl CompanionSimulation {
    pub fn new(config: RunConfig) -> FpsResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => seeded_stream(seed, COMPANION_STREAM),
            None => ChaCha8Rng::from_entropy(),
        };
        let strata = (0..config.n_strata)
            .map(|_| Stratum::from_defaults(&config.strata_defaults))
            .collect();
        Ok(Self {
            config,
            strata,
            rng,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn strata(&self) -> &[Stratum] {
        &self.strata
    }

    fn draw_noise(&mut self) -> f64 {
        let unit = match self.config.noise.kind {
            NoiseKind::Uniform => self.rng.gen_range(-1.0..1.0),
            NoiseKind::Gaussian => self.rng.sample::<f64, _>(StandardNormal),
        };
        unit * self.config.noise.scale
    }

    /// Advance every step and return the logged rows.
    pub fn run(&mut self) -> CompanionLog {
        let steps = self.config.steps();
        let dt = self.config.dt;
        let feedback_kind = self.config.feedback.kind;
        let every = self.config.logging.every_step;

        log::info!(
            "companion run {:?}: {} strata, {steps} steps, G={feedback_kind}",
            self.config.run_name,
            self.strata.len()
        );

        let start = Instant::now();
        let mut rows = Vec::with_capacity(steps / every + 1);
        for k in 0..steps {
            let t = k as f64 * dt;
            for i in 0..self.strata.len() {
                let input = self.draw_noise();
                self.strata[i].update(input, feedback_kind.apply(input), dt);
            }
            if k % every == 0 {
                let cpu_step = start.elapsed().as_secs_f64() / (rows.len() + 1) as f64;
                rows.push(CompanionRow {
                    t,
                    c: phase_coherence(&self.strata),
                    effort: effort(&self.strata),
                    cpu_step,
                });
            }
        }

        CompanionLog {
            run_name: self.config.run_name.clone(),
            rows,
        }
    }
}
