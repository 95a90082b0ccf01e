// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Kuramoto Comparison Baseline
// ─────────────────────────────────────────────────────────────────────
//! Explicit Euler integrator for the mean-field Kuramoto model:
//!
//!   dθ_i/dt = ω_i + (K/N) Σ_j sin(θ_j - θ_i)
//!
//! Serves as the falsifiability anchor for FPS: its mean per-step cost
//! feeds the CPU-efficiency criterion and its synchronisation statistics
//! are reported alongside. It never participates in the FPS recurrence.

use std::f64::consts::TAU;
use std::time::Instant;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use fps_types::{FpsError, FpsResult};

use crate::rng::{seeded_stream, KURAMOTO_STREAM};
use crate::scenario::time_axis;
use crate::stats::{mean, std_dev, variance};

/// Baseline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KuramotoConfig {
    #[serde(rename = "N")]
    pub n: usize,
    /// Coupling strength.
    #[serde(rename = "K")]
    pub k: f64,
    /// Natural frequencies, one per oscillator.
    pub omega: Vec<f64>,
    pub dt: f64,
    #[serde(rename = "T")]
    pub t: f64,
    pub seed: u64,
}

impl KuramotoConfig {
    pub fn validate(&self) -> FpsResult<()> {
        if self.n < 1 {
            return Err(FpsError::Config(format!(
                "Kuramoto N must be >= 1, got {}",
                self.n
            )));
        }
        if self.omega.len() != self.n {
            return Err(FpsError::Config(format!(
                "Kuramoto omega length {} != N={}",
                self.omega.len(),
                self.n
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(FpsError::Config(format!(
                "Kuramoto dt must be > 0, got {}",
                self.dt
            )));
        }
        if !(self.t.is_finite() && self.t > 0.0) {
            return Err(FpsError::Config(format!(
                "Kuramoto T must be > 0, got {}",
                self.t
            )));
        }
        Ok(())
    }
}

/// Order parameter r = |⟨e^{iθ}⟩| and mean phase ψ = arg⟨e^{iθ}⟩.
pub fn order_parameter(theta: &[f64]) -> (f64, f64) {
    if theta.is_empty() {
        return (0.0, 0.0);
    }
    let n = theta.len() as f64;
    let (sum_sin, sum_cos) = theta
        .iter()
        .fold((0.0, 0.0), |(s, c), &th| (s + th.sin(), c + th.cos()));
    let (mean_sin, mean_cos) = (sum_sin / n, sum_cos / n);
    let r = (mean_sin * mean_sin + mean_cos * mean_cos).sqrt().clamp(0.0, 1.0);
    (r, mean_sin.atan2(mean_cos))
}

/// Reduce a phase into [0, 2π).
#[inline]
pub fn wrap_phase(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly 2π
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Snapshot of the oscillator phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KuramotoState {
    /// Current phases θ_i ∈ [0, 2π).
    pub theta: Vec<f64>,
    pub t: f64,
    pub r_global: f64,
    pub psi: f64,
    pub step_count: u64,
}

impl KuramotoState {
    pub fn new(theta: Vec<f64>) -> Self {
        let (r_global, psi) = order_parameter(&theta);
        Self {
            theta,
            t: 0.0,
            r_global,
            psi,
            step_count: 0,
        }
    }
}

/// Synchronisation statistics reported next to the FPS criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMetrics {
    pub mean_order_parameter: f64,
    pub synchronization_variance: f64,
    /// Standard deviation of the final phases.
    pub phase_spread: f64,
    /// Mean |Δr| between consecutive steps.
    pub regulation_metric: f64,
}

/// Full record of a baseline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KuramotoRun {
    pub time: Vec<f64>,
    pub theta: Vec<Vec<f64>>,
    pub r: Vec<f64>,
    pub psi: Vec<f64>,
    pub cpu_times: Vec<f64>,
    pub total_time: f64,
    pub config: KuramotoConfig,
    pub sync_metrics: SyncMetrics,
}

impl KuramotoRun {
    /// Mean per-step wall-clock cost, seconds.
    pub fn mean_step_cost(&self) -> f64 {
        mean(&self.cpu_times)
    }
}

/// Compute synchronisation statistics of an order-parameter history.
pub fn sync_metrics(r: &[f64], final_theta: &[f64]) -> SyncMetrics {
    let regulation_metric = if r.len() < 2 {
        0.0
    } else {
        r.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (r.len() - 1) as f64
    };
    SyncMetrics {
        mean_order_parameter: mean(r),
        synchronization_variance: variance(r),
        phase_spread: std_dev(final_theta),
        regulation_metric,
    }
}

/// Explicit Euler Kuramoto integrator with its own seeded stream.
pub struct KuramotoModel {
    cfg: KuramotoConfig,
    // Pre-allocated scratch
    dtheta: Vec<f64>,
    rng: ChaCha8Rng,
}

impl KuramotoModel {
    pub fn new(config: KuramotoConfig) -> FpsResult<Self> {
        config.validate()?;
        let rng = seeded_stream(config.seed, KURAMOTO_STREAM);
        Ok(Self {
            dtheta: vec![0.0; config.n],
            cfg: config,
            rng,
        })
    }

    pub fn config(&self) -> &KuramotoConfig {
        &self.cfg
    }

    /// Random initial phases in [0, 2π).
    pub fn initial_state(&mut self) -> KuramotoState {
        let theta = (0..self.cfg.n)
            .map(|_| TAU * self.rng.gen::<f64>())
            .collect();
        KuramotoState::new(theta)
    }

    /// dθ_i/dt into the scratch buffer.
    fn compute_derivatives(&mut self, theta: &[f64]) {
        let n = self.cfg.n;
        let gain = self.cfg.k / n as f64;
        for i in 0..n {
            let coupling: f64 = theta.iter().map(|&th_j| (th_j - theta[i]).sin()).sum();
            self.dtheta[i] = self.cfg.omega[i] + gain * coupling;
        }
    }

    /// Advance the state by one timestep.
    pub fn step(&mut self, state: &KuramotoState) -> FpsResult<KuramotoState> {
        let theta = &state.theta;
        if theta.len() != self.cfg.n {
            return Err(FpsError::Config(format!(
                "theta length {} != N={}",
                theta.len(),
                self.cfg.n
            )));
        }
        if theta.iter().any(|th| !th.is_finite()) {
            return Err(FpsError::Config(
                "input theta contains NaN or Inf".to_string(),
            ));
        }

        self.compute_derivatives(theta);
        let dt = self.cfg.dt;
        let theta_new: Vec<f64> = theta
            .iter()
            .zip(&self.dtheta)
            .map(|(&th, &d)| wrap_phase(th + dt * d))
            .collect();

        let mut next = KuramotoState::new(theta_new);
        next.t = state.t + dt;
        next.step_count = state.step_count + 1;
        Ok(next)
    }

    /// Integrate over the configured horizon.
    ///
    /// Each step records the current state before advancing it; the last
    /// recorded state is not advanced.
    pub fn run(&mut self) -> FpsResult<KuramotoRun> {
        let start = Instant::now();
        let time = time_axis(self.cfg.t, self.cfg.dt);
        let steps = time.len();

        let mut theta_hist = Vec::with_capacity(steps);
        let mut r_hist = Vec::with_capacity(steps);
        let mut psi_hist = Vec::with_capacity(steps);
        let mut cpu_times = Vec::with_capacity(steps);

        let mut state = self.initial_state();
        for idx in 0..steps {
            let step_start = Instant::now();
            theta_hist.push(state.theta.clone());
            r_hist.push(state.r_global);
            psi_hist.push(state.psi);
            if idx + 1 < steps {
                state = self.step(&state)?;
            }
            cpu_times.push(step_start.elapsed().as_secs_f64());
        }

        let sync = sync_metrics(&r_hist, theta_hist.last().map(Vec::as_slice).unwrap_or_default());
        let total_time = start.elapsed().as_secs_f64();
        log::debug!(
            "kuramoto baseline: N={} steps={} mean_r={:.4} total={:.6}s",
            self.cfg.n,
            steps,
            sync.mean_order_parameter,
            total_time
        );

        Ok(KuramotoRun {
            time,
            theta: theta_hist,
            r: r_hist,
            psi: psi_hist,
            cpu_times,
            total_time,
            config: self.cfg.clone(),
            sync_metrics: sync,
        })
    }
}

/// Build, run and summarise a baseline in one call.
pub fn run_kuramoto_control(config: KuramotoConfig) -> FpsResult<KuramotoRun> {
    KuramotoModel::new(config)?.run()
}
