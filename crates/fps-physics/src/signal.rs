// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Signal Engine (Governing Equations)
// ─────────────────────────────────────────────────────────────────────
//! The six FPS equations plus the derived coherence metric:
//!
//!   (1) A_n(t)  = A0_n · σ(I_n(t)),   σ(x) = 1 / (1 + e^{-k_n(x - x0_n)})
//!   (2) Δf_n(t) = clamp(α_n · w_n · Σ_i S_i(t), -1, 1)
//!       f_n(t)  = max(f0_n + Δf_n(t), 0.01)
//!   (3) S(t)    = (1/N) Σ_n A_n sin(2π f_n t + φ_n)               (canonical)
//!       S(t)    = (1/N) Σ_n A_n γ_n sin(2π f_n t + φ_n) G(E_n - O_n) (extended)
//!   (4) G(x)    = tanh(λ x)
//!   (5) r(t)    = φ + ε sin(2π ω t + θ)
//!   (6) G_n(x)  = A_n sinc(f_n (x - μ_n)) exp(-(x - μ_n)² / (2σ_n²))
//!
//!   C(t) = exp(-|r(t) - φ|)
//!
//! Every function is pure given its inputs and the run's fixed
//! [`PhaseAssignment`]; vector outputs are written into caller-owned
//! slices so the step loop stays allocation-free.

use std::f64::consts::{PI, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

use fps_types::{FpsError, FpsResult, SpiralParams, StrateParams, SystemConfig};

/// Exponent clamp for σ: keeps e^z finite for any finite input.
pub const SIGMOID_CLAMP: f64 = 500.0;
/// Per-step frequency excursion bound |Δf_n| <= 1.
pub const MAX_FREQUENCY_SHIFT: f64 = 1.0;
/// Frequency floor: f_n never reaches zero.
pub const MIN_FREQUENCY: f64 = 0.01;

/// σ(x) = 1 / (1 + e^{-k(x - x0)}) with the exponent clamped to ±500.
///
/// Output lies in (0, 1] for every finite input and k > 0.
#[inline]
pub fn sigmoid(x: f64, k: f64, x0: f64) -> f64 {
    let z = (-k * (x - x0)).clamp(-SIGMOID_CLAMP, SIGMOID_CLAMP);
    1.0 / (1.0 + z.exp())
}

/// Spiral feedback G(x) = tanh(λx).
#[inline]
pub fn spiral_feedback(x: f64, lambda: f64) -> f64 {
    (lambda * x).tanh()
}

/// Spiral ratio r(t) = φ + ε sin(2πωt + θ).
#[inline]
pub fn spiral_ratio(spiral: &SpiralParams, t: f64) -> f64 {
    spiral.phi + spiral.epsilon * (TAU * spiral.omega * t + spiral.theta).sin()
}

/// Coherence C(t) = exp(-|r - φ|), in (0, 1].
#[inline]
pub fn coherence(r: f64, phi: f64) -> f64 {
    (-(r - phi).abs()).exp()
}

/// Normalised sinc: sin(πu) / (πu), 1 at u = 0.
#[inline]
pub fn sinc(u: f64) -> f64 {
    if u == 0.0 {
        return 1.0;
    }
    let x = PI * u;
    x.sin() / x
}

/// Strate-local kernel (Eq. 6), diagnostic only.
#[inline]
pub fn strate_kernel(a_n: f64, f_n: f64, x: f64, mu: f64, sigma: f64) -> f64 {
    let d = x - mu;
    a_n * sinc(f_n * d) * (-(d * d) / (2.0 * sigma * sigma)).exp()
}

/// Δf for a single strate given the summed per-strate signal, clamped to ±1.
#[inline]
pub fn frequency_shift(alpha: f64, w: f64, signal_sum: f64) -> f64 {
    (alpha * w * signal_sum).clamp(-MAX_FREQUENCY_SHIFT, MAX_FREQUENCY_SHIFT)
}

/// Σ_i A_i cos(φ_i): the phase-projected sum used for closed-form checks.
pub fn cosine_projection(amplitudes: &[f64], phases: &[f64]) -> f64 {
    amplitudes
        .iter()
        .zip(phases)
        .map(|(a, p)| a * p.cos())
        .sum()
}

/// Fixed per-strate phase offsets φ_n ∈ [0, 2π).
///
/// Drawn exactly once per run; never regenerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAssignment {
    phases: Vec<f64>,
}

impl PhaseAssignment {
    /// Draw `n` offsets 2π·U[0, 1) from `rng`.
    pub fn draw<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        Self {
            phases: (0..n).map(|_| TAU * rng.gen::<f64>()).collect(),
        }
    }

    /// Use explicit offsets (tests, closed-form checks).
    pub fn from_phases(phases: Vec<f64>) -> Self {
        Self { phases }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

/// Evaluates the governing equations for one configured system.
pub struct SignalEngine {
    n: usize,
    strates: StrateParams,
    spiral: SpiralParams,
    lambda: f64,
    phases: PhaseAssignment,
}

impl SignalEngine {
    /// `phases` must carry one offset per strate.
    pub fn new(config: &SystemConfig, phases: PhaseAssignment) -> FpsResult<Self> {
        if phases.len() != config.n() {
            return Err(FpsError::Config(format!(
                "phase assignment length {} != N={}",
                phases.len(),
                config.n()
            )));
        }
        Ok(Self {
            n: config.n(),
            strates: config.strates.clone(),
            spiral: config.spiral.clone(),
            lambda: config.lambda_feedback,
            phases,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn phases(&self) -> &PhaseAssignment {
        &self.phases
    }

    /// Eq. 1 into `out`.
    pub fn amplitude(&self, inputs: &[f64], out: &mut [f64]) {
        let s = &self.strates;
        for n in 0..self.n {
            out[n] = s.a0[n] * sigmoid(inputs[n], s.k[n], s.x0[n]);
        }
    }

    /// Σ_i A_i sin(2π f_i t + φ_i) over all strates.
    pub fn oscillator_sum(&self, amplitudes: &[f64], frequencies: &[f64], t: f64) -> f64 {
        let phases = self.phases.as_slice();
        (0..self.n)
            .map(|i| amplitudes[i] * (TAU * frequencies[i] * t + phases[i]).sin())
            .sum()
    }

    /// Eq. 2 into `out`, driven by the previous step's frequencies.
    pub fn frequency_modulation(
        &self,
        amplitudes: &[f64],
        f_prev: &[f64],
        t: f64,
        out: &mut [f64],
    ) {
        let total = self.oscillator_sum(amplitudes, f_prev, t);
        let s = &self.strates;
        for n in 0..self.n {
            let df = frequency_shift(s.alpha[n], s.w[n], total);
            out[n] = (s.f0[n] + df).max(MIN_FREQUENCY);
        }
    }

    /// Eq. 5.
    pub fn spiral_ratio(&self, t: f64) -> f64 {
        spiral_ratio(&self.spiral, t)
    }

    /// Eq. 4 with the configured λ.
    pub fn feedback(&self, x: f64) -> f64 {
        spiral_feedback(x, self.lambda)
    }

    /// Eq. 3, canonical form.
    pub fn global_signal(&self, amplitudes: &[f64], frequencies: &[f64], t: f64) -> f64 {
        self.oscillator_sum(amplitudes, frequencies, t) / self.n as f64
    }

    /// Eq. 3, extended form with gain γ and feedback on E - O.
    pub fn global_signal_extended(
        &self,
        amplitudes: &[f64],
        frequencies: &[f64],
        gamma: &[f64],
        environment: &[f64],
        output: &[f64],
        t: f64,
    ) -> f64 {
        let phases = self.phases.as_slice();
        let total: f64 = (0..self.n)
            .map(|n| {
                amplitudes[n]
                    * gamma[n]
                    * (TAU * frequencies[n] * t + phases[n]).sin()
                    * self.feedback(environment[n] - output[n])
            })
            .sum();
        total / self.n as f64
    }

    /// Derived coherence against the configured φ.
    pub fn coherence(&self, r: f64) -> f64 {
        coherence(r, self.spiral.phi)
    }
}
