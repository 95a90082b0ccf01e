// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Companion Strata
// ─────────────────────────────────────────────────────────────────────
//! Simple per-stratum update model run next to the main engine.
//!
//!   A += α · sigmoid(I) - β · G(I)
//!   f += λ · G(I)
//!   φ  = (φ + 2π f Δt) mod 2π
//!
//! with a selectable feedback function G.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fps_types::FpsError;

use crate::kuramoto::{order_parameter, wrap_phase};

/// Feedback nonlinearity applied to the stratum input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum FeedbackKind {
    /// tanh(x)
    #[default]
    Tanh,
    /// e^{-|x|} sin(x)
    DampedSine,
    /// sin(x) / x, 1 at 0
    Sinc,
}

impl FeedbackKind {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            FeedbackKind::Tanh => x.tanh(),
            FeedbackKind::DampedSine => (-x.abs()).exp() * x.sin(),
            FeedbackKind::Sinc => {
                if x == 0.0 {
                    1.0
                } else {
                    x.sin() / x
                }
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackKind::Tanh => "tanh",
            FeedbackKind::DampedSine => "damped_sine",
            FeedbackKind::Sinc => "sinc",
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackKind {
    type Err = FpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tanh" => Ok(FeedbackKind::Tanh),
            "damped_sine" => Ok(FeedbackKind::DampedSine),
            "sinc" => Ok(FeedbackKind::Sinc),
            other => Err(FpsError::UnknownFeedback(other.to_string())),
        }
    }
}

impl TryFrom<String> for FeedbackKind {
    type Error = FpsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Initial values and gains shared by every stratum of a companion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataDefaults {
    #[serde(rename = "A0")]
    pub a0: f64,
    pub f0: f64,
    pub phi0: f64,
    pub gamma0: f64,
    pub alpha: f64,
    pub beta: f64,
    pub lambda: f64,
}

impl Default for StrataDefaults {
    fn default() -> Self {
        Self {
            a0: 1.0,
            f0: 1.0,
            phi0: 0.0,
            gamma0: 1.0,
            alpha: 0.1,
            beta: 0.05,
            lambda: 0.01,
        }
    }
}

/// One stratum of the companion model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stratum {
    pub a: f64,
    pub f: f64,
    pub phi: f64,
    pub gamma: f64,
    pub alpha: f64,
    pub beta: f64,
    pub lambda: f64,
}

impl Stratum {
    pub fn from_defaults(d: &StrataDefaults) -> Self {
        Self {
            a: d.a0,
            f: d.f0,
            phi: d.phi0,
            gamma: d.gamma0,
            alpha: d.alpha,
            beta: d.beta,
            lambda: d.lambda,
        }
    }

    /// One explicit step under input `input` and feedback value `feedback`.
    pub fn update(&mut self, input: f64, feedback: f64, dt: f64) {
        let filtered = 1.0 / (1.0 + (-input).exp());
        self.a += self.alpha * filtered - self.beta * feedback;
        self.f += self.lambda * feedback;
        self.phi = wrap_phase(self.phi + TAU * self.f * dt);
    }
}

/// Mean cos(φ_i - ψ), ψ the circular mean phase. 1 when all phases agree.
pub fn phase_coherence(strata: &[Stratum]) -> f64 {
    if strata.is_empty() {
        return 0.0;
    }
    let phases: Vec<f64> = strata.iter().map(|s| s.phi).collect();
    let (_, psi) = order_parameter(&phases);
    phases.iter().map(|p| (p - psi).cos()).sum::<f64>() / phases.len() as f64
}

/// Σ |A_i|; placeholder effort measure.
pub fn effort(strata: &[Stratum]) -> f64 {
    strata.iter().map(|s| s.a.abs()).sum()
}
