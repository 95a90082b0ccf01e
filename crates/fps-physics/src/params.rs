// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Canonical Parameters
// ─────────────────────────────────────────────────────────────────────
//! Default FPS and Kuramoto-baseline configurations.
//!
//! Per-strate A0, f0 and beta are drawn uniformly from the run seed;
//! the remaining parameters are fixed:
//!   - alpha = 0.1, w = 0.01 (reduced for stability)
//!   - k = 2.0, x0 = 0.5 (sigmoid steepness and centre)
//!   - phi = 1.618, epsilon = 0.05, omega = 0.1, theta = 0

use rand::Rng;

use fps_types::{SpiralParams, StrateParams, SystemConfig, SystemSection};

use crate::kuramoto::KuramotoConfig;
use crate::rng::{seeded_stream, PARAM_STREAM};

/// Golden ratio, to the precision used throughout the criteria.
pub const PHI: f64 = 1.618;
pub const EPSILON: f64 = 0.05;
pub const OMEGA: f64 = 0.1;
pub const DEFAULT_DT: f64 = 0.05;
pub const DEFAULT_LAMBDA: f64 = 1.0;

pub const ALPHA: f64 = 0.1;
pub const K_SIGMOID: f64 = 2.0;
pub const X0_SIGMOID: f64 = 0.5;
pub const W_COUPLING: f64 = 0.01;

const A0_RANGE: (f64, f64) = (0.5, 1.2);
const F0_RANGE: (f64, f64) = (0.1, 1.5);
const BETA_RANGE: (f64, f64) = (0.05, 0.15);

/// Kuramoto baseline coupling strength.
pub const KURAMOTO_K: f64 = 0.5;
pub const KURAMOTO_DT: f64 = 0.1;
pub const KURAMOTO_T: f64 = 20.0;
pub const KURAMOTO_SEED: u64 = 123;

/// Default FPS configuration for `n` strates over `t` seconds.
pub fn default_config(n: usize, t: f64, seed: u64) -> SystemConfig {
    let mut rng = seeded_stream(seed, PARAM_STREAM);
    let mut uniform = |(lo, hi): (f64, f64)| -> Vec<f64> {
        (0..n).map(|_| rng.gen_range(lo..hi)).collect()
    };
    let a0 = uniform(A0_RANGE);
    let f0 = uniform(F0_RANGE);
    let beta = uniform(BETA_RANGE);

    SystemConfig {
        system: SystemSection {
            n,
            t,
            dt: DEFAULT_DT,
            seed,
        },
        spiral: SpiralParams {
            phi: PHI,
            epsilon: EPSILON,
            omega: OMEGA,
            theta: 0.0,
        },
        strates: StrateParams {
            a0,
            f0,
            alpha: vec![ALPHA; n],
            beta,
            k: vec![K_SIGMOID; n],
            x0: vec![X0_SIGMOID; n],
            w: vec![W_COUPLING; n],
        },
        lambda_feedback: DEFAULT_LAMBDA,
    }
}

/// Reference run: N = 5, T = 20, seed = 42 (used with the constant scenario).
pub fn golden_run_config() -> SystemConfig {
    default_config(5, 20.0, 42)
}

/// Kuramoto control: K = 0.5, ω_i ~ U[0, 1), dt = 0.1, T = 20.
pub fn kuramoto_config(n: usize, seed: u64) -> KuramotoConfig {
    let mut rng = seeded_stream(seed, PARAM_STREAM);
    let omega = (0..n).map(|_| rng.gen::<f64>()).collect();
    KuramotoConfig {
        n,
        k: KURAMOTO_K,
        omega,
        dt: KURAMOTO_DT,
        t: KURAMOTO_T,
        seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let cfg = default_config(20, 20.0, 42);
        cfg.validate().unwrap();
        assert_eq!(cfg.t_steps(), 400);
    }

    #[test]
    fn test_default_ranges() {
        let cfg = default_config(50, 1.0, 9);
        assert!(cfg.strates.a0.iter().all(|&a| (0.5..1.2).contains(&a)));
        assert!(cfg.strates.f0.iter().all(|&f| (0.1..1.5).contains(&f)));
        assert!(cfg.strates.beta.iter().all(|&b| (0.05..0.15).contains(&b)));
    }

    #[test]
    fn test_default_config_deterministic() {
        assert_eq!(default_config(5, 20.0, 42), default_config(5, 20.0, 42));
        assert_ne!(
            default_config(5, 20.0, 42).strates.a0,
            default_config(5, 20.0, 43).strates.a0
        );
    }

    #[test]
    fn test_golden_run_shape() {
        let cfg = golden_run_config();
        assert_eq!(cfg.n(), 5);
        assert_eq!(cfg.seed(), 42);
        assert_eq!(cfg.t_steps(), 400);
    }

    #[test]
    fn test_kuramoto_config() {
        let cfg = kuramoto_config(20, KURAMOTO_SEED);
        assert_eq!(cfg.omega.len(), 20);
        assert!(cfg.omega.iter().all(|&w| (0.0..1.0).contains(&w)));
        assert_eq!(cfg.k, 0.5);
    }
}
