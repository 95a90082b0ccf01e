// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Physics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! FPS governing equations, input scenarios, canonical parameters, the
//! Kuramoto comparison baseline, the companion strata model and the
//! series statistics shared with the validation engine.

pub mod kuramoto;
pub mod params;
pub mod rng;
pub mod scenario;
pub mod signal;
pub mod stats;
pub mod strata;

pub use kuramoto::{
    order_parameter, run_kuramoto_control, KuramotoConfig, KuramotoModel, KuramotoRun,
    KuramotoState, SyncMetrics,
};
pub use params::{default_config, golden_run_config, kuramoto_config, PHI};
pub use signal::{
    coherence, sigmoid, spiral_feedback, spiral_ratio, strate_kernel, PhaseAssignment,
    SignalEngine,
};
pub use strata::{effort, phase_coherence, FeedbackKind, StrataDefaults, Stratum};
