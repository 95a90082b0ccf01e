// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Simulation loop, seven-criterion validation engine, companion strata
//! runs and the run service.
//!
//! # Invariants
//!
//! 1. **Determinism**: identical (config, scenario, extended flag) give
//!    bit-identical S, C and r. Phase offsets are drawn once per engine
//!    and extended-mode noise is re-seeded on every run.
//!
//! 2. **Finite reports**: every value, threshold and auxiliary statistic
//!    in a [`fps_types::ValidationReport`] is finite. Degenerate windows
//!    fall back to documented sentinels before they reach the report.
//!
//! 3. **Abstention is explicit**: resilience, regulation and
//!    cpu_efficiency pass vacuously without their evidence and carry
//!    `abstained = true`.

pub mod companion;
pub mod persist;
pub mod service;
pub mod simulation;
pub mod validation;

pub use companion::{CompanionLog, CompanionRow, CompanionSimulation, NoiseKind, RunConfig};
pub use service::{PlotSeries, RunReceipt, RunService};
pub use simulation::{kernel_profile, run_simulation, FpsEngine};
pub use validation::{
    assert_all_criteria, run_all_validations, save_failures_log, FpsValidator,
    DEFAULT_FAILURES_LOG,
};
