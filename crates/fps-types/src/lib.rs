// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Configuration, error hierarchy, trajectory record and validation
//! report types shared by the FPS engine, validator and front ends.

pub mod config;
pub mod error;
pub mod report;
pub mod trajectory;

pub use config::{SpiralParams, StrateParams, SystemConfig, SystemSection, STRATE_VECTOR_NAMES};
pub use error::{FpsError, FpsResult};
pub use report::{
    finite_or, Criterion, CriterionResult, FailureRecord, ValidationReport, ValidationSummary,
};
pub use trajectory::{PerturbationEvent, Scenario, Trajectory};
