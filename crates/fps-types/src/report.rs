// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Validation Report Types
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use serde::{Deserialize, Serialize};

/// Replace a non-finite value with `fallback`.
///
/// Reports never carry NaN or ±Inf; sentinel values raised inside a
/// criterion are collapsed here before they leave the engine.
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        return value;
    }
    log::warn!("finite_or: non-finite value {value} replaced by {fallback:.4}");
    fallback
}

/// The seven acceptance criteria, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Fluidity,
    Stability,
    Resilience,
    Innovation,
    Regulation,
    SpiralRatio,
    CpuEfficiency,
}

impl Criterion {
    pub const ALL: [Criterion; 7] = [
        Criterion::Fluidity,
        Criterion::Stability,
        Criterion::Resilience,
        Criterion::Innovation,
        Criterion::Regulation,
        Criterion::SpiralRatio,
        Criterion::CpuEfficiency,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Criterion::Fluidity => "fluidity",
            Criterion::Stability => "stability",
            Criterion::Resilience => "resilience",
            Criterion::Innovation => "innovation",
            Criterion::Regulation => "regulation",
            Criterion::SpiralRatio => "spiral_ratio",
            Criterion::CpuEfficiency => "cpu_efficiency",
        }
    }

    /// The pass condition as stated in the report.
    pub fn condition(self) -> &'static str {
        match self {
            Criterion::Fluidity => "variance_d²S < 0.01",
            Criterion::Stability => "max(S)/median(S) < 10 on ≥ 95% of steps",
            Criterion::Resilience => "t_return < 2×median(T) after any shock",
            Criterion::Innovation => "entropy_S > 0.5 on ≥ 70% of steps",
            Criterion::Regulation => "rolling mean |E-O| < 2×median after T/2",
            Criterion::SpiralRatio => "mean |r(t) - φ| < 0.1",
            Criterion::CpuEfficiency => "mean(cpu_step) < 2× Kuramoto control",
        }
    }

    pub fn rationale(self) -> &'static str {
        match self {
            Criterion::Fluidity => "Avoid jerky dynamics - organism twitching not breathing",
            Criterion::Stability => "No blow-ups allowed",
            Criterion::Resilience => "Bounces back fast",
            Criterion::Innovation => "Rich dynamics - not over-fitted controller",
            Criterion::Regulation => "Environment-Output regulation",
            Criterion::SpiralRatio => "Golden-ratio convergence for minimal beat patterns",
            Criterion::CpuEfficiency => "Efficiency claim",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: Criterion,
    /// Measured statistic (fraction, variance, seconds, ...).
    pub value: f64,
    pub passed: bool,
    pub threshold: f64,
    /// True when the criterion passed for lack of data.
    pub abstained: bool,
    /// Secondary statistic: max ratio, mean entropy, ...
    pub auxiliary: Option<(String, f64)>,
}

impl CriterionResult {
    pub fn measured(criterion: Criterion, value: f64, passed: bool, threshold: f64) -> Self {
        Self {
            criterion,
            value: finite_or(value, 0.0),
            passed,
            threshold: finite_or(threshold, 0.0),
            abstained: false,
            auxiliary: None,
        }
    }

    /// Vacuous pass: required evidence absent.
    pub fn abstain(criterion: Criterion, value: f64, threshold: f64) -> Self {
        Self {
            abstained: true,
            ..Self::measured(criterion, value, true, threshold)
        }
    }

    /// Attach a secondary statistic; dropped when not finite.
    pub fn with_auxiliary(mut self, name: &str, value: f64) -> Self {
        if value.is_finite() {
            self.auxiliary = Some((name.to_string(), value));
        }
        self
    }
}

/// One row of the failure log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
    pub condition: String,
    pub rationale: String,
}

impl From<&CriterionResult> for FailureRecord {
    fn from(result: &CriterionResult) -> Self {
        Self {
            metric: result.criterion.name().to_string(),
            value: result.value,
            threshold: result.threshold,
            condition: result.criterion.condition().to_string(),
            rationale: result.criterion.rationale().to_string(),
        }
    }
}

/// Aggregate counts of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub passed: usize,
    pub total: usize,
    pub pass_rate: f64,
    pub failed_metrics: Vec<String>,
}

impl ValidationSummary {
    pub fn from_results(results: &[CriterionResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let total = results.len();
        Self {
            passed,
            total,
            pass_rate: if total == 0 {
                0.0
            } else {
                passed as f64 / total as f64
            },
            failed_metrics: results
                .iter()
                .filter(|r| !r.passed)
                .map(|r| r.criterion.name().to_string())
                .collect(),
        }
    }
}

/// Immutable snapshot of the seven criteria for one trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub metrics: Vec<CriterionResult>,
    pub all_passed: bool,
    pub failures: Vec<FailureRecord>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    pub fn from_results(metrics: Vec<CriterionResult>) -> Self {
        let failures = metrics
            .iter()
            .filter(|r| !r.passed)
            .map(FailureRecord::from)
            .collect();
        let summary = ValidationSummary::from_results(&metrics);
        Self {
            all_passed: metrics.iter().all(|r| r.passed),
            metrics,
            failures,
            summary,
        }
    }

    pub fn get(&self, criterion: Criterion) -> Option<&CriterionResult> {
        self.metrics.iter().find(|r| r.criterion == criterion)
    }
}
