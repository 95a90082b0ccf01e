// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Validation Engine
// ─────────────────────────────────────────────────────────────────────
//! Seven acceptance criteria over a [`Trajectory`]:
//!
//!   fluidity        var(d²S) < 0.01
//!   stability       max/median < 10 on ≥ 95% of rolling windows
//!   resilience      return time < 2·median(time) after every shock
//!   innovation      window entropy > 0.5 on ≥ 70% of rolling windows
//!   regulation      rolling mean |E - O| < 2·median over the second half
//!   spiral_ratio    mean |r - φ| < 0.1
//!   cpu_efficiency  mean step cost < 2 × baseline
//!
//! Resilience, regulation and cpu_efficiency abstain (pass vacuously)
//! when their evidence is absent. Reports never carry non-finite values.

use std::path::Path;

use fps_types::{
    Criterion, CriterionResult, FpsError, FpsResult, PerturbationEvent, Trajectory,
    ValidationReport,
};

use fps_physics::stats::{
    gradient, histogram_entropy, max, mean, median, nearest_index, std_dev, variance,
};

use crate::persist::{render_csv, write_text};

pub const FLUIDITY_THRESHOLD: f64 = 0.01;
pub const STABILITY_RATIO_LIMIT: f64 = 10.0;
pub const STABILITY_MIN_FRACTION: f64 = 0.95;
pub const INNOVATION_ENTROPY_FLOOR: f64 = 0.5;
pub const INNOVATION_MIN_FRACTION: f64 = 0.70;
pub const ENTROPY_BINS: usize = 20;
pub const ENTROPY_SMOOTHING: f64 = 1e-10;
pub const SPIRAL_DEVIATION_LIMIT: f64 = 0.1;
/// Return tolerance as a fraction of the pre-shock std.
pub const RESILIENCE_TOLERANCE_FACTOR: f64 = 0.1;
/// Tolerance used without usable pre-shock history.
pub const RESILIENCE_FALLBACK_TOLERANCE: f64 = 0.1;
pub const REGULATION_FALLBACK_THRESHOLD: f64 = 2.0;

/// Default path of the failure table written by the strict entry point.
pub const DEFAULT_FAILURES_LOG: &str = "criteria_failures.csv";

const FAILURE_COLUMNS: [&str; 5] = ["metric", "value", "threshold", "condition", "rationale"];

/// Evaluates the criteria over one immutable trajectory.
pub struct FpsValidator<'a> {
    trajectory: &'a Trajectory,
}

impl<'a> FpsValidator<'a> {
    pub fn new(trajectory: &'a Trajectory) -> Self {
        Self { trajectory }
    }

    pub fn fluidity(&self) -> CriterionResult {
        let d2s = gradient(&gradient(&self.trajectory.s));
        let var = variance(&d2s);
        CriterionResult::measured(
            Criterion::Fluidity,
            var,
            var < FLUIDITY_THRESHOLD,
            FLUIDITY_THRESHOLD,
        )
    }

    pub fn stability(&self) -> CriterionResult {
        let s = &self.trajectory.s;
        let w = (s.len() / 20).max(1);
        let mut ratios = Vec::new();
        for i in w..s.len() {
            let window = &s[i - w..=i];
            match (median(window), max(window)) {
                (Some(med), Some(peak)) if med != 0.0 => ratios.push(peak / med),
                _ => {}
            }
        }
        if ratios.is_empty() {
            ratios.push(f64::INFINITY);
        }

        let stable = ratios.iter().filter(|&&r| r < STABILITY_RATIO_LIMIT).count();
        let fraction = stable as f64 / ratios.len() as f64;
        let max_ratio = max(&ratios).unwrap_or(f64::INFINITY);
        CriterionResult::measured(
            Criterion::Stability,
            fraction,
            fraction >= STABILITY_MIN_FRACTION,
            STABILITY_MIN_FRACTION,
        )
        .with_auxiliary("max_ratio", max_ratio)
    }

    pub fn resilience(&self, perturbation_log: Option<&[PerturbationEvent]>) -> CriterionResult {
        let Some(events) = perturbation_log else {
            return CriterionResult::abstain(Criterion::Resilience, 0.0, 0.0);
        };
        let time = &self.trajectory.time;
        let s = &self.trajectory.s;
        let threshold = 2.0 * median(time).unwrap_or(0.0);

        let mut return_times = Vec::new();
        for event in events {
            let Some(idx) = nearest_index(time, event.time) else {
                continue;
            };
            let Some(&first) = s.first() else {
                continue;
            };
            let history = &s[..idx];
            let baseline = if history.is_empty() { first } else { mean(history) };
            let tolerance = match std_dev(history) {
                sd if !history.is_empty() && sd.is_finite() && sd > 0.0 => {
                    RESILIENCE_TOLERANCE_FACTOR * sd
                }
                _ => RESILIENCE_FALLBACK_TOLERANCE,
            };
            if let Some(i) = (idx + 1..s.len()).find(|&i| (s[i] - baseline).abs() < tolerance) {
                return_times.push(time[i] - event.time);
            }
        }

        match max(&return_times) {
            None => CriterionResult::abstain(Criterion::Resilience, 0.0, threshold),
            Some(worst) => {
                CriterionResult::measured(Criterion::Resilience, worst, worst < threshold, threshold)
            }
        }
    }

    pub fn innovation(&self) -> CriterionResult {
        let s = &self.trajectory.s;
        let w = (s.len() / 50).max(10);
        let entropies: Vec<f64> = (w..s.len())
            .map(|i| histogram_entropy(&s[i - w..=i], ENTROPY_BINS, ENTROPY_SMOOTHING))
            .collect();
        if entropies.is_empty() {
            log::warn!("innovation: series of {} samples has no full window", s.len());
            return CriterionResult::measured(
                Criterion::Innovation,
                0.0,
                false,
                INNOVATION_MIN_FRACTION,
            );
        }

        let rich = entropies
            .iter()
            .filter(|&&h| h > INNOVATION_ENTROPY_FLOOR)
            .count();
        let fraction = rich as f64 / entropies.len() as f64;
        CriterionResult::measured(
            Criterion::Innovation,
            fraction,
            fraction >= INNOVATION_MIN_FRACTION,
            INNOVATION_MIN_FRACTION,
        )
        .with_auxiliary("mean_entropy", mean(&entropies))
    }

    pub fn regulation(&self) -> CriterionResult {
        let Some((e, o)) = self.trajectory.environment_output() else {
            return CriterionResult::abstain(Criterion::Regulation, 0.0, 0.0);
        };
        let half = self.trajectory.t_steps() / 2;
        let diff: Vec<Vec<f64>> = e
            .iter()
            .zip(o)
            .skip(half)
            .map(|(er, or)| er.iter().zip(or).map(|(a, b)| (a - b).abs()).collect())
            .collect();

        let w = (diff.len() / 10).max(10);
        let rolling: Vec<f64> = (w..diff.len())
            .map(|i| {
                let cells: Vec<f64> = diff[i - w..=i].iter().flatten().copied().collect();
                mean(&cells)
            })
            .collect();

        let (Some(med), Some(peak)) = (median(&rolling), max(&rolling)) else {
            return CriterionResult::abstain(Criterion::Regulation, 0.0, 0.0);
        };
        let threshold = if med > 0.0 {
            2.0 * med
        } else {
            REGULATION_FALLBACK_THRESHOLD
        };
        CriterionResult::measured(Criterion::Regulation, peak, peak < threshold, threshold)
    }

    pub fn spiral_ratio(&self) -> CriterionResult {
        let phi = self.trajectory.config.spiral.phi;
        let deviations: Vec<f64> = self.trajectory.r.iter().map(|r| (r - phi).abs()).collect();
        let dev = mean(&deviations);
        CriterionResult::measured(
            Criterion::SpiralRatio,
            dev,
            dev < SPIRAL_DEVIATION_LIMIT,
            SPIRAL_DEVIATION_LIMIT,
        )
    }

    pub fn cpu_efficiency(&self, baseline_cpu_time: Option<f64>) -> CriterionResult {
        let cost = self.trajectory.mean_step_cost();
        match baseline_cpu_time {
            None => CriterionResult::abstain(Criterion::CpuEfficiency, cost, 0.0),
            Some(baseline) => {
                let threshold = 2.0 * baseline;
                CriterionResult::measured(Criterion::CpuEfficiency, cost, cost < threshold, threshold)
            }
        }
    }

    /// Evaluate all seven criteria in report order.
    pub fn run_all(
        &self,
        perturbation_log: Option<&[PerturbationEvent]>,
        baseline_cpu_time: Option<f64>,
    ) -> ValidationReport {
        let metrics = vec![
            self.fluidity(),
            self.stability(),
            self.resilience(perturbation_log),
            self.innovation(),
            self.regulation(),
            self.spiral_ratio(),
            self.cpu_efficiency(baseline_cpu_time),
        ];
        for m in &metrics {
            if m.passed {
                log::debug!(
                    "{}: value={:.6} threshold={:.6} passed{}",
                    m.criterion,
                    m.value,
                    m.threshold,
                    if m.abstained { " (abstained)" } else { "" }
                );
            } else {
                log::warn!(
                    "{}: value={:.6} threshold={:.6} FAILED",
                    m.criterion,
                    m.value,
                    m.threshold
                );
            }
        }
        let report = ValidationReport::from_results(metrics);
        log::info!(
            "validation: {}/{} criteria passed",
            report.summary.passed,
            report.summary.total
        );
        report
    }
}

/// Write the failure table of `report` as CSV. Returns `false` and writes
/// nothing when there are no failures.
pub fn save_failures_log(report: &ValidationReport, path: impl AsRef<Path>) -> FpsResult<bool> {
    if report.failures.is_empty() {
        log::info!("no criteria failures to log");
        return Ok(false);
    }
    let rows = report.failures.iter().map(|f| {
        vec![
            f.metric.clone(),
            f.value.to_string(),
            f.threshold.to_string(),
            f.condition.clone(),
            f.rationale.clone(),
        ]
    });
    write_text(path.as_ref(), &render_csv(&FAILURE_COLUMNS, rows))?;
    log::info!("criteria failures logged to {}", path.as_ref().display());
    Ok(true)
}

/// Evaluate all criteria of `trajectory`.
pub fn run_all_validations(
    trajectory: &Trajectory,
    perturbation_log: Option<&[PerturbationEvent]>,
    baseline_cpu_time: Option<f64>,
) -> ValidationReport {
    FpsValidator::new(trajectory).run_all(perturbation_log, baseline_cpu_time)
}

/// Strict variant: any failure writes the failure table to
/// `failures_log` and is returned as [`FpsError::Validation`].
pub fn assert_all_criteria(
    trajectory: &Trajectory,
    perturbation_log: Option<&[PerturbationEvent]>,
    baseline_cpu_time: Option<f64>,
    failures_log: impl AsRef<Path>,
) -> FpsResult<ValidationReport> {
    let report = run_all_validations(trajectory, perturbation_log, baseline_cpu_time);
    if report.all_passed {
        return Ok(report);
    }
    save_failures_log(&report, failures_log.as_ref())?;
    Err(FpsError::Validation {
        failed: report.summary.failed_metrics.clone(),
        pass_rate: report.summary.pass_rate,
        log_path: failures_log.as_ref().display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::parse_numeric_csv;
    use fps_physics::default_config;
    use fps_types::Scenario;

    fn trajectory(s: Vec<f64>) -> Trajectory {
        let n = s.len();
        let dt = 0.05;
        let cfg = default_config(1, n as f64 * dt, 0);
        Trajectory {
            time: (0..n).map(|i| i as f64 * dt).collect(),
            c: vec![1.0; n],
            r: vec![cfg.spiral.phi; n],
            a: vec![vec![1.0]; n],
            f: vec![vec![1.0]; n],
            gamma: None,
            e: None,
            o: None,
            cpu_times: vec![1e-5; n],
            total_time: n as f64 * 1e-5,
            scenario: Scenario::Constant,
            extended: false,
            config: cfg,
            s,
        }
    }

    #[test]
    fn test_stability_constant_series() {
        let t = trajectory(vec![1.0; 20]);
        let r = FpsValidator::new(&t).stability();
        assert!(r.passed);
        assert_eq!(r.value, 1.0);
        assert_eq!(r.auxiliary, Some(("max_ratio".to_string(), 1.0)));
    }

    #[test]
    fn test_stability_all_zero_medians_fails_without_infinity() {
        let t = trajectory(vec![0.0; 40]);
        let r = FpsValidator::new(&t).stability();
        assert!(!r.passed);
        assert_eq!(r.value, 0.0);
        assert!(r.auxiliary.is_none());
    }

    #[test]
    fn test_fluidity_smooth_vs_jerky() {
        let smooth: Vec<f64> = (0..200).map(|i| (i as f64 * 0.05).sin()).collect();
        assert!(FpsValidator::new(&trajectory(smooth)).fluidity().passed);

        let jerky: Vec<f64> = (0..200).map(|i| ((i * 41) % 101) as f64 / 10.0).collect();
        let r = FpsValidator::new(&trajectory(jerky)).fluidity();
        assert!(!r.passed);
        assert!(r.value > FLUIDITY_THRESHOLD);
    }

    #[test]
    fn test_fluidity_single_sample_passes() {
        let r = FpsValidator::new(&trajectory(vec![0.4])).fluidity();
        assert!(r.passed);
        assert_eq!(r.value, 0.0);
    }

    #[test]
    fn test_innovation_too_short_fails() {
        let r = FpsValidator::new(&trajectory(vec![0.1; 10])).innovation();
        assert!(!r.passed);
        assert_eq!(r.value, 0.0);
    }

    #[test]
    fn test_innovation_constant_series_fails() {
        let r = FpsValidator::new(&trajectory(vec![0.5; 100])).innovation();
        assert!(!r.passed);
        assert_eq!(r.value, 0.0);
    }

    #[test]
    fn test_innovation_rich_series_passes() {
        let s: Vec<f64> = (0..300).map(|i| ((i * 7919) % 101) as f64 / 101.0).collect();
        let r = FpsValidator::new(&trajectory(s)).innovation();
        assert!(r.passed, "fraction={}", r.value);
        assert!(r.auxiliary.is_some());
    }

    #[test]
    fn test_resilience_abstains_without_log() {
        let r = FpsValidator::new(&trajectory(vec![1.0; 50])).resilience(None);
        assert!(r.passed && r.abstained);
        assert_eq!(r.value, 0.0);
    }

    #[test]
    fn test_resilience_measures_return_time() {
        // flat at 1.0, shock at t = 1.0 (idx 20), back to baseline at idx 25
        let mut s = vec![1.0; 60];
        for v in &mut s[20..25] {
            *v = 3.0;
        }
        let t = trajectory(s);
        let log = [PerturbationEvent { time: 1.0 }];
        let r = FpsValidator::new(&t).resilience(Some(&log));
        assert!(!r.abstained);
        assert!((r.value - 0.25).abs() < 1e-9, "return={}", r.value);
        assert!(r.passed);
    }

    #[test]
    fn test_resilience_no_return_abstains() {
        let mut s = vec![1.0; 40];
        for v in &mut s[10..] {
            *v = 5.0;
        }
        let t = trajectory(s);
        let log = [PerturbationEvent { time: 0.5 }];
        let r = FpsValidator::new(&t).resilience(Some(&log));
        assert!(r.passed && r.abstained);
    }

    #[test]
    fn test_resilience_slow_return_fails_and_is_logged() {
        // dense samples up to t = 0.39, then one per second from t = 10:
        // median(time) = 0.295, so the limit is 0.59
        let mut s = vec![1.0; 60];
        for v in &mut s[11..45] {
            *v = 4.0;
        }
        let mut t = trajectory(s);
        t.time = (0..60)
            .map(|i| if i < 40 { i as f64 * 0.01 } else { 10.0 + (i - 40) as f64 })
            .collect();
        let log = [PerturbationEvent { time: 0.1 }];

        let r = FpsValidator::new(&t).resilience(Some(&log));
        assert!(!r.passed && !r.abstained);
        assert!((r.threshold - 0.59).abs() < 1e-12, "threshold={}", r.threshold);
        // back at baseline at index 45, t = 15
        assert!((r.value - 14.9).abs() < 1e-9, "return={}", r.value);

        let report = run_all_validations(&t, Some(&log), None);
        let record = report.failures.iter().find(|f| f.metric == "resilience").unwrap();
        assert_eq!(record.condition, Criterion::Resilience.condition());
        assert!(report.summary.failed_metrics.contains(&"resilience".to_string()));
    }

    #[test]
    fn test_resilience_shock_at_start_uses_first_sample() {
        // no history before the shock: baseline S[0], tolerance 0.1
        let mut s = vec![1.0; 60];
        for v in &mut s[1..5] {
            *v = 1.5;
        }
        s[5] = 1.05;
        let t = trajectory(s);
        let log = [PerturbationEvent { time: 0.0 }];
        let r = FpsValidator::new(&t).resilience(Some(&log));
        assert!(r.passed && !r.abstained);
        assert!((r.value - 0.25).abs() < 1e-9, "return={}", r.value);
    }

    #[test]
    fn test_regulation_abstains_without_environment() {
        let r = FpsValidator::new(&trajectory(vec![0.0; 100])).regulation();
        assert!(r.passed && r.abstained);
    }

    #[test]
    fn test_regulation_steady_difference_passes() {
        let mut t = trajectory(vec![0.0; 100]);
        t.e = Some(vec![vec![0.2]; 100]);
        t.o = Some(vec![vec![0.1]; 100]);
        let r = FpsValidator::new(&t).regulation();
        assert!(r.passed && !r.abstained);
        assert!((r.threshold - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_regulation_late_spike_fails() {
        let mut t = trajectory(vec![0.0; 100]);
        let mut e = vec![vec![0.2]; 100];
        for row in &mut e[95..] {
            row[0] = 5.0;
        }
        t.e = Some(e);
        t.o = Some(vec![vec![0.1]; 100]);

        let r = FpsValidator::new(&t).regulation();
        assert!(!r.passed && !r.abstained);
        // 35 of 40 rolling windows sit at |E - O| = 0.1
        assert!((r.threshold - 0.2).abs() < 1e-9, "threshold={}", r.threshold);
        // last window: 5 spiked cells of 4.9 among 11
        assert!((r.value - (5.0 * 4.9 + 6.0 * 0.1) / 11.0).abs() < 1e-9, "peak={}", r.value);

        let report = run_all_validations(&t, None, None);
        assert!(report.summary.failed_metrics.contains(&"regulation".to_string()));
    }

    #[test]
    fn test_regulation_zero_difference_uses_fallback_threshold() {
        let mut t = trajectory(vec![0.0; 100]);
        t.e = Some(vec![vec![0.3]; 100]);
        t.o = Some(vec![vec![0.3]; 100]);
        let r = FpsValidator::new(&t).regulation();
        assert!(r.passed);
        assert_eq!(r.threshold, REGULATION_FALLBACK_THRESHOLD);
    }

    #[test]
    fn test_spiral_ratio_uses_configured_phi() {
        let mut t = trajectory(vec![0.0; 10]);
        t.r = vec![t.config.spiral.phi + 0.2; 10];
        let r = FpsValidator::new(&t).spiral_ratio();
        assert!(!r.passed);
        assert!((r.value - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_cpu_efficiency() {
        let t = trajectory(vec![0.0; 10]);
        let v = FpsValidator::new(&t);
        let none = v.cpu_efficiency(None);
        assert!(none.passed && none.abstained);
        assert!((none.value - 1e-5).abs() < 1e-15);
        assert!(v.cpu_efficiency(Some(1e-5)).passed);
        assert!(!v.cpu_efficiency(Some(1e-6)).passed);
    }

    #[test]
    fn test_report_has_seven_metrics_in_order() {
        let t = trajectory(vec![1.0; 20]);
        let report = run_all_validations(&t, None, None);
        let order: Vec<Criterion> = report.metrics.iter().map(|m| m.criterion).collect();
        assert_eq!(order, Criterion::ALL.to_vec());
        assert!(report.metrics.iter().all(|m| m.value.is_finite()));
    }

    #[test]
    fn test_save_failures_log_skips_when_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.csv");
        let report = ValidationReport::from_results(vec![]);
        assert!(!save_failures_log(&report, &path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_assert_all_criteria_writes_log_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("criteria_failures.csv");
        // constant series: innovation fails
        let t = trajectory(vec![1.0; 100]);
        let err = assert_all_criteria(&t, None, None, &path).unwrap_err();
        match err {
            FpsError::Validation { failed, pass_rate, log_path } => {
                assert!(failed.contains(&"innovation".to_string()));
                assert!(pass_rate < 1.0);
                assert_eq!(log_path, path.display().to_string());
            }
            other => panic!("unexpected error {other:?}"),
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("metric,value,threshold,condition,rationale\n"));
        assert!(text.contains("innovation"));
        // not a numeric table
        assert!(parse_numeric_csv(&text).is_err());
    }
}
