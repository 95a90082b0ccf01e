// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Run Service
// ─────────────────────────────────────────────────────────────────────
//! Request-level facade over companion runs: `run` executes and
//! persists, `plot` returns the logged coherence series.
//!
//! Plotted series are cached per run name; re-running a name drops its
//! cache entry. Each name carries a generation bumped by every `run`, and
//! a series read under an older generation is returned but never cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use fps_types::{FpsError, FpsResult};

use crate::companion::{append_seed, CompanionSimulation, RunConfig};
use crate::persist::parse_numeric_csv;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReceipt {
    pub status: String,
    pub run_name: String,
}

/// Coherence series read back from a persisted log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub t: Vec<f64>,
    #[serde(rename = "C")]
    pub c: Vec<f64>,
}

#[derive(Debug, Default)]
struct PlotCache {
    series: HashMap<String, PlotSeries>,
    generations: HashMap<String, u64>,
}

impl PlotCache {
    fn generation(&self, run_name: &str) -> u64 {
        self.generations.get(run_name).copied().unwrap_or(0)
    }

    fn invalidate(&mut self, run_name: &str) {
        self.series.remove(run_name);
        *self.generations.entry(run_name.to_string()).or_insert(0) += 1;
    }

    /// Insert `series` if no run of `run_name` finished since `generation`.
    fn store(&mut self, run_name: &str, generation: u64, series: PlotSeries) -> bool {
        if self.generation(run_name) != generation {
            return false;
        }
        self.series.insert(run_name.to_string(), series);
        true
    }
}

pub struct RunService {
    log_dir: PathBuf,
    seed_ledger: PathBuf,
    cache: Mutex<PlotCache>,
}

impl RunService {
    pub fn new(log_dir: impl Into<PathBuf>, seed_ledger: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            seed_ledger: seed_ledger.into(),
            cache: Mutex::new(PlotCache::default()),
        }
    }

    /// `<data_dir>/logs` for run logs, `<data_dir>/seeds.txt` for seeds.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self::new(data_dir.join("logs"), data_dir.join("seeds.txt"))
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log_path(&self, run_name: &str) -> PathBuf {
        self.log_dir.join(format!("{run_name}.csv"))
    }

    pub fn run(&self, config: RunConfig) -> FpsResult<RunReceipt> {
        let mut sim = CompanionSimulation::new(config)?;
        append_seed(&self.seed_ledger, sim.config())?;
        let log = sim.run();
        log.persist(&self.log_dir)?;
        self.cache.lock().invalidate(&log.run_name);
        Ok(RunReceipt {
            status: "ok".to_string(),
            run_name: log.run_name,
        })
    }

    pub fn plot(&self, run_name: &str) -> FpsResult<PlotSeries> {
        let generation = {
            let cache = self.cache.lock();
            if let Some(hit) = cache.series.get(run_name) {
                return Ok(hit.clone());
            }
            cache.generation(run_name)
        };
        let series = self.read_series(run_name)?;
        log::debug!("plot {run_name}: {} points", series.t.len());
        if !self.cache.lock().store(run_name, generation, series.clone()) {
            log::debug!("plot {run_name}: re-run while reading, not cached");
        }
        Ok(series)
    }

    fn read_series(&self, run_name: &str) -> FpsResult<PlotSeries> {
        let path = self.log_path(run_name);
        if !path.is_file() {
            return Err(FpsError::LogNotFound(run_name.to_string()));
        }
        let table = parse_numeric_csv(&std::fs::read_to_string(&path)?)?;
        let missing = |col: &str| {
            FpsError::Serialization(format!("{} has no {col} column", path.display()))
        };
        Ok(PlotSeries {
            t: table.column("t").ok_or_else(|| missing("t"))?,
            c: table.column("C").ok_or_else(|| missing("C"))?,
        })
    }

    pub fn cached_runs(&self) -> usize {
        self.cache.lock().series.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, seed: u64, scale: f64) -> RunConfig {
        let mut cfg = RunConfig {
            run_name: name.to_string(),
            seed: Some(seed),
            n_strata: 4,
            ..RunConfig::default()
        };
        cfg.noise.scale = scale;
        cfg
    }

    #[test]
    fn test_run_then_plot() {
        let dir = tempfile::tempdir().unwrap();
        let svc = RunService::with_data_dir(dir.path());
        let receipt = svc.run(config("alpha", 1, 0.3)).unwrap();
        assert_eq!(receipt.status, "ok");
        assert_eq!(receipt.run_name, "alpha");

        let series = svc.plot("alpha").unwrap();
        assert_eq!(series.t.len(), 10);
        assert_eq!(series.t.len(), series.c.len());
        assert_eq!(svc.cached_runs(), 1);
        assert!(dir.path().join("seeds.txt").is_file());
    }

    #[test]
    fn test_plot_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        let svc = RunService::with_data_dir(dir.path());
        let err = svc.plot("nope").unwrap_err();
        assert!(matches!(err, FpsError::LogNotFound(ref n) if n == "nope"));
    }

    #[test]
    fn test_rerun_invalidates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let svc = RunService::with_data_dir(dir.path());
        svc.run(config("beta", 1, 0.0)).unwrap();
        let first = svc.plot("beta").unwrap();
        assert_eq!(svc.cached_runs(), 1);

        let mut longer = config("beta", 2, 0.0);
        longer.t = 2.0;
        svc.run(longer).unwrap();
        assert_eq!(svc.cached_runs(), 0);
        let second = svc.plot("beta").unwrap();
        assert_eq!(second.t.len(), 2 * first.t.len());
    }

    #[test]
    fn test_series_read_before_rerun_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let svc = RunService::with_data_dir(dir.path());
        svc.run(config("delta", 1, 0.2)).unwrap();

        // plot reads the old log, then a re-run finishes before it caches
        let seen = svc.cache.lock().generation("delta");
        let stale = svc.read_series("delta").unwrap();
        let mut longer = config("delta", 2, 0.2);
        longer.t = 2.0;
        svc.run(longer).unwrap();

        assert!(!svc.cache.lock().store("delta", seen, stale.clone()));
        assert_eq!(svc.cached_runs(), 0);
        assert_eq!(svc.cache.lock().generation("delta"), seen + 1);
        let fresh = svc.plot("delta").unwrap();
        assert_eq!(fresh.t.len(), 2 * stale.t.len());
        assert_eq!(svc.cached_runs(), 1);
    }

    #[test]
    fn test_invalid_config_leaves_no_log() {
        let dir = tempfile::tempdir().unwrap();
        let svc = RunService::with_data_dir(dir.path());
        let mut cfg = config("gamma", 1, 0.1);
        cfg.dt = 0.0;
        assert!(matches!(svc.run(cfg), Err(FpsError::Config(_))));
        assert!(!svc.log_path("gamma").exists());
    }
}
