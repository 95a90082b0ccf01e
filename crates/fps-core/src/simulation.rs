// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Simulation Loop
// ─────────────────────────────────────────────────────────────────────
//! Fixed-step integration of the FPS equations.
//!
//! Per step t_k:
//!   1. I_n(t_k) from the scenario
//!   2. A_n = A0_n σ(I_n)
//!   3. f_n from A_n and the previous step's f (f0 at k = 0)
//!   4. r(t_k), then S(t_k) (canonical or extended)
//!   5. C(t_k) = exp(-|r - φ|)
//!   6. record the step's wall-clock cost

use std::time::Instant;

use rand::Rng;
use rand_distr::StandardNormal;

use fps_physics::rng::{seeded_stream, NOISE_STREAM, PHASE_STREAM};
use fps_physics::scenario::{generate, time_axis};
use fps_physics::{strate_kernel, PhaseAssignment, SignalEngine};
use fps_types::{FpsError, FpsResult, Scenario, SystemConfig, Trajectory};

/// Standard deviation of the environment and output series in extended mode.
pub const EXTENDED_NOISE_STD: f64 = 0.1;

/// One configured FPS system. Phase offsets are fixed at construction;
/// every [`FpsEngine::run`] with the same arguments is bit-identical.
pub struct FpsEngine {
    config: SystemConfig,
    signal: SignalEngine,
}

impl FpsEngine {
    pub fn new(config: SystemConfig) -> FpsResult<Self> {
        config.validate()?;
        let mut rng = seeded_stream(config.seed(), PHASE_STREAM);
        let phases = PhaseAssignment::draw(config.n(), &mut rng);
        let signal = SignalEngine::new(&config, phases)?;
        Ok(Self { config, signal })
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn phases(&self) -> &PhaseAssignment {
        self.signal.phases()
    }

    pub fn signal(&self) -> &SignalEngine {
        &self.signal
    }

    /// Integrate the system under `scenario`.
    ///
    /// Extended mode uses γ_n = 1 and draws E, O ~ N(0, 0.1²) from the
    /// run's noise stream, E for every step first, then O.
    pub fn run(&self, scenario: Scenario, use_extended: bool) -> Trajectory {
        let n = self.config.n();
        let duration = self.config.duration();
        let time = time_axis(duration, self.config.dt());
        let steps = time.len();
        let inputs = generate(scenario, duration, self.config.dt(), n);

        log::info!(
            "FpsEngine::run: N={n} steps={steps} scenario={scenario} extended={use_extended}"
        );

        let environment = use_extended.then(|| {
            let mut rng = seeded_stream(self.config.seed(), NOISE_STREAM);
            let e = gaussian_table(&mut rng, steps, n);
            let o = gaussian_table(&mut rng, steps, n);
            (vec![vec![1.0; n]; steps], e, o)
        });

        let mut s = Vec::with_capacity(steps);
        let mut c = Vec::with_capacity(steps);
        let mut r = Vec::with_capacity(steps);
        let mut a_hist: Vec<Vec<f64>> = Vec::with_capacity(steps);
        let mut f_hist: Vec<Vec<f64>> = Vec::with_capacity(steps);
        let mut cpu_times = Vec::with_capacity(steps);

        let start = Instant::now();
        for (k, &t) in time.iter().enumerate() {
            let step_start = Instant::now();

            let mut amps = vec![0.0; n];
            self.signal.amplitude(&inputs[k], &mut amps);

            let f_prev = f_hist.last().unwrap_or(&self.config.strates.f0);
            let mut freqs = vec![0.0; n];
            self.signal.frequency_modulation(&amps, f_prev, t, &mut freqs);

            let r_t = self.signal.spiral_ratio(t);
            let s_t = match &environment {
                Some((gamma, e, o)) => self
                    .signal
                    .global_signal_extended(&amps, &freqs, &gamma[k], &e[k], &o[k], t),
                None => self.signal.global_signal(&amps, &freqs, t),
            };

            s.push(s_t);
            r.push(r_t);
            c.push(self.signal.coherence(r_t));
            a_hist.push(amps);
            f_hist.push(freqs);
            cpu_times.push(step_start.elapsed().as_secs_f64());
        }
        let total_time = start.elapsed().as_secs_f64();

        log::info!("FpsEngine::run: finished {steps} steps in {total_time:.4}s");

        let (gamma, e, o) = match environment {
            Some((g, e, o)) => (Some(g), Some(e), Some(o)),
            None => (None, None, None),
        };

        Trajectory {
            time,
            s,
            c,
            r,
            a: a_hist,
            f: f_hist,
            gamma,
            e,
            o,
            cpu_times,
            total_time,
            scenario,
            extended: use_extended,
            config: self.config.clone(),
        }
    }
}

fn gaussian_table<R: Rng>(rng: &mut R, rows: usize, cols: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| EXTENDED_NOISE_STD * rng.sample::<f64, _>(StandardNormal))
                .collect()
        })
        .collect()
}

/// Build an engine for `config` and run it once.
pub fn run_simulation(
    config: &SystemConfig,
    scenario: Scenario,
    use_extended: bool,
) -> FpsResult<Trajectory> {
    Ok(FpsEngine::new(config.clone())?.run(scenario, use_extended))
}

/// Evaluate the strate-local kernel of strate `n` over `xs`, using the
/// strate's last recorded amplitude and frequency (A0_n, f0_n when the
/// trajectory is empty).
pub fn kernel_profile(
    trajectory: &Trajectory,
    n: usize,
    xs: &[f64],
    mu: f64,
    sigma: f64,
) -> FpsResult<Vec<f64>> {
    let strates = &trajectory.config.strates;
    if n >= trajectory.config.n() {
        return Err(FpsError::Config(format!(
            "strate index {n} out of range for N={}",
            trajectory.config.n()
        )));
    }
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(FpsError::Config(format!("kernel width must be > 0, got {sigma}")));
    }
    let (a_n, f_n) = trajectory
        .last_state(n)
        .unwrap_or((strates.a0[n], strates.f0[n]));
    Ok(xs
        .iter()
        .map(|&x| strate_kernel(a_n, f_n, x, mu, sigma))
        .collect())
}
