// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Command-Line Front End
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! `fps`: run a simulation and its validation report, or drive companion
//! runs through the run service.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueHint};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use fps_core::{
    assert_all_criteria, run_all_validations, run_simulation, RunConfig, RunService,
    DEFAULT_FAILURES_LOG,
};
use fps_physics::params::KURAMOTO_SEED;
use fps_physics::{default_config, kuramoto_config, run_kuramoto_control};
use fps_types::{
    FpsError, FpsResult, PerturbationEvent, Scenario, SystemConfig, Trajectory, ValidationReport,
};

const DEFAULT_N: usize = 5;
const DEFAULT_T: f64 = 20.0;
const DEFAULT_SEED: u64 = 42;
const BASELINE_N: usize = 20;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fractal Pulsating Spiral simulator and validation engine",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(flatten)]
    simulate: SimulateArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Number of strates [default: 5]
    #[arg(short = 'N', long = "strates")]
    n: Option<usize>,

    /// Simulated duration in seconds [default: 20]
    #[arg(short = 'T', long = "duration")]
    t: Option<f64>,

    /// Seed for parameters, phases and noise [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Input scenario: constant, step or ramp
    #[arg(long, default_value = "constant", value_parser = parse_scenario)]
    scenario: Scenario,

    /// Use the extended global signal with feedback on E - O
    #[arg(long)]
    extended: bool,

    /// JSON system configuration; -N, -T and --seed override its system section
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Run the Kuramoto control and use its step cost as the CPU baseline
    #[arg(long)]
    baseline: bool,

    /// Shock time for the resilience criterion (repeatable)
    #[arg(long = "shock")]
    shocks: Vec<f64>,

    /// Strict mode: fail on any criterion and write the failure table here
    /// [bare flag: criteria_failures.csv]
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = DEFAULT_FAILURES_LOG,
        value_hint = ValueHint::FilePath
    )]
    failures_log: Option<PathBuf>,

    /// Emit JSON instead of the human-readable summary
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute and persist a companion strata run
    Companion {
        /// JSON run configuration
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,

        /// Holds logs/<run_name>.csv and seeds.txt
        #[arg(long, default_value = "data", value_hint = ValueHint::DirPath)]
        data_dir: PathBuf,
    },

    /// Print the logged coherence series of a companion run as JSON
    Plot {
        run_name: String,

        #[arg(long, default_value = "data", value_hint = ValueHint::DirPath)]
        data_dir: PathBuf,
    },
}

fn parse_scenario(raw: &str) -> Result<Scenario, String> {
    raw.parse::<Scenario>().map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct ValidationBrief<'a> {
    all_passed: bool,
    pass_rate: f64,
    failed_metrics: &'a [String],
}

#[derive(Serialize)]
struct SimulationOutput<'a> {
    t: &'a [f64],
    #[serde(rename = "S")]
    s: &'a [f64],
    #[serde(rename = "C")]
    c: &'a [f64],
    r: &'a [f64],
    validation: ValidationBrief<'a>,
    config: &'a SystemConfig,
}

#[derive(Serialize)]
struct ErrorOutput {
    error: &'static str,
    details: String,
}

fn build_config(args: &SimulateArgs) -> FpsResult<SystemConfig> {
    let Some(path) = &args.config else {
        return Ok(default_config(
            args.n.unwrap_or(DEFAULT_N),
            args.t.unwrap_or(DEFAULT_T),
            args.seed.unwrap_or(DEFAULT_SEED),
        ));
    };
    let mut cfg = SystemConfig::load(path)?;
    if let Some(n) = args.n {
        cfg.system.n = n;
    }
    if let Some(t) = args.t {
        cfg.system.t = t;
    }
    if let Some(seed) = args.seed {
        cfg.system.seed = seed;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn simulate(args: &SimulateArgs) -> FpsResult<()> {
    let config = build_config(args)?;
    let trajectory = run_simulation(&config, args.scenario, args.extended)?;

    let baseline = if args.baseline {
        let run = run_kuramoto_control(kuramoto_config(BASELINE_N, KURAMOTO_SEED))?;
        log::info!(
            "kuramoto baseline: mean step {:.3e}s, mean r {:.3}",
            run.mean_step_cost(),
            run.sync_metrics.mean_order_parameter
        );
        Some(run.mean_step_cost())
    } else {
        None
    };

    let events: Vec<PerturbationEvent> = args
        .shocks
        .iter()
        .map(|&time| PerturbationEvent { time })
        .collect();
    let perturbation_log = (!events.is_empty()).then_some(events.as_slice());

    let report = match &args.failures_log {
        Some(path) => assert_all_criteria(&trajectory, perturbation_log, baseline, path)?,
        None => run_all_validations(&trajectory, perturbation_log, baseline),
    };

    if args.json {
        print_json(&trajectory, &report)
    } else {
        print_summary(&trajectory, &report);
        Ok(())
    }
}

fn print_json(trajectory: &Trajectory, report: &ValidationReport) -> FpsResult<()> {
    let out = SimulationOutput {
        t: &trajectory.time,
        s: &trajectory.s,
        c: &trajectory.c,
        r: &trajectory.r,
        validation: ValidationBrief {
            all_passed: report.all_passed,
            pass_rate: report.summary.pass_rate,
            failed_metrics: &report.summary.failed_metrics,
        },
        config: &trajectory.config,
    };
    println!("{}", to_json(&out)?);
    Ok(())
}

fn print_summary(trajectory: &Trajectory, report: &ValidationReport) {
    let range = |series: &[f64]| Trajectory::range_of(series).unwrap_or((0.0, 0.0));
    let (s_lo, s_hi) = range(&trajectory.s);
    let (c_lo, c_hi) = range(&trajectory.c);
    let (r_lo, r_hi) = range(&trajectory.r);

    println!("FPS Simulation Results:");
    println!("- Scenario: {} ({})", trajectory.scenario, trajectory.scenario.describe());
    println!("- Time points: {}", trajectory.t_steps());
    println!("- S(t) range: [{s_lo:.3}, {s_hi:.3}]");
    println!("- C(t) range: [{c_lo:.3}, {c_hi:.3}]");
    println!("- r(t) range: [{r_lo:.3}, {r_hi:.3}]");
    for m in &report.metrics {
        let verdict = match (m.passed, m.abstained) {
            (true, true) => "PASS (no data)",
            (true, false) => "PASS",
            (false, _) => "FAIL",
        };
        println!(
            "  {:<15} {:>12.6}  threshold {:>10.6}  {verdict}",
            m.criterion.name(),
            m.value,
            m.threshold
        );
    }
    println!("- Validation passed: {}", report.all_passed);
    println!("- Pass rate: {:.1}%", report.summary.pass_rate * 100.0);
    if !report.all_passed {
        println!("- Failed metrics: {:?}", report.summary.failed_metrics);
    }
}

fn to_json<T: Serialize>(value: &T) -> FpsResult<String> {
    serde_json::to_string(value).map_err(|e| FpsError::Serialization(e.to_string()))
}

fn dispatch(cli: &Cli) -> FpsResult<()> {
    match &cli.command {
        None => simulate(&cli.simulate),
        Some(Command::Companion { config, data_dir }) => {
            let service = RunService::with_data_dir(data_dir);
            let receipt = service.run(RunConfig::load(config)?)?;
            println!("{}", to_json(&receipt)?);
            Ok(())
        }
        Some(Command::Plot { run_name, data_dir }) => {
            let service = RunService::with_data_dir(data_dir);
            let series = service.plot(run_name)?;
            println!("{}", to_json(&series)?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    // `log` records from the library crates are bridged into this subscriber
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();

    match dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("fps failed: {err:?}");
            if cli.simulate.json {
                let out = ErrorOutput {
                    error: "Simulation failed",
                    details: err.to_string(),
                };
                match serde_json::to_string(&out) {
                    Ok(line) => println!("{line}"),
                    Err(_) => println!("{{\"error\": \"Simulation failed\"}}"),
                }
            } else {
                eprintln!("Error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["fps"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.simulate.scenario, Scenario::Constant);
        let cfg = build_config(&cli.simulate).unwrap();
        assert_eq!(cfg.n(), DEFAULT_N);
        assert_eq!(cfg.duration(), DEFAULT_T);
        assert_eq!(cfg.seed(), DEFAULT_SEED);
    }

    #[test]
    fn test_short_flags() {
        let cli =
            Cli::try_parse_from(["fps", "-N", "3", "-T", "2.5", "--scenario", "ramp", "--json"])
                .unwrap();
        assert_eq!(cli.simulate.n, Some(3));
        assert_eq!(cli.simulate.t, Some(2.5));
        assert_eq!(cli.simulate.scenario, Scenario::Ramp);
        assert!(cli.simulate.json);
    }

    #[test]
    fn test_failures_log_path() {
        let cli = Cli::try_parse_from(["fps"]).unwrap();
        assert_eq!(cli.simulate.failures_log, None);

        let cli = Cli::try_parse_from(["fps", "--failures-log", "--json"]).unwrap();
        assert_eq!(cli.simulate.failures_log, Some(PathBuf::from(DEFAULT_FAILURES_LOG)));
        assert!(cli.simulate.json);

        let cli = Cli::try_parse_from(["fps", "--failures-log", "out/fails.csv"]).unwrap();
        assert_eq!(cli.simulate.failures_log, Some(PathBuf::from("out/fails.csv")));
    }

    #[test]
    fn test_unknown_scenario_rejected_at_parse() {
        assert!(Cli::try_parse_from(["fps", "--scenario", "sawtooth"]).is_err());
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::try_parse_from(["fps", "plot", "baseline"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Plot { ref run_name, .. }) if run_name == "baseline"));
        let cli = Cli::try_parse_from(["fps", "companion", "--config", "run.json"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Companion { .. })));
    }

    #[test]
    fn test_config_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.json");
        std::fs::write(&path, default_config(4, 5.0, 1).to_json_pretty().unwrap()).unwrap();

        let cli = Cli::try_parse_from([
            "fps",
            "--config",
            path.to_str().unwrap(),
            "-T",
            "3.0",
            "--seed",
            "9",
        ])
        .unwrap();
        let cfg = build_config(&cli.simulate).unwrap();
        assert_eq!(cfg.n(), 4);
        assert_eq!(cfg.duration(), 3.0);
        assert_eq!(cfg.seed(), 9);

        // changing N without matching vectors is a config error
        let cli = Cli::try_parse_from(["fps", "--config", path.to_str().unwrap(), "-N", "6"]).unwrap();
        assert!(build_config(&cli.simulate).is_err());
    }
}
