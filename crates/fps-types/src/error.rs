// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all FPS simulator failures.
#[derive(Error, Debug)]
pub enum FpsError {
    /// Missing section, bad scalar, or per-strate vector length != N.
    #[error("config error: {0}")]
    Config(String),

    /// Input scenario name outside {constant, step, ramp}.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    /// Companion feedback kind outside {tanh, damped_sine, sinc}.
    #[error("unknown feedback kind: {0}")]
    UnknownFeedback(String),

    /// Strict validation found at least one failing criterion.
    #[error(
        "FPS validation failed! Failed metrics: {failed:?}. Pass rate: {:.2}%. \
         See {log_path} for details.",
        pass_rate * 100.0
    )]
    Validation {
        failed: Vec<String>,
        pass_rate: f64,
        log_path: String,
    },

    /// Plot requested for a run that has no persisted log.
    #[error("log not found: {0}")]
    LogNotFound(String),

    /// Persistence failure (CSV logs, seed ledger).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure outside config parsing.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type FpsResult<T> = Result<T, FpsError>;
