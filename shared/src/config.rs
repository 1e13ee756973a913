//! Per-run configuration. Deliberately not a process-wide global: a
//! module-level log switch would require init-before-load ordering that a
//! Monte Carlo worker pool can't guarantee. `RunConfig` is threaded through
//! explicitly instead.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    Info,
    Verbose,
    Debug,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Silent
    }
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<tracing::Level> {
        match self {
            LogLevel::Silent => None,
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Verbose => Some(tracing::Level::DEBUG),
            LogLevel::Debug => Some(tracing::Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Seeds the per-run/per-iteration RNG stream for reproducibility.
    /// `None` draws entropy from the OS.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

/// Installs a scoped `tracing` subscriber for the duration of `f`, per the
/// requested level. Scoped (not global) so concurrent Monte Carlo workers
/// never contend over a shared logger.
pub fn with_scoped_logger<R>(level: LogLevel, f: impl FnOnce() -> R) -> R {
    match level.to_tracing_level() {
        None => f(),
        Some(lvl) => {
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(lvl)
                .with_writer(std::io::stderr)
                .without_time()
                .finish();
            tracing::subscriber::with_default(subscriber, f)
        }
    }
}
