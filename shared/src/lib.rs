//! Cross-crate utilities shared by the DES kernel and the Monte Carlo
//! driver: stochastic sampling, the per-run config/logging shim, and the
//! error kinds that cross the N-API boundary.

pub mod config;
pub mod distributions;
pub mod error;

pub use config::{with_scoped_logger, LogLevel, RunConfig};
pub use distributions::Distribution;
pub use error::SimError;
