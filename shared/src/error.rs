//! Structured error kinds for the kernel boundary. Resource shortfalls are
//! never represented here — they are observable outcomes recorded directly
//! in a run's timeline.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SimError {
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("iteration {iteration} timed out")]
    IterationTimeout { iteration: u32 },

    #[error("iteration {iteration} failed after {attempts} attempts: {last_error}")]
    IterationFailed {
        iteration: u32,
        attempts: u32,
        last_error: String,
    },
}
