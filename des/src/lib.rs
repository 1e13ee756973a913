//! DES engine — N-API bindings.
//!
//! Implements a discrete event simulation engine for squadron flight and
//! duty operations: missions consume aircraft, payload, and aircrew from
//! per-unit pools; duty requirements (ODO/SDO/SDNCO) draw from the same
//! crew queues on their own schedule. See the `kernel` module for the
//! event loop itself.

pub mod availability;
pub mod crew;
pub mod demand;
pub mod kernel;
pub mod pool;
pub mod results;
pub mod scenario;
pub mod state;

#[cfg(test)]
pub use demand::tests_support;

use napi_derive::napi;
use vmu_sim_shared::{with_scoped_logger, RunConfig};

pub use kernel::{run_simulation_internal, run_simulation_internal_ref, RunOptions};
pub use results::Results;
pub use scenario::{Overrides, Scenario};
pub use state::State;

#[napi]
pub fn run_simulation(
    scenario: serde_json::Value,
    options: serde_json::Value,
    config: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let scenario: Scenario = serde_json::from_value(scenario)
        .map_err(|e| napi::Error::from_reason(format!("failed to parse scenario: {e}")))?;

    let options: RunOptions = serde_json::from_value(options)
        .map_err(|e| napi::Error::from_reason(format!("failed to parse options: {e}")))?;

    let config: RunConfig = match config {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| napi::Error::from_reason(format!("failed to parse config: {e}")))?,
        None => RunConfig::default(),
    };

    let results = with_scoped_logger(config.log_level, || {
        run_simulation_internal(scenario, options, config.clone())
    })
    .map_err(|e| napi::Error::from_reason(format!("simulation error: {e}")))?;

    serde_json::to_value(&results)
        .map_err(|e| napi::Error::from_reason(format!("failed to serialize results: {e}")))
}
