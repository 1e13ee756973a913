//! Monte Carlo driver — N-API bindings.
//!
//! Runs the DES kernel many times over independent RNG streams and
//! aggregates the results. Each iteration gets its own scenario/overrides
//! snapshot, so a sweep over `simulate_settings` never lets one iteration's
//! projected value leak into another's.

pub mod aggregate;
pub mod driver;
pub mod percentile;
pub mod simulate_settings;

use std::collections::HashMap;

use napi_derive::napi;
use serde::{Deserialize, Serialize};

use vmu_sim_des::state::InitialResources;
use vmu_sim_des::{Overrides, Results, RunOptions, Scenario, State};
use vmu_sim_shared::{with_scoped_logger, RunConfig, SimError};

use aggregate::{aggregate_by_type, aggregate_missions, aggregate_rejections, aggregate_utilization, AggregatedStatistics};
use percentile::{select_percentile_timelines, PercentileTimeline};
use simulate_settings::{Algorithm, SimulateSetting};

const DEFAULT_ITERATIONS: u32 = 1000;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MonteCarloOptions {
    pub iterations: Option<u32>,
    #[serde(rename = "keepIterations")]
    pub keep_iterations: Option<bool>,
    #[serde(rename = "maxConcurrent")]
    pub max_concurrent: Option<u32>,
    pub algorithm: Option<Algorithm>,
    #[serde(rename = "simulateSettings", default)]
    pub simulate_settings: Vec<SimulateSetting>,
    pub state: Option<State>,
    pub overrides: Option<Overrides>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloResults {
    pub iterations_requested: u32,
    pub iterations_completed: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub iterations_lost: Vec<u32>,
    pub horizon_hours: f64,
    pub missions: HashMap<String, AggregatedStatistics>,
    pub rejections: HashMap<String, AggregatedStatistics>,
    pub utilization: HashMap<String, HashMap<String, AggregatedStatistics>>,
    pub by_type: HashMap<String, HashMap<String, AggregatedStatistics>>,
    pub percentile_timelines: HashMap<String, PercentileTimeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations_data: Option<Vec<Results>>,
    pub initial_resources: InitialResources,
}

/// Runs the Monte Carlo sweep and aggregates its results. `config` controls
/// logging and the base RNG seed — each iteration derives its own stream
/// from it (see `driver::build_iteration_inputs`), so re-running with the
/// same seed reproduces the same sweep.
pub fn run_monte_carlo_internal(
    scenario: Scenario,
    options: MonteCarloOptions,
    config: RunConfig,
) -> Result<MonteCarloResults, SimError> {
    let iterations = options.iterations.unwrap_or(DEFAULT_ITERATIONS);
    let keep_iterations = options.keep_iterations.unwrap_or(false);
    let max_concurrent = options
        .max_concurrent
        .map(|n| n as usize)
        .unwrap_or_else(num_cpus::get);
    let algorithm = options.algorithm.unwrap_or_default();

    let horizon_hours = scenario.horizon_hours;
    let run_options = RunOptions {
        state: options.state,
        overrides: options.overrides,
    };

    let output = driver::run_iterations(
        scenario,
        run_options,
        config,
        iterations,
        max_concurrent,
        algorithm,
        &options.simulate_settings,
    )?;

    let initial_resources = output
        .results
        .first()
        .map(|r| r.initial_resources.clone())
        .ok_or_else(|| SimError::InvalidState("no iterations completed".to_string()))?;

    Ok(MonteCarloResults {
        iterations_requested: iterations,
        iterations_completed: output.iterations_completed,
        iterations_lost: output.iterations_lost,
        horizon_hours,
        missions: aggregate_missions(&output.results),
        rejections: aggregate_rejections(&output.results),
        utilization: aggregate_utilization(&output.results),
        by_type: aggregate_by_type(&output.results),
        percentile_timelines: select_percentile_timelines(&output.results),
        iterations_data: if keep_iterations { Some(output.results.clone()) } else { None },
        initial_resources,
    })
}

#[napi]
pub fn run_monte_carlo(
    scenario: serde_json::Value,
    options: serde_json::Value,
    config: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let scenario: Scenario = serde_json::from_value(scenario)
        .map_err(|e| napi::Error::from_reason(format!("failed to parse scenario: {e}")))?;

    let options: MonteCarloOptions = serde_json::from_value(options)
        .map_err(|e| napi::Error::from_reason(format!("failed to parse options: {e}")))?;

    let config: RunConfig = match config {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| napi::Error::from_reason(format!("failed to parse config: {e}")))?,
        None => RunConfig::default(),
    };

    let results = with_scoped_logger(config.log_level, || {
        run_monte_carlo_internal(scenario, options, config.clone())
    })
    .map_err(|e| napi::Error::from_reason(format!("monte carlo error: {e}")))?;

    serde_json::to_value(&results)
        .map_err(|e| napi::Error::from_reason(format!("failed to serialize results: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmu_sim_des::scenario::{Aircrew, DutyRequirements, Lookahead, MissionType, ProcessTimes, UnitPolicy};
    use vmu_sim_des::state::StateTable;
    use serde_json::json;

    fn minimal_scenario() -> Scenario {
        Scenario {
            name: None,
            horizon_hours: 24.0,
            demand: Vec::new(),
            mission_types: vec![MissionType {
                name: "ISR".into(),
                required_aircrew: Aircrew { pilot: 1, so: 1, intel: 0 },
                required_payload_types: Vec::new(),
                flight_time: vmu_sim_shared::Distribution::Deterministic { value_hours: 2.0 },
                transit_in: None,
                transit_out: None,
                crew_rotation: None,
            }],
            process_times: ProcessTimes::default(),
            hold_crew_during_process_times: false,
            duty_requirements: DutyRequirements::default(),
            lookahead: Lookahead::default(),
            personnel_availability: HashMap::new(),
            unit_policy: UnitPolicy::default(),
        }
    }

    fn mock_state() -> State {
        let mut tables = HashMap::new();
        tables.insert(
            "v_unit".to_string(),
            StateTable { rows: vec![HashMap::from([("Unit".to_string(), json!("A"))])] },
        );
        tables.insert(
            "v_aircraft".to_string(),
            StateTable {
                rows: (0..2)
                    .map(|_| {
                        HashMap::from([
                            ("Unit".to_string(), json!("A")),
                            ("Status".to_string(), json!("FMC")),
                        ])
                    })
                    .collect(),
            },
        );
        tables.insert(
            "v_staffing".to_string(),
            StateTable {
                rows: [("7318", 5), ("7314", 5), ("7316", 2)]
                    .into_iter()
                    .flat_map(|(mos, count)| {
                        (0..count).map(move |_| {
                            HashMap::from([
                                ("Unit Name".to_string(), json!("A")),
                                ("MOS Number".to_string(), json!(mos)),
                            ])
                        })
                    })
                    .collect(),
            },
        );
        tables.insert("v_payload".to_string(), StateTable { rows: Vec::new() });
        State { tables }
    }

    #[test]
    fn runs_requested_iterations_and_aggregates() {
        let scenario = minimal_scenario();
        let options = MonteCarloOptions {
            iterations: Some(8),
            max_concurrent: Some(2),
            state: Some(mock_state()),
            ..Default::default()
        };
        let config = RunConfig { rng_seed: Some(7), ..Default::default() };
        let results = run_monte_carlo_internal(scenario, options, config).unwrap();
        assert_eq!(results.iterations_requested, 8);
        assert_eq!(results.iterations_completed, 8);
        assert!(results.missions.contains_key("requested"));
        assert!(results.percentile_timelines.contains_key("p50"));
    }

    #[test]
    fn missing_state_surfaces_as_error() {
        let scenario = minimal_scenario();
        let options = MonteCarloOptions { iterations: Some(2), ..Default::default() };
        let config = RunConfig::default();
        assert!(run_monte_carlo_internal(scenario, options, config).is_err());
    }
}
