//! Parallel iteration runner. Each iteration gets its own RNG stream and
//! scenario/overrides clone — no cross-iteration state is shared, so the
//! thread pool's scheduling order never affects results. Per-iteration
//! timeout and retry are handled here; `lib.rs` only sees the aggregate
//! outcome.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use rand::SeedableRng;
use rayon::prelude::*;

use vmu_sim_des::{run_simulation_internal_ref, Overrides, Results, RunOptions, Scenario};
use vmu_sim_shared::{RunConfig, SimError};

use crate::simulate_settings::{apply_simulate_setting, project_value, Algorithm, SimulateSetting};

const MAX_ATTEMPTS: u32 = 3;
const ITERATION_TIMEOUT: Duration = Duration::from_secs(60);

pub struct DriverOutput {
    pub results: Vec<Results>,
    pub iterations_completed: u32,
    pub iterations_lost: Vec<u32>,
}

/// Runs one kernel call on its own thread and waits on it with a wall-clock
/// timeout. There is no safe way to force-kill a running Rust thread, so a
/// timed-out call is abandoned rather than terminated — only its result is
/// discarded.
fn run_with_timeout(
    scenario: Arc<Scenario>,
    options: Arc<RunOptions>,
    config: RunConfig,
) -> Option<Result<Results, SimError>> {
    let (tx, rx) = bounded(1);
    std::thread::spawn(move || {
        let result = run_simulation_internal_ref(&scenario, &options, &config);
        let _ = tx.send(result);
    });
    match rx.recv_timeout(ITERATION_TIMEOUT) {
        Ok(result) => Some(result),
        Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
    }
}

fn run_iteration_with_retry(
    iteration: u32,
    scenario: Arc<Scenario>,
    options: Arc<RunOptions>,
    base_config: &RunConfig,
) -> Result<Results, SimError> {
    let mut last_err: Option<SimError> = None;
    for attempt in 0..MAX_ATTEMPTS {
        let mut iter_config = base_config.clone();
        iter_config.rng_seed = base_config
            .rng_seed
            .map(|s| s.wrapping_add(iteration as u64).wrapping_add(attempt as u64 * 1_000_003));

        match run_with_timeout(scenario.clone(), options.clone(), iter_config) {
            Some(Ok(results)) => return Ok(results),
            Some(Err(e)) => {
                tracing::warn!(iteration, attempt, error = %e, "iteration failed, retrying");
                last_err = Some(e);
            }
            None => {
                tracing::warn!(iteration, attempt, "iteration timed out, retrying");
                last_err = Some(SimError::IterationTimeout { iteration });
            }
        }

        if attempt + 1 < MAX_ATTEMPTS {
            std::thread::sleep(Duration::from_millis(100 * 2u64.pow(attempt)));
        }
    }

    Err(SimError::IterationFailed {
        iteration,
        attempts: MAX_ATTEMPTS,
        last_error: last_err.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// Builds the per-iteration scenario/overrides pair, applying any
/// simulate-settings projections with an iteration-local RNG.
fn build_iteration_inputs(
    base_scenario: &Arc<Scenario>,
    base_options: &Arc<RunOptions>,
    simulate_settings: &[SimulateSetting],
    algorithm: Algorithm,
    seed: Option<u64>,
    iteration: u32,
) -> (Arc<Scenario>, Arc<RunOptions>) {
    if simulate_settings.is_empty() {
        return (base_scenario.clone(), base_options.clone());
    }

    let mut scenario = (**base_scenario).clone();
    let mut overrides: Overrides = base_options.overrides.clone().unwrap_or_default();

    let mut rng = match seed {
        Some(s) => rand_chacha::ChaCha8Rng::seed_from_u64(s.wrapping_add(iteration as u64)),
        None => rand_chacha::ChaCha8Rng::from_entropy(),
    };

    for setting in simulate_settings {
        let value = project_value(setting, algorithm, iteration, &mut rng);
        apply_simulate_setting(&mut scenario, &mut overrides, setting, value);
    }

    let options = RunOptions {
        state: base_options.state.clone(),
        overrides: Some(overrides),
    };
    (Arc::new(scenario), Arc::new(options))
}

/// Runs `iterations` independent simulations, up to `max_concurrent` at
/// once. Iterations that exhaust their retries are recorded in
/// `iterations_lost` rather than aborting the run — a partially-completed
/// sweep is still reportable, with the actual completed count exposed
/// alongside it.
pub fn run_iterations(
    scenario: Scenario,
    options: RunOptions,
    config: RunConfig,
    iterations: u32,
    max_concurrent: usize,
    algorithm: Algorithm,
    simulate_settings: &[SimulateSetting],
) -> Result<DriverOutput, SimError> {
    let base_scenario = Arc::new(scenario);
    let base_options = Arc::new(options);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_concurrent.max(1))
        .build()
        .map_err(|e| SimError::InvalidParameter(format!("failed to build worker pool: {e}")))?;

    let outcomes: Vec<(u32, Result<Results, SimError>)> = pool.install(|| {
        (0..iterations)
            .into_par_iter()
            .map(|i| {
                let (scenario_i, options_i) = build_iteration_inputs(
                    &base_scenario,
                    &base_options,
                    simulate_settings,
                    algorithm,
                    config.rng_seed,
                    i,
                );
                let result = run_iteration_with_retry(i, scenario_i, options_i, &config);
                (i, result)
            })
            .collect()
    });

    let mut results = Vec::with_capacity(outcomes.len());
    let mut lost = Vec::new();
    for (i, outcome) in outcomes {
        match outcome {
            Ok(r) => results.push(r),
            Err(e) => {
                tracing::warn!(iteration = i, error = %e, "iteration lost after retries");
                lost.push(i);
            }
        }
    }

    Ok(DriverOutput {
        iterations_completed: results.len() as u32,
        results,
        iterations_lost: lost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmu_sim_des::scenario::{Aircrew, DutyRequirements, Lookahead, MissionType, ProcessTimes, UnitPolicy};
    use vmu_sim_des::state::StateTable;
    use vmu_sim_des::State;
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
            personnel_availability: std::collections::HashMap::new(),
            unit_policy: UnitPolicy::default(),
        }
    }

    fn mock_state() -> State {
        let mut tables = std::collections::HashMap::new();
        tables.insert(
            "v_unit".to_string(),
            StateTable { rows: vec![std::collections::HashMap::from([("Unit".to_string(), json!("A"))])] },
        );
        tables.insert(
            "v_aircraft".to_string(),
            StateTable {
                rows: (0..2)
                    .map(|_| {
                        std::collections::HashMap::from([
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
                            std::collections::HashMap::from([
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
    fn runs_requested_iteration_count_with_no_demand() {
        let scenario = minimal_scenario();
        let options = RunOptions { state: Some(mock_state()), overrides: None };
        let config = RunConfig { rng_seed: Some(1), ..Default::default() };
        let output = run_iterations(scenario, options, config, 5, 2, Algorithm::Step, &[]).unwrap();
        assert_eq!(output.iterations_completed, 5);
        assert!(output.iterations_lost.is_empty());
        assert_eq!(output.results.len(), 5);
    }

    #[test]
    fn zero_iterations_yields_empty_output() {
        let scenario = minimal_scenario();
        let options = RunOptions { state: Some(mock_state()), overrides: None };
        let config = RunConfig::default();
        let output = run_iterations(scenario, options, config, 0, 1, Algorithm::Step, &[]).unwrap();
        assert_eq!(output.iterations_completed, 0);
        assert!(output.results.is_empty());
    }
}
