//! Profiling CLI for the DES and Monte Carlo engines.
//!
//! Usage:
//!   cargo run --release --bin bench -- <scenario-file> [--monte] [--iterations N] [--seed N]
//!   cargo flamegraph --bin bench -- <scenario-file> [--monte] [--iterations N]

use std::collections::HashMap;
use std::env;
use std::fs;

use serde_json::Value;
use vmu_sim_des::{run_simulation_internal, RunOptions, Scenario, State};
use vmu_sim_des::state::StateTable;
use vmu_sim_monte::{run_monte_carlo_internal, MonteCarloOptions};
use vmu_sim_shared::RunConfig;

fn create_mock_state(_scenario: &Scenario) -> State {
    let units = vec!["VMU-1".to_string(), "VMU-3".to_string()];
    let mut tables = HashMap::new();

    let mut unit_rows = Vec::new();
    for unit in &units {
        let mut row = HashMap::new();
        row.insert("Unit".to_string(), Value::String(unit.clone()));
        unit_rows.push(row);
    }
    tables.insert("v_unit".to_string(), StateTable { rows: unit_rows });

    let mut aircraft_rows = Vec::new();
    for unit in &units {
        for _ in 0..5 {
            let mut row = HashMap::new();
            row.insert("Unit".to_string(), Value::String(unit.clone()));
            row.insert("Status".to_string(), Value::String("FMC".to_string()));
            aircraft_rows.push(row);
        }
    }
    tables.insert("v_aircraft".to_string(), StateTable { rows: aircraft_rows });

    let mut payload_rows = Vec::new();
    let payload_types = ["SkyTower II", "EW Pod", "SmartSensor", "Extended Range Tank"];
    for unit in &units {
        for ptype in payload_types {
            for _ in 0..3 {
                let mut row = HashMap::new();
                row.insert("Unit".to_string(), Value::String(unit.clone()));
                row.insert("Type".to_string(), Value::String(ptype.to_string()));
                payload_rows.push(row);
            }
        }
    }
    tables.insert("v_payload".to_string(), StateTable { rows: payload_rows });

    let mut staffing_rows = Vec::new();
    for unit in &units {
        for (mos, count) in [("7318", 10), ("7314", 10), ("7316", 4)] {
            for _ in 0..count {
                let mut row = HashMap::new();
                row.insert("Unit Name".to_string(), Value::String(unit.clone()));
                row.insert("MOS Number".to_string(), Value::String(mos.to_string()));
                staffing_rows.push(row);
            }
        }
    }
    tables.insert("v_staffing".to_string(), StateTable { rows: staffing_rows });

    State { tables }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --release --bin bench -- <scenario-file> [--monte] [--iterations N] [--seed N]");
        eprintln!("For flamegraph: cargo flamegraph --bin bench -- <scenario-file> [--monte] [--iterations N]");
        eprintln!("\nOptions:");
        eprintln!("  --monte          Run Monte Carlo instead of DES");
        eprintln!("  --iterations N   Number of Monte Carlo iterations (default: 100)");
        eprintln!("  --seed N         RNG seed for reproducible runs");
        std::process::exit(1);
    }

    let scenario_path = &args[1];
    let run_monte = args.contains(&"--monte".to_string());
    let iterations = args
        .iter()
        .position(|x| x == "--iterations")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(100);
    let seed = args
        .iter()
        .position(|x| x == "--seed")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse::<u64>().ok());

    let scenario_content = fs::read_to_string(scenario_path).unwrap_or_else(|e| {
        eprintln!("Failed to read scenario file: {scenario_path}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let scenario: Scenario = serde_json::from_str(&scenario_content).expect("failed to parse scenario JSON");

    let state = create_mock_state(&scenario);
    let config = RunConfig { rng_seed: seed, ..Default::default() };

    if run_monte {
        println!("Running Monte Carlo simulation benchmark...");
        println!("Scenario: {scenario_path}");
        println!("Horizon: {} hours", scenario.horizon_hours);
        println!("Iterations: {iterations}");

        let monte_options = MonteCarloOptions {
            iterations: Some(iterations),
            keep_iterations: Some(false),
            state: Some(state),
            ..Default::default()
        };

        let start = std::time::Instant::now();
        match run_monte_carlo_internal(scenario, monte_options, config) {
            Ok(results) => {
                let duration = start.elapsed();
                println!("\nMonte Carlo simulation completed in {duration:?}");
                println!("Time per iteration: {:?}", duration / iterations.max(1));
                println!("Iterations completed: {}/{}", results.iterations_completed, results.iterations_requested);
                if let Some(completed) = results.missions.get("completed") {
                    println!("Avg missions completed: {:.2}", completed.mean);
                }
                if let Some(started) = results.missions.get("started") {
                    println!("Avg missions started: {:.2}", started.mean);
                }
                if let Some(rejected) = results.missions.get("rejected") {
                    println!("Avg missions rejected: {:.2}", rejected.mean);
                }
            }
            Err(e) => {
                eprintln!("Monte Carlo simulation failed: {e}");
                std::process::exit(1);
            }
        }
    } else {
        let options = RunOptions { state: Some(state), overrides: None };

        println!("Running DES simulation benchmark...");
        println!("Scenario: {scenario_path}");
        println!("Horizon: {} hours", scenario.horizon_hours);

        let start = std::time::Instant::now();
        match run_simulation_internal(scenario, options, config) {
            Ok(results) => {
                let duration = start.elapsed();
                println!("\nSimulation completed in {duration:?}");
                println!("Missions requested: {}", results.missions.requested);
                println!("Missions started: {}", results.missions.started);
                println!("Missions completed: {}", results.missions.completed);
                println!("Missions rejected: {}", results.missions.rejected);
            }
            Err(e) => {
                eprintln!("Simulation failed: {e}");
                std::process::exit(1);
            }
        }
    }
}
