//! Simulate-setting projection and the path-alias table — the only
//! boundary between external naming and the internal model.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use vmu_sim_des::scenario::{Mos, Overrides, Scenario};
use vmu_sim_shared::distributions::sample_beta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Step,
    Pert,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Step
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulateSetting {
    pub path: Vec<String>,
    pub default_value: f64,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub step: f64,
}

/// Token aliases from the external (mixed camelCase) naming to the
/// internal snake_case field the projector writes to. Payload-field
/// aliases and a handful of named scenario shortcuts live here; anything
/// not listed passes through unchanged (already-internal paths are valid
/// input too).
static TOKEN_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("horizonHours", "horizon_hours"),
        ("unitSplit", "mission_split"),
        ("pilotReq", "pilot"),
        ("soReq", "so"),
        ("intelReq", "intel"),
        ("skyTower", "SkyTower II"),
        ("ewPod", "EW Pod"),
        ("smartSensor", "SmartSensor"),
        ("extendedRange", "Extended Range Tank"),
    ])
});

fn alias(token: &str) -> String {
    TOKEN_ALIASES.get(token).copied().unwrap_or(token).to_string()
}

/// Step schedule: `idx = (base + i) mod n`, value `= clamp(idx*step + min)`.
pub fn project_step(setting: &SimulateSetting, iteration: u32) -> f64 {
    let n = ((setting.max - setting.min) / setting.step).floor() as i64 + 1;
    let base = ((setting.default_value - setting.min) / setting.step).round() as i64;
    let idx = (base + iteration as i64).rem_euclid(n.max(1));
    (idx as f64 * setting.step + setting.min).clamp(setting.min, setting.max)
}

/// Beta-PERT schedule with `λ = 4`.
pub fn project_pert(setting: &SimulateSetting, rng: &mut impl Rng) -> f64 {
    const LAMBDA: f64 = 4.0;
    let (min, default, max) = (setting.min, setting.default_value, setting.max);
    let mu = (min + LAMBDA * default + max) / (LAMBDA + 2.0);
    let alpha = 1.0 + LAMBDA * (mu - min) / (max - min);
    let beta = 1.0 + LAMBDA * (max - mu) / (max - min);
    let u = sample_beta(alpha, beta, rng);
    let mut x = min + u * (max - min);
    if setting.step > 0.0 {
        x = (x / setting.step).round() * setting.step;
    }
    x.clamp(min, max)
}

pub fn project_value(
    setting: &SimulateSetting,
    algorithm: Algorithm,
    iteration: u32,
    rng: &mut impl Rng,
) -> f64 {
    match algorithm {
        Algorithm::Step => project_step(setting, iteration),
        Algorithm::Pert => project_pert(setting, rng),
    }
}

fn mos_field(token: &str) -> Option<Mos> {
    match alias(token).as_str() {
        "pilot" => Some(Mos::Pilot),
        "so" => Some(Mos::So),
        "intel" => Some(Mos::Intel),
        _ => None,
    }
}

/// Applies one projected value to a per-iteration scenario/overrides pair.
/// Unknown paths are logged and skipped, never a hard error —
/// only malformed *scenario shape* is fatal, and a bad simulate-setting
/// path is an authoring mistake in the sweep, not the scenario itself.
pub fn apply_simulate_setting(
    scenario: &mut Scenario,
    overrides: &mut Overrides,
    setting: &SimulateSetting,
    value: f64,
) {
    let tokens: Vec<String> = setting.path.iter().map(|t| alias(t)).collect();
    let slice: Vec<&str> = tokens.iter().map(String::as_str).collect();

    match slice.as_slice() {
        ["overrides", unit, field] => {
            let o = overrides.units.entry(unit.to_string()).or_default();
            match *field {
                "aircraft" => o.aircraft = Some(value),
                "pilot" => o.pilot = Some(value),
                "so" => o.so = Some(value),
                "intel" => o.intel = Some(value),
                other => {
                    o.payload_by_type
                        .get_or_insert_with(HashMap::new)
                        .insert(other.to_string(), value);
                }
            }
        }
        ["horizon_hours"] => scenario.horizon_hours = value,
        ["mission_split", unit] => {
            scenario.unit_policy.mission_split.insert(unit.to_string(), value);
        }
        ["mission_types", idx, field @ ..] => {
            let Ok(i) = idx.parse::<usize>() else {
                tracing::warn!(path = ?setting.path, "unknown simulate-setting path: bad mission_types index");
                return;
            };
            let Some(mt) = scenario.mission_types.get_mut(i) else {
                tracing::warn!(path = ?setting.path, "unknown simulate-setting path: mission_types index out of range");
                return;
            };
            match field {
                [f] if mos_field(f).is_some() => match mos_field(f).unwrap() {
                    Mos::Pilot => mt.required_aircrew.pilot = value.max(0.0) as u32,
                    Mos::So => mt.required_aircrew.so = value.max(0.0) as u32,
                    Mos::Intel => mt.required_aircrew.intel = value.max(0.0) as u32,
                },
                ["flightTime", "value"] | ["flight_time", "value_hours"] => {
                    mt.flight_time = vmu_sim_shared::Distribution::Deterministic { value_hours: value };
                }
                _ => {
                    tracing::warn!(path = ?setting.path, "unknown simulate-setting path: unrecognized mission_types field");
                }
            }
        }
        ["process_times", field, "value_hours"] => {
            let dist = Some(vmu_sim_shared::Distribution::Deterministic { value_hours: value });
            match *field {
                "preflight" => scenario.process_times.preflight = dist,
                "postflight" => scenario.process_times.postflight = dist,
                "turnaround" => scenario.process_times.turnaround = dist,
                other => {
                    scenario
                        .process_times
                        .mount_times
                        .insert(other.to_string(), dist.unwrap());
                }
            }
        }
        _ => {
            tracing::warn!(path = ?setting.path, "unknown simulate-setting path, skipping");
        }
    }
}
