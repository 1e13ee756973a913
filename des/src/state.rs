//! Tabular state snapshot and per-unit override application. Derives
//! initial unit/aircraft/payload/staffing counts from four tables, then
//! applies per-unit overrides across the three MOS roles.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use vmu_sim_shared::SimError;

use crate::scenario::{Mos, Overrides};

const MOS_CODE_PILOT: &str = "7318";
const MOS_CODE_SO: &str = "7314";
const MOS_CODE_INTEL: &str = "7316";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateTable {
    pub rows: Vec<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct State {
    pub tables: HashMap<String, StateTable>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InitialResources {
    pub units: Vec<String>,
    pub aircraft_by_unit: HashMap<String, u32>,
    pub payload_by_unit: HashMap<String, HashMap<String, u32>>,
    pub staffing_by_unit: HashMap<String, HashMap<Mos, u32>>,
    pub overrides_applied: bool,
}

fn mos_for_code(code: &str) -> Option<Mos> {
    match code {
        MOS_CODE_PILOT => Some(Mos::Pilot),
        MOS_CODE_SO => Some(Mos::So),
        MOS_CODE_INTEL => Some(Mos::Intel),
        _ => None,
    }
}

pub fn derive_initial_from_state(state: &State) -> Result<InitialResources, SimError> {
    let rows = |key: &str| -> &[HashMap<String, serde_json::Value>] {
        state
            .tables
            .get(key)
            .map(|t| t.rows.as_slice())
            .unwrap_or(&[])
    };

    let unit_rows = rows("v_unit");
    let aircraft_rows = rows("v_aircraft");
    let payload_rows = rows("v_payload");
    let staffing_rows = rows("v_staffing");

    let mut units: HashSet<String> = unit_rows
        .iter()
        .filter_map(|r| r.get("Unit").and_then(|v| v.as_str()).map(str::to_string))
        .collect();

    let mut aircraft_by_unit: HashMap<String, u32> = HashMap::new();
    for r in aircraft_rows {
        let status = r.get("Status").and_then(|v| v.as_str());
        let unit = r.get("Unit").and_then(|v| v.as_str());
        if let (Some("FMC"), Some(unit)) = (status, unit) {
            *aircraft_by_unit.entry(unit.to_string()).or_insert(0) += 1;
        }
    }

    let mut payload_by_unit: HashMap<String, HashMap<String, u32>> = HashMap::new();
    for r in payload_rows {
        let unit = r
            .get("Unit")
            .and_then(|v| v.as_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        if let Some(ptype) = r.get("Type").and_then(|v| v.as_str()) {
            *payload_by_unit
                .entry(unit)
                .or_default()
                .entry(ptype.to_string())
                .or_insert(0) += 1;
        }
    }

    let mut staffing_by_unit: HashMap<String, HashMap<Mos, u32>> = HashMap::new();
    for r in staffing_rows {
        let unit = r.get("Unit Name").and_then(|v| v.as_str());
        let mos_code = r.get("MOS Number").and_then(|v| v.as_str());
        if let (Some(unit), Some(mos_code)) = (unit, mos_code) {
            if let Some(mos) = mos_for_code(mos_code) {
                *staffing_by_unit
                    .entry(unit.to_string())
                    .or_default()
                    .entry(mos)
                    .or_insert(0) += 1;
            }
        }
    }

    for unit in aircraft_by_unit
        .keys()
        .chain(payload_by_unit.keys())
        .chain(staffing_by_unit.keys())
    {
        units.insert(unit.clone());
    }

    if units.is_empty() {
        return Err(SimError::InvalidState(
            "no units found in state snapshot".into(),
        ));
    }

    let mut units: Vec<String> = units.into_iter().collect();
    units.sort();

    Ok(InitialResources {
        units,
        aircraft_by_unit,
        payload_by_unit,
        staffing_by_unit,
        overrides_applied: false,
    })
}

/// Applies per-unit overrides on top of derived state. An overridden field
/// replaces the state-derived value; absent fields fall back to state.
pub fn apply_overrides(initial: &mut InitialResources, overrides: &Overrides) {
    if overrides.units.is_empty() {
        return;
    }
    for (unit, o) in &overrides.units {
        if !initial.units.contains(unit) {
            initial.units.push(unit.clone());
        }
        if let Some(ac) = o.aircraft {
            if ac >= 0.0 {
                initial.aircraft_by_unit.insert(unit.clone(), ac.floor() as u32);
            }
        }
        let staffing = initial.staffing_by_unit.entry(unit.clone()).or_default();
        if let Some(pilot) = o.pilot {
            if pilot >= 0.0 {
                staffing.insert(Mos::Pilot, pilot.floor() as u32);
            }
        }
        if let Some(so) = o.so {
            if so >= 0.0 {
                staffing.insert(Mos::So, so.floor() as u32);
            }
        }
        if let Some(intel) = o.intel {
            if intel >= 0.0 {
                staffing.insert(Mos::Intel, intel.floor() as u32);
            }
        }
        if let Some(payload_by_type) = &o.payload_by_type {
            let unit_payloads = initial.payload_by_unit.entry(unit.clone()).or_default();
            for (ptype, val) in payload_by_type {
                if *val >= 0.0 {
                    unit_payloads.insert(ptype.clone(), val.floor() as u32);
                }
            }
        }
    }
    initial.overrides_applied = true;
}
