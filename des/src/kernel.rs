//! The DES event loop: mission dispatch, duty dispatch, and timeline
//! emission. Structured as one orchestrating function per run — load,
//! build pools, generate demand, loop events, compute stats — rather than
//! split into many small functions.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use vmu_sim_shared::{RunConfig, SimError};

use crate::availability::build_availability_timeline;
use crate::crew::{CrewQueue, ShiftAssignment};
use crate::demand::{generate_demand, DemandEvent, DemandKind, DutyType};
use crate::pool::EquipmentPool;
use crate::results::{
    CrewAssignmentRecord, DutyStats, MissionCrew, MissionStats, Rejections, Results,
    TimelineEvent, TimelineSegment, Utilization,
};
use crate::scenario::{CrewRotationSpec, Mos, Overrides, Scenario};
use crate::state::{apply_overrides, derive_initial_from_state, InitialResources, State};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunOptions {
    pub state: Option<State>,
    #[serde(default)]
    pub overrides: Option<Overrides>,
}

struct UnitState {
    aircraft: EquipmentPool,
    payloads: HashMap<String, EquipmentPool>,
    crew: HashMap<Mos, CrewQueue>,
    accepted_intervals: Vec<(f64, f64)>,
    duty_cycle_index: HashMap<DutyType, usize>,
}

fn build_unit_states(scenario: &Scenario, initial: &InitialResources) -> HashMap<String, UnitState> {
    let mut units = HashMap::new();
    for unit in &initial.units {
        let aircraft_total = initial.aircraft_by_unit.get(unit).copied().unwrap_or(0);
        let mut payloads = HashMap::new();
        if let Some(unit_payloads) = initial.payload_by_unit.get(unit) {
            for (ptype, count) in unit_payloads {
                payloads.insert(ptype.clone(), EquipmentPool::new(*count));
            }
        }
        let staffing = initial.staffing_by_unit.get(unit);
        let mut crew = HashMap::new();
        for mos in Mos::ALL {
            let total = staffing.and_then(|s| s.get(&mos)).copied().unwrap_or(0);
            let avail = scenario.personnel_availability.get(&mos).copied().unwrap_or_default();
            crew.insert(
                mos,
                CrewQueue::new(
                    total,
                    avail.work_schedule,
                    avail.daily_crew_rest_hours,
                    avail.duty_rotation_pool_size,
                ),
            );
        }
        units.insert(
            unit.clone(),
            UnitState {
                aircraft: EquipmentPool::new(aircraft_total),
                payloads,
                crew,
                accepted_intervals: Vec::new(),
                duty_cycle_index: HashMap::new(),
            },
        );
    }
    units
}

enum RejectionKind {
    Aircraft,
    Pilot,
    So,
    Intel,
    Payload,
}

impl RejectionKind {
    fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::Aircraft => "aircraft",
            RejectionKind::Pilot => "pilot",
            RejectionKind::So => "so",
            RejectionKind::Intel => "intel",
            RejectionKind::Payload => "payload",
        }
    }

    fn bump(&self, r: &mut Rejections) {
        match self {
            RejectionKind::Aircraft => r.aircraft += 1,
            RejectionKind::Pilot => r.pilot += 1,
            RejectionKind::So => r.so += 1,
            RejectionKind::Intel => r.intel += 1,
            RejectionKind::Payload => r.payload += 1,
        }
    }
}

fn mos_required_count(mt: &crate::scenario::MissionType, mos: Mos) -> u32 {
    match mos {
        Mos::Pilot => mt.required_aircrew.pilot,
        Mos::So => mt.required_aircrew.so,
        Mos::Intel => mt.required_aircrew.intel,
    }
}

fn rejection_kind_for_mos(mos: Mos) -> RejectionKind {
    match mos {
        Mos::Pilot => RejectionKind::Pilot,
        Mos::So => RejectionKind::So,
        Mos::Intel => RejectionKind::Intel,
    }
}

/// Duty lookahead: reserves crew for imminent non-ODO duty within
/// `lookahead.hours` so opportunistic mission allocation doesn't starve a
/// duty that's about to come due. A duty eligible for multiple MOS bumps
/// each counter, an accepted over-count kept as an integer reservation
/// rather than fractional.
fn compute_reservations(
    events: &[DemandEvent],
    from_index: usize,
    unit: &str,
    window_end: f64,
) -> HashMap<Mos, u32> {
    let mut reserved = HashMap::new();
    for ev in &events[from_index..] {
        if ev.time > window_end {
            break;
        }
        if let DemandKind::Duty {
            duty_type,
            unit: duty_unit,
            eligible_mos,
            ..
        } = &ev.kind
        {
            if *duty_type == DutyType::Odo || duty_unit != unit {
                continue;
            }
            for mos in eligible_mos {
                *reserved.entry(*mos).or_insert(0) += 1;
            }
        }
    }
    reserved
}

#[allow(clippy::too_many_arguments)]
fn shift_plan_for_mission(
    rotation: Option<&CrewRotationSpec>,
    hold_window: f64,
) -> (Vec<f64>, crate::scenario::CrewDistributionPolicy, bool) {
    match rotation {
        Some(spec) if spec.enabled && !spec.shifts_hours.is_empty() => {
            (spec.shifts_hours.clone(), spec.distribution, spec.force_sequential)
        }
        _ => (
            vec![hold_window],
            crate::scenario::CrewDistributionPolicy::Concentrate,
            false,
        ),
    }
}

fn push_rejection(
    results: &mut Results,
    kind: RejectionKind,
    time: f64,
    unit: &str,
    mission_type: &str,
) {
    results.missions.rejected += 1;
    kind.bump(&mut results.rejections);
    let bt = results.by_type.entry(mission_type.to_string()).or_default();
    bt.requested += 1;
    bt.rejected += 1;
    results.timeline.push(TimelineEvent::Rejection {
        time,
        unit: unit.to_string(),
        mission_type: mission_type.to_string(),
        reason: kind.as_str().to_string(),
    });
}

#[allow(clippy::too_many_arguments)]
fn dispatch_mission(
    scenario: &Scenario,
    mission_types: &HashMap<String, crate::scenario::MissionType>,
    unit_states: &mut HashMap<String, UnitState>,
    events: &[DemandEvent],
    event_index: usize,
    time: f64,
    mission_type_name: &str,
    unit: &str,
    results: &mut Results,
    rng: &mut ChaCha8Rng,
) {
    results.missions.requested += 1;
    let Some(mt) = mission_types.get(mission_type_name) else {
        return;
    };
    let Some(state) = unit_states.get_mut(unit) else {
        return;
    };

    let process_times = &scenario.process_times;
    let pre = process_times.preflight.as_ref().map(|d| d.sample(rng)).unwrap_or(0.0);
    let mut mount = 0.0;
    for ptype in &mt.required_payload_types {
        if let Some(d) = process_times.mount_times.get(ptype) {
            mount += d.sample(rng);
        }
    }
    let transit_in = mt.transit_in.as_ref().map(|d| d.sample(rng)).unwrap_or(0.0);
    let flight = mt.flight_time.sample(rng);
    let transit_out = mt.transit_out.as_ref().map(|d| d.sample(rng)).unwrap_or(0.0);
    let post = process_times.postflight.as_ref().map(|d| d.sample(rng)).unwrap_or(0.0);
    let turnaround = process_times.turnaround.as_ref().map(|d| d.sample(rng)).unwrap_or(0.0);

    let mission_span = pre + mount + transit_in + flight + transit_out + post + turnaround;
    let crew_hold = if scenario.hold_crew_during_process_times {
        mission_span
    } else {
        transit_in + flight + transit_out
    };

    let lookahead_window_end = if scenario.lookahead.enabled {
        time + scenario.lookahead.hours
    } else {
        time
    };
    let reserved = if scenario.lookahead.enabled {
        compute_reservations(events, event_index + 1, unit, lookahead_window_end)
    } else {
        HashMap::new()
    };

    // Availability check order: payload, aircraft, pilot, so, intel.
    for ptype in &mt.required_payload_types {
        let pool = state
            .payloads
            .entry(ptype.clone())
            .or_insert_with(|| EquipmentPool::new(0));
        if pool.available_at(time) < 1 {
            push_rejection(results, RejectionKind::Payload, time, unit, &mt.name);
            return;
        }
    }
    if state.aircraft.available_at(time) < 1 {
        push_rejection(results, RejectionKind::Aircraft, time, unit, &mt.name);
        return;
    }
    for mos in Mos::ALL {
        let need = mos_required_count(mt, mos);
        if need == 0 {
            continue;
        }
        let reserved_for_mos = reserved.get(&mos).copied().unwrap_or(0);
        let queue = state.crew.get(&mos).unwrap();
        let avail = queue.available_count(time, false).saturating_sub(reserved_for_mos);
        if avail < need {
            push_rejection(results, rejection_kind_for_mos(mos), time, unit, &mt.name);
            return;
        }
    }

    // Allocate: payload, aircraft, then crews. Roll back on any failure.
    let mut acquired_payloads: Vec<String> = Vec::new();
    let mut acquired_aircraft = false;
    let mut acquired_crew: Vec<(Mos, Vec<ShiftAssignment>)> = Vec::new();
    let mut failure: Option<RejectionKind> = None;

    for ptype in &mt.required_payload_types {
        let pool = state.payloads.get_mut(ptype).unwrap();
        if pool.try_acquire(time, mission_span, 1) {
            acquired_payloads.push(ptype.clone());
        } else {
            failure = Some(RejectionKind::Payload);
            break;
        }
    }

    if failure.is_none() {
        if state.aircraft.try_acquire(time, mission_span, 1) {
            acquired_aircraft = true;
        } else {
            failure = Some(RejectionKind::Aircraft);
        }
    }

    let mut crew_assignments: HashMap<Mos, Vec<CrewAssignmentRecord>> = HashMap::new();
    if failure.is_none() {
        let (shifts, distribution, force_sequential) =
            shift_plan_for_mission(mt.crew_rotation.as_ref(), crew_hold);
        for mos in Mos::ALL {
            let need = mos_required_count(mt, mos);
            if need == 0 {
                continue;
            }
            let queue = state.crew.get_mut(&mos).unwrap();
            match queue.try_acquire_shifts(
                time,
                &shifts,
                need,
                false,
                false,
                force_sequential,
                false,
                0.0,
                distribution,
                rng,
            ) {
                Some(assignments) => {
                    acquired_crew.push((mos, assignments.clone()));
                    crew_assignments.insert(
                        mos,
                        assignments
                            .into_iter()
                            .map(|a| CrewAssignmentRecord {
                                id: a.id,
                                start: a.start,
                                end: a.end,
                                shift: a.shift,
                            })
                            .collect(),
                    );
                }
                None => {
                    queue.record_denial(need);
                    failure = Some(rejection_kind_for_mos(mos));
                    break;
                }
            }
        }
    }

    if let Some(kind) = failure {
        // Roll back every hold acquired earlier in this dispatch: a failed
        // mid-sequence acquisition here indicates a race the pre-check
        // missed, and a rejected mission must not leak resources or
        // inflate utilization/efficiency/peak.
        for ptype in &acquired_payloads {
            if let Some(pool) = state.payloads.get_mut(ptype) {
                pool.release(time, mission_span, 1);
            }
        }
        if acquired_aircraft {
            state.aircraft.release(time, mission_span, 1);
        }
        for (mos, assignments) in &acquired_crew {
            let queue = state.crew.get_mut(mos).unwrap();
            queue.release_shifts(assignments, false, false, 0.0);
        }
        push_rejection(results, kind, time, unit, &mt.name);
        return;
    }

    let t0 = time;
    let t1 = t0 + pre;
    let t2 = t1 + mount;
    let t3 = t2 + transit_in;
    let t4 = t3 + flight;
    let t5 = t4 + transit_out;
    let t6 = t5 + post;
    let t7 = t6 + turnaround;

    state.accepted_intervals.push((t0, t6));

    results.missions.started += 1;
    let bt = results.by_type.entry(mt.name.clone()).or_default();
    bt.requested += 1;
    bt.started += 1;
    if t7 <= scenario.horizon_hours {
        results.missions.completed += 1;
        bt.completed += 1;
    }

    results.timeline.push(TimelineEvent::Mission {
        unit: unit.to_string(),
        mission_type: mt.name.clone(),
        demand_time: t0,
        finish_time: t7,
        segments: vec![
            TimelineSegment { name: "preflight".into(), start: t0, end: t1 },
            TimelineSegment { name: "mount".into(), start: t1, end: t2 },
            TimelineSegment { name: "transit_in".into(), start: t2, end: t3 },
            TimelineSegment { name: "flight".into(), start: t3, end: t4 },
            TimelineSegment { name: "transit_out".into(), start: t4, end: t5 },
            TimelineSegment { name: "postflight".into(), start: t5, end: t6 },
            TimelineSegment { name: "turnaround".into(), start: t6, end: t7 },
        ],
        crew: MissionCrew {
            pilots: crew_assignments.remove(&Mos::Pilot).unwrap_or_default(),
            sos: crew_assignments.remove(&Mos::So).unwrap_or_default(),
            intel: crew_assignments.remove(&Mos::Intel).unwrap_or_default(),
        },
    });
}

/// ODO is contingent on the unit's accepted-mission log: the covered span
/// is the intersection of the duty's scheduled window
/// with `[min(preflight_start), max(postflight_end)]` across every
/// accepted mission whose operational window overlaps that duty window.
fn odo_actual_coverage(intervals: &[(f64, f64)], window_start: f64, window_end: f64) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut any = false;
    for &(s, e) in intervals {
        if s < window_end && e > window_start {
            any = true;
            lo = lo.min(s);
            hi = hi.max(e);
        }
    }
    if !any {
        return None;
    }
    let covered_start = window_start.max(lo);
    let covered_end = window_end.min(hi);
    if covered_end <= covered_start {
        None
    } else {
        Some((covered_start, covered_end))
    }
}

fn dispatch_duty(
    unit_states: &mut HashMap<String, UnitState>,
    time: f64,
    duty_type: DutyType,
    unit: &str,
    shift_duration: f64,
    eligible_mos: &[Mos],
    respect_work_schedule: bool,
    duty_recovery_hours: f64,
    results: &mut Results,
    rng: &mut ChaCha8Rng,
) {
    let Some(state) = unit_states.get_mut(unit) else {
        return;
    };

    let (actual_start, duration) = if duty_type == DutyType::Odo {
        match odo_actual_coverage(&state.accepted_intervals, time, time + shift_duration) {
            Some((s, e)) => (s, e - s),
            None => return,
        }
    } else {
        (time, shift_duration)
    };

    results.duties.requested += 1;

    if eligible_mos.is_empty() {
        results.duties.unfilled += 1;
        results.timeline.push(TimelineEvent::UnfilledDuty {
            duty_type: duty_type.as_str().to_string(),
            unit: unit.to_string(),
            time,
        });
        return;
    }

    let idx = *state.duty_cycle_index.entry(duty_type).or_insert(0);
    state.duty_cycle_index.insert(duty_type, (idx + 1) % eligible_mos.len());
    let mut order: Vec<Mos> = Vec::with_capacity(eligible_mos.len());
    for i in 0..eligible_mos.len() {
        order.push(eligible_mos[(idx + i) % eligible_mos.len()]);
    }

    let is_continuous_duty = duty_type == DutyType::Odo;
    for mos in order {
        let queue = state.crew.get_mut(&mos).unwrap();
        if let Some(assignments) = queue.try_acquire_shifts(
            actual_start,
            &[duration],
            1,
            true,
            is_continuous_duty,
            false,
            !respect_work_schedule,
            duty_recovery_hours,
            crate::scenario::CrewDistributionPolicy::Concentrate,
            rng,
        ) {
            results.duties.filled += 1;
            let a = assignments[0];
            results.timeline.push(TimelineEvent::Duty {
                duty_type: duty_type.as_str().to_string(),
                unit: unit.to_string(),
                mos: mos.as_str().to_string(),
                start: a.start,
                end: a.end,
                crew_id: a.id,
            });
            return;
        }
        queue.record_denial(1);
    }

    results.duties.unfilled += 1;
    results.timeline.push(TimelineEvent::UnfilledDuty {
        duty_type: duty_type.as_str().to_string(),
        unit: unit.to_string(),
        time,
    });
}

pub fn run_simulation_internal(
    scenario: Scenario,
    options: RunOptions,
    config: RunConfig,
) -> Result<Results, SimError> {
    run_simulation_internal_ref(&scenario, &options, &config)
}

pub fn run_simulation_internal_ref(
    scenario: &Scenario,
    options: &RunOptions,
    config: &RunConfig,
) -> Result<Results, SimError> {
    scenario.validate()?;

    let mut rng = match config.rng_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let horizon = scenario.horizon_hours;
    let mission_types: HashMap<String, crate::scenario::MissionType> = scenario
        .mission_types
        .iter()
        .map(|mt| (mt.name.clone(), mt.clone()))
        .collect();

    let state = options
        .state
        .as_ref()
        .ok_or_else(|| SimError::InvalidState("simulation requires a state snapshot".into()))?;
    let mut initial = derive_initial_from_state(state)?;

    if let Some(overrides) = &options.overrides {
        apply_overrides(&mut initial, overrides);
    }

    let mut unit_states = build_unit_states(scenario, &initial);
    let units: Vec<String> = initial.units.clone();

    let events = generate_demand(scenario, &units, &mut rng);

    let mut results = Results {
        horizon_hours: horizon,
        missions: MissionStats::default(),
        rejections: Rejections::default(),
        duties: DutyStats::default(),
        utilization: HashMap::new(),
        by_type: HashMap::new(),
        timeline: Vec::new(),
        availability_timeline: Vec::new(),
        initial_resources: initial.clone(),
    };

    for i in 0..events.len() {
        let ev = &events[i];
        if ev.time > horizon {
            continue;
        }
        match ev.kind.clone() {
            DemandKind::Mission { mission_type, unit } => {
                dispatch_mission(
                    scenario,
                    &mission_types,
                    &mut unit_states,
                    &events,
                    i,
                    ev.time,
                    &mission_type,
                    &unit,
                    &mut results,
                    &mut rng,
                );
            }
            DemandKind::Duty {
                duty_type,
                unit,
                shift_duration,
                eligible_mos,
                respect_work_schedule,
                duty_recovery_hours,
                ..
            } => {
                dispatch_duty(
                    &mut unit_states,
                    ev.time,
                    duty_type,
                    &unit,
                    shift_duration,
                    &eligible_mos,
                    respect_work_schedule,
                    duty_recovery_hours,
                    &mut results,
                    &mut rng,
                );
            }
        }
    }

    let mut raw_total_by_mos: HashMap<Mos, u32> = HashMap::new();
    for unit in &units {
        let state = unit_states.get(unit).unwrap();
        let mut util = Utilization {
            aircraft: round3(state.aircraft.utilization()),
            peak_concurrent_aircraft: state.aircraft.peak_concurrent(),
            ..Default::default()
        };
        for mos in Mos::ALL {
            let queue = state.crew.get(&mos).unwrap();
            let avail = scenario.personnel_availability.get(&mos).copied().unwrap_or_default();
            let factor = crate::availability::availability_factor(&avail);
            *raw_total_by_mos.entry(mos).or_insert(0) += queue.raw_total();
            match mos {
                Mos::Pilot => {
                    util.pilot = round3(queue.utilization());
                    util.availability_factor_pilot = factor;
                    util.initial_crew_pilot = queue.raw_total();
                    util.effective_crew_pilot = queue.effective_total(factor);
                }
                Mos::So => {
                    util.so = round3(queue.utilization());
                    util.availability_factor_so = factor;
                    util.initial_crew_so = queue.raw_total();
                    util.effective_crew_so = queue.effective_total(factor);
                }
                Mos::Intel => {
                    util.intel = round3(queue.utilization());
                    util.availability_factor_intel = factor;
                    util.initial_crew_intel = queue.raw_total();
                    util.effective_crew_intel = queue.effective_total(factor);
                }
            }
        }
        results.utilization.insert(unit.clone(), util);
    }

    results.availability_timeline = build_availability_timeline(
        horizon,
        &scenario.personnel_availability,
        &raw_total_by_mos,
    )
    .into_iter()
    .map(Into::into)
    .collect();

    Ok(results)
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::tests_support::minimal_scenario;
    use crate::scenario::{Aircrew, Demand, DemandSpec, MissionType};
    use crate::state::{State, StateTable};
    use serde_json::json;
    use std::collections::HashMap as Map;

    fn mock_state(units: &[&str], aircraft: u32, pilots: u32, sos: u32) -> State {
        let mut tables = Map::new();
        let mut unit_rows = Vec::new();
        let mut aircraft_rows = Vec::new();
        let mut staffing_rows = Vec::new();
        for u in units {
            unit_rows.push(Map::from([("Unit".to_string(), json!(u))]));
            for _ in 0..aircraft {
                aircraft_rows.push(Map::from([
                    ("Unit".to_string(), json!(u)),
                    ("Status".to_string(), json!("FMC")),
                ]));
            }
            for _ in 0..pilots {
                staffing_rows.push(Map::from([
                    ("Unit Name".to_string(), json!(u)),
                    ("MOS Number".to_string(), json!("7318")),
                ]));
            }
            for _ in 0..sos {
                staffing_rows.push(Map::from([
                    ("Unit Name".to_string(), json!(u)),
                    ("MOS Number".to_string(), json!("7314")),
                ]));
            }
        }
        tables.insert("v_unit".into(), StateTable { rows: unit_rows });
        tables.insert("v_aircraft".into(), StateTable { rows: aircraft_rows });
        tables.insert("v_staffing".into(), StateTable { rows: staffing_rows });
        tables.insert("v_payload".into(), StateTable { rows: Vec::new() });
        State { tables }
    }

    fn isr_scenario(horizon: f64, every: f64) -> Scenario {
        let mut s = minimal_scenario();
        s.horizon_hours = horizon;
        s.mission_types = vec![MissionType {
            name: "ISR".into(),
            required_aircrew: Aircrew { pilot: 1, so: 1, intel: 0 },
            required_payload_types: vec!["SkyTower II".into()],
            flight_time: vmu_sim_shared::Distribution::Deterministic { value_hours: 2.0 },
            transit_in: None,
            transit_out: None,
            crew_rotation: None,
        }];
        s.demand = vec![Demand {
            mission_type: "ISR".into(),
            spec: DemandSpec::Deterministic {
                every_hours: every,
                start_at_hours: 0.0,
            },
        }];
        s
    }

    #[test]
    fn scenario_1_abundant_resources_completes_all() {
        let scenario = isr_scenario(24.0, 8.0);
        let state = mock_state(&["A"], 2, 3, 3);
        let mut overrides = Overrides::default();
        overrides.units.insert(
            "A".into(),
            crate::scenario::UnitOverrides {
                payload_by_type: Some(Map::from([("SkyTower II".to_string(), 6.0)])),
                ..Default::default()
            },
        );
        let options = RunOptions {
            state: Some(state),
            overrides: Some(overrides),
        };
        let config = RunConfig { rng_seed: Some(1), ..Default::default() };
        let results = run_simulation_internal_ref(&scenario, &options, &config).unwrap();
        assert_eq!(results.missions.requested, 3);
        assert_eq!(results.missions.rejected, 0);
        assert_eq!(results.missions.completed, 3);
    }

    #[test]
    fn scenario_2_aircraft_bottleneck_rejects_all() {
        let scenario = isr_scenario(24.0, 8.0);
        let state = mock_state(&["A"], 0, 3, 3);
        let options = RunOptions { state: Some(state), overrides: None };
        let config = RunConfig { rng_seed: Some(1), ..Default::default() };
        let results = run_simulation_internal_ref(&scenario, &options, &config).unwrap();
        assert_eq!(results.missions.rejected, 3);
        assert_eq!(results.rejections.aircraft, 3);
        assert_eq!(results.rejections.pilot, 0);
        assert_eq!(results.rejections.so, 0);
        assert_eq!(results.rejections.payload, 0);
    }

    #[test]
    fn zero_horizon_is_empty() {
        let scenario = isr_scenario(0.0, 8.0);
        let state = mock_state(&["A"], 2, 3, 3);
        let options = RunOptions { state: Some(state), overrides: None };
        let config = RunConfig::default();
        let results = run_simulation_internal_ref(&scenario, &options, &config).unwrap();
        assert_eq!(results.missions.requested, 0);
        assert!(results.timeline.is_empty());
    }

    #[test]
    fn no_demand_yields_zero_requested() {
        let mut scenario = isr_scenario(24.0, 8.0);
        scenario.demand.clear();
        let state = mock_state(&["A"], 2, 3, 3);
        let options = RunOptions { state: Some(state), overrides: None };
        let config = RunConfig::default();
        let results = run_simulation_internal_ref(&scenario, &options, &config).unwrap();
        assert_eq!(results.missions.requested, 0);
        assert!(results.timeline.iter().all(|e| !matches!(e, TimelineEvent::Rejection { .. })));
    }

    #[test]
    fn invariant_started_plus_rejected_equals_requested() {
        let scenario = isr_scenario(48.0, 3.0);
        let state = mock_state(&["A"], 1, 1, 1);
        let mut overrides = Overrides::default();
        overrides.units.insert(
            "A".into(),
            crate::scenario::UnitOverrides {
                payload_by_type: Some(Map::from([("SkyTower II".to_string(), 1.0)])),
                ..Default::default()
            },
        );
        let options = RunOptions { state: Some(state), overrides: Some(overrides) };
        let config = RunConfig { rng_seed: Some(7), ..Default::default() };
        let results = run_simulation_internal_ref(&scenario, &options, &config).unwrap();
        assert_eq!(
            results.missions.started + results.missions.rejected,
            results.missions.requested
        );
        assert!(results.missions.completed <= results.missions.started);
    }

    #[test]
    fn odo_with_no_accepted_missions_is_dropped() {
        let mut scenario = isr_scenario(24.0, 8.0);
        scenario.duty_requirements.odo.enabled = true;
        scenario.duty_requirements.odo.shifts_per_day = 1;
        scenario.duty_requirements.odo.hours_per_shift = 24.0;
        scenario.duty_requirements.odo.eligible_mos.pilot = true;
        // No payload means every mission is rejected on payload, so no
        // accepted-mission interval exists to align the ODO against.
        let state = mock_state(&["A"], 2, 3, 3);
        let options = RunOptions { state: Some(state), overrides: None };
        let config = RunConfig { rng_seed: Some(1), ..Default::default() };
        let results = run_simulation_internal_ref(&scenario, &options, &config).unwrap();
        assert_eq!(results.missions.rejected, results.missions.requested);
        assert_eq!(results.duties.requested, 0);
    }
}
