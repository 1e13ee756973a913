//! Produces the sorted stream of mission and duty demand events for a
//! horizon: mission events (deterministic or Poisson), assigned a unit at
//! generation time via weighted/round-robin split, plus duty events on the
//! ODO/SDO/SDNCO grid.

use rand::Rng;
use vmu_sim_shared::Distribution;

use crate::scenario::{DemandSpec, DutyRequirement, Mos, Scenario, UnitAssignmentPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DutyType {
    Odo,
    Sdo,
    Sdnco,
}

impl DutyType {
    pub fn as_str(self) -> &'static str {
        match self {
            DutyType::Odo => "odo",
            DutyType::Sdo => "sdo",
            DutyType::Sdnco => "sdnco",
        }
    }
}

#[derive(Debug, Clone)]
pub enum DemandKind {
    Mission {
        mission_type: String,
        unit: String,
    },
    Duty {
        duty_type: DutyType,
        unit: String,
        shift_duration: f64,
        day_id: u32,
        shift_id: u32,
        eligible_mos: Vec<Mos>,
        respect_work_schedule: bool,
        duty_recovery_hours: f64,
    },
}

impl DemandKind {
    fn sort_rank(&self) -> u8 {
        match self {
            DemandKind::Mission { .. } => 0,
            DemandKind::Duty { .. } => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemandEvent {
    pub time: f64,
    pub kind: DemandKind,
}

fn pick_unit(units: &[String], scenario: &Scenario, index: usize, rng: &mut impl Rng) -> Option<String> {
    if units.is_empty() {
        return None;
    }
    let split = &scenario.unit_policy.mission_split;
    let use_round_robin =
        scenario.unit_policy.assignment == UnitAssignmentPolicy::RoundRobin || split.is_empty();
    if use_round_robin {
        return Some(units[index % units.len()].clone());
    }
    let weights: Vec<(String, f64)> = units
        .iter()
        .map(|u| (u.clone(), split.get(u).copied().unwrap_or(0.0)))
        .filter(|(_, w)| *w > 0.0)
        .collect();
    if weights.is_empty() {
        return Some(units[index % units.len()].clone());
    }
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    let r: f64 = rng.gen::<f64>() * total;
    let mut acc = 0.0;
    for (u, w) in &weights {
        acc += w;
        if r <= acc {
            return Some(u.clone());
        }
    }
    Some(weights.last().unwrap().0.clone())
}

fn generate_mission_events(
    scenario: &Scenario,
    units: &[String],
    rng: &mut impl Rng,
) -> Vec<DemandEvent> {
    let horizon = scenario.horizon_hours;
    let mut events = Vec::new();
    let mut index = 0usize;

    for d in &scenario.demand {
        match &d.spec {
            DemandSpec::Deterministic {
                every_hours,
                start_at_hours,
            } => {
                let mut t = *start_at_hours;
                while t < horizon {
                    if let Some(unit) = pick_unit(units, scenario, index, rng) {
                        events.push(DemandEvent {
                            time: t,
                            kind: DemandKind::Mission {
                                mission_type: d.mission_type.clone(),
                                unit,
                            },
                        });
                        index += 1;
                    }
                    t += every_hours;
                }
            }
            DemandSpec::Poisson { rate_per_hour } => {
                let dist = Distribution::Exponential {
                    rate_per_hour: *rate_per_hour,
                };
                let mut t = 0.0;
                loop {
                    t += dist.sample(rng);
                    if t >= horizon {
                        break;
                    }
                    if let Some(unit) = pick_unit(units, scenario, index, rng) {
                        events.push(DemandEvent {
                            time: t,
                            kind: DemandKind::Mission {
                                mission_type: d.mission_type.clone(),
                                unit,
                            },
                        });
                        index += 1;
                    }
                }
            }
        }
    }
    events
}

/// Duty events are scoped per unit: each unit runs its own ODO/SDO/SDNCO
/// rotation against its own `CrewQueue`s and, for ODO, its own accepted-
/// mission log — alignment needs a single unit's mission timeline to
/// compute coverage against.
fn generate_duty_events(scenario: &Scenario, units: &[String]) -> Vec<DemandEvent> {
    let horizon = scenario.horizon_hours;
    let mut events = Vec::new();
    let requirements: [(DutyType, &DutyRequirement); 3] = [
        (DutyType::Odo, &scenario.duty_requirements.odo),
        (DutyType::Sdo, &scenario.duty_requirements.sdo),
        (DutyType::Sdnco, &scenario.duty_requirements.sdnco),
    ];

    for unit in units {
        for (duty_type, req) in requirements {
            if !req.enabled || req.shifts_per_day == 0 {
                continue;
            }
            let shift_interval = 24.0 / req.shifts_per_day as f64;
            let eligible_mos: Vec<Mos> = req.eligible_mos.iter().collect();
            if eligible_mos.is_empty() {
                continue;
            }
            let mut day = 0u32;
            while (day as f64) * 24.0 < horizon {
                for shift_id in 0..req.shifts_per_day {
                    let t =
                        (day as f64) * 24.0 + req.start_hour + (shift_id as f64) * shift_interval;
                    if t >= horizon {
                        continue;
                    }
                    events.push(DemandEvent {
                        time: t,
                        kind: DemandKind::Duty {
                            duty_type,
                            unit: unit.clone(),
                            shift_duration: req.hours_per_shift,
                            day_id: day,
                            shift_id,
                            eligible_mos: eligible_mos.clone(),
                            respect_work_schedule: req.respect_work_schedule,
                            duty_recovery_hours: req.duty_recovery_hours,
                        },
                    });
                }
                day += 1;
            }
        }
    }
    events
}

/// Generates and sorts demand for the horizon: primary key ascending time,
/// missions before duties at equal time, stable at identical keys.
pub fn generate_demand(scenario: &Scenario, units: &[String], rng: &mut impl Rng) -> Vec<DemandEvent> {
    let mut events = generate_mission_events(scenario, units, rng);
    events.extend(generate_duty_events(scenario, units));
    events.sort_by(|a, b| {
        a.time
            .partial_cmp(&b.time)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.kind.sort_rank().cmp(&b.kind.sort_rank()))
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Aircrew, MissionType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scenario_with_deterministic_demand(every: f64, horizon: f64) -> Scenario {
        let mut s = crate::tests_support::minimal_scenario();
        s.horizon_hours = horizon;
        s.demand.push(crate::scenario::Demand {
            mission_type: "ISR".into(),
            spec: DemandSpec::Deterministic {
                every_hours: every,
                start_at_hours: 0.0,
            },
        });
        s
    }

    #[test]
    fn deterministic_emits_expected_count() {
        let scenario = scenario_with_deterministic_demand(8.0, 24.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let events = generate_demand(&scenario, &["A".to_string()], &mut rng);
        let missions = events
            .iter()
            .filter(|e| matches!(e.kind, DemandKind::Mission { .. }))
            .count();
        assert_eq!(missions, 3);
    }

    #[test]
    fn missions_sort_before_duties_at_equal_time() {
        let mut scenario = scenario_with_deterministic_demand(24.0, 24.0);
        scenario.duty_requirements.sdo.enabled = true;
        scenario.duty_requirements.sdo.shifts_per_day = 1;
        scenario.duty_requirements.sdo.start_hour = 0.0;
        scenario.duty_requirements.sdo.eligible_mos.pilot = true;
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let events = generate_demand(&scenario, &["A".to_string()], &mut rng);
        assert!(matches!(events[0].kind, DemandKind::Mission { .. }));
    }

    #[test]
    fn zero_split_unit_receives_no_missions() {
        let mut scenario = scenario_with_deterministic_demand(4.0, 48.0);
        scenario.unit_policy.mission_split.insert("A".into(), 1.0);
        scenario.unit_policy.mission_split.insert("B".into(), 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let events = generate_demand(&scenario, &["A".to_string(), "B".to_string()], &mut rng);
        for e in &events {
            if let DemandKind::Mission { unit, .. } = &e.kind {
                assert_eq!(unit, "A");
            }
        }
    }

    #[allow(dead_code)]
    fn unused(_: Aircrew, _: MissionType) {}
}

#[cfg(test)]
pub mod tests_support {
    use crate::scenario::*;
    use std::collections::HashMap;
    use vmu_sim_shared::Distribution;

    pub fn minimal_scenario() -> Scenario {
        Scenario {
            name: None,
            horizon_hours: 24.0,
            demand: Vec::new(),
            mission_types: vec![MissionType {
                name: "ISR".into(),
                required_aircrew: Aircrew {
                    pilot: 1,
                    so: 1,
                    intel: 0,
                },
                required_payload_types: Vec::new(),
                flight_time: Distribution::Deterministic { value_hours: 2.0 },
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
}
