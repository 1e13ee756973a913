//! The immutable scenario input. A strongly-typed struct with explicit
//! optional fields — the path-alias table in the Monte Carlo crate is the
//! only place external naming touches this shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vmu_sim_shared::{Distribution, SimError};

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Aircrew {
    #[serde(default)]
    pub pilot: u32,
    #[serde(default)]
    pub so: u32,
    #[serde(default)]
    pub intel: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewDistributionPolicy {
    Concentrate,
    Rotate,
    Random,
}

impl Default for CrewDistributionPolicy {
    fn default() -> Self {
        CrewDistributionPolicy::Concentrate
    }
}

/// A mission's optional multi-shift crew-rotation spec. When absent, the
/// kernel treats the mission as one shift spanning the whole crew-hold
/// window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CrewRotationSpec {
    #[serde(default)]
    pub enabled: bool,
    /// Durations of each shift, hours. When empty the hold window is used
    /// as a single shift.
    #[serde(default)]
    pub shifts_hours: Vec<f64>,
    #[serde(default)]
    pub distribution: CrewDistributionPolicy,
    #[serde(default)]
    pub force_sequential: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MissionType {
    pub name: String,
    #[serde(default)]
    pub required_aircrew: Aircrew,
    #[serde(default)]
    pub required_payload_types: Vec<String>,
    pub flight_time: Distribution,
    pub transit_in: Option<Distribution>,
    pub transit_out: Option<Distribution>,
    pub crew_rotation: Option<CrewRotationSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum DemandSpec {
    Deterministic {
        every_hours: f64,
        #[serde(default)]
        start_at_hours: f64,
    },
    Poisson {
        rate_per_hour: f64,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Demand {
    pub mission_type: String,
    #[serde(flatten)]
    pub spec: DemandSpec,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessTimes {
    pub preflight: Option<Distribution>,
    pub postflight: Option<Distribution>,
    pub turnaround: Option<Distribution>,
    #[serde(default)]
    pub mount_times: HashMap<String, Distribution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitAssignmentPolicy {
    Weighted,
    RoundRobin,
}

impl Default for UnitAssignmentPolicy {
    fn default() -> Self {
        UnitAssignmentPolicy::Weighted
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UnitPolicy {
    #[serde(default)]
    pub assignment: UnitAssignmentPolicy,
    #[serde(default)]
    pub mission_split: HashMap<String, f64>,
}

/// Per-MOS working pattern. `stagger_days` offsets each member's
/// days-on cycle by `stagger_days * member_index` so a queue isn't
/// entirely on/off at once.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkSchedule {
    #[serde(default = "WorkSchedule::default_days_on")]
    pub days_on: u32,
    #[serde(default = "WorkSchedule::default_days_off")]
    pub days_off: u32,
    #[serde(default)]
    pub daily_start_hour: f64,
    #[serde(default)]
    pub stagger_days: f64,
    #[serde(default)]
    pub split_enabled: bool,
    #[serde(default = "WorkSchedule::default_split_percent")]
    pub split_percent: f64,
}

impl WorkSchedule {
    fn default_days_on() -> u32 {
        7
    }
    fn default_days_off() -> u32 {
        0
    }
    fn default_split_percent() -> f64 {
        50.0
    }
}

impl Default for WorkSchedule {
    fn default() -> Self {
        WorkSchedule {
            days_on: Self::default_days_on(),
            days_off: Self::default_days_off(),
            daily_start_hour: 0.0,
            stagger_days: 0.0,
            split_enabled: false,
            split_percent: Self::default_split_percent(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PersonnelAvailability {
    #[serde(default)]
    pub work_schedule: WorkSchedule,
    #[serde(default)]
    pub daily_crew_rest_hours: f64,
    #[serde(default)]
    pub annual_commitment_days: f64,
    #[serde(default)]
    pub quarterly_commitment_days: f64,
    #[serde(default)]
    pub monthly_commitment_days: f64,
    /// Restricts rotating-duty eligibility to members with `id < this`.
    /// Fixed at queue construction.
    #[serde(default)]
    pub duty_rotation_pool_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EligibleMos {
    #[serde(default)]
    pub pilot: bool,
    #[serde(default)]
    pub so: bool,
    #[serde(default)]
    pub intel: bool,
}

impl EligibleMos {
    pub fn iter(&self) -> impl Iterator<Item = Mos> {
        let flags = [
            (self.pilot, Mos::Pilot),
            (self.so, Mos::So),
            (self.intel, Mos::Intel),
        ];
        flags
            .into_iter()
            .filter(|(on, _)| *on)
            .map(|(_, m)| m)
            .collect::<Vec<_>>()
            .into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mos {
    Pilot,
    So,
    Intel,
}

impl Mos {
    pub const ALL: [Mos; 3] = [Mos::Pilot, Mos::So, Mos::Intel];

    pub fn as_str(self) -> &'static str {
        match self {
            Mos::Pilot => "pilot",
            Mos::So => "so",
            Mos::Intel => "intel",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DutyRequirement {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "DutyRequirement::default_shifts_per_day")]
    pub shifts_per_day: u32,
    #[serde(default = "DutyRequirement::default_hours_per_shift")]
    pub hours_per_shift: f64,
    #[serde(default)]
    pub start_hour: f64,
    #[serde(default)]
    pub eligible_mos: EligibleMos,
    #[serde(default)]
    pub duty_recovery_hours: f64,
    #[serde(default)]
    pub respect_work_schedule: bool,
}

impl DutyRequirement {
    fn default_shifts_per_day() -> u32 {
        1
    }
    fn default_hours_per_shift() -> f64 {
        24.0
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DutyRequirements {
    #[serde(default)]
    pub odo: DutyRequirement,
    #[serde(default)]
    pub sdo: DutyRequirement,
    #[serde(default)]
    pub sdnco: DutyRequirement,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Lookahead {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub hours: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Scenario {
    pub name: Option<String>,
    pub horizon_hours: f64,
    #[serde(default)]
    pub demand: Vec<Demand>,
    pub mission_types: Vec<MissionType>,
    #[serde(default)]
    pub process_times: ProcessTimes,
    #[serde(default)]
    pub hold_crew_during_process_times: bool,
    #[serde(default)]
    pub duty_requirements: DutyRequirements,
    #[serde(default)]
    pub lookahead: Lookahead,
    #[serde(default)]
    pub personnel_availability: HashMap<Mos, PersonnelAvailability>,
    #[serde(default)]
    pub unit_policy: UnitPolicy,
}

impl Scenario {
    /// Fatal, up-front validation: shape/parameter errors surface before
    /// any work is done, never mid-run.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.horizon_hours < 0.0 {
            return Err(SimError::InvalidScenario(format!(
                "horizon_hours must be >= 0, got {}",
                self.horizon_hours
            )));
        }
        if self.mission_types.is_empty() && !self.demand.is_empty() {
            return Err(SimError::InvalidScenario(
                "demand references mission_types but none are defined".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for mt in &self.mission_types {
            if !seen.insert(mt.name.clone()) {
                return Err(SimError::InvalidScenario(format!(
                    "duplicate mission_type name '{}'",
                    mt.name
                )));
            }
            mt.flight_time.validate()?;
            if let Some(d) = &mt.transit_in {
                d.validate()?;
            }
            if let Some(d) = &mt.transit_out {
                d.validate()?;
            }
        }

        for d in &self.demand {
            if !self.mission_types.iter().any(|mt| mt.name == d.mission_type) {
                return Err(SimError::InvalidScenario(format!(
                    "demand references unknown mission_type '{}'",
                    d.mission_type
                )));
            }
            match &d.spec {
                DemandSpec::Deterministic { every_hours, .. } if *every_hours <= 0.0 => {
                    return Err(SimError::InvalidParameter(format!(
                        "deterministic demand every_hours must be > 0, got {every_hours}"
                    )))
                }
                DemandSpec::Poisson { rate_per_hour } if *rate_per_hour <= 0.0 => {
                    return Err(SimError::InvalidParameter(format!(
                        "poisson demand rate_per_hour must be > 0, got {rate_per_hour}"
                    )))
                }
                _ => {}
            }
        }

        if let Some(d) = &self.process_times.preflight {
            d.validate()?;
        }
        if let Some(d) = &self.process_times.postflight {
            d.validate()?;
        }
        if let Some(d) = &self.process_times.turnaround {
            d.validate()?;
        }
        for d in self.process_times.mount_times.values() {
            d.validate()?;
        }

        let split_sum: f64 = self.unit_policy.mission_split.values().sum();
        if split_sum > 1.0 + 1e-9 {
            return Err(SimError::InvalidScenario(format!(
                "unit_policy.mission_split sums to {split_sum}, must be <= 1"
            )));
        }
        for (unit, frac) in &self.unit_policy.mission_split {
            if *frac < 0.0 {
                return Err(SimError::InvalidScenario(format!(
                    "unit_policy.mission_split['{unit}'] is negative"
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UnitOverrides {
    pub aircraft: Option<f64>,
    pub pilot: Option<f64>,
    pub so: Option<f64>,
    pub intel: Option<f64>,
    pub payload_by_type: Option<HashMap<String, f64>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Overrides {
    #[serde(default)]
    pub units: HashMap<String, UnitOverrides>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversubscribed_split() {
        let mut scenario = minimal_scenario();
        scenario
            .unit_policy
            .mission_split
            .insert("A".into(), 0.7);
        scenario
            .unit_policy
            .mission_split
            .insert("B".into(), 0.5);
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn rejects_unknown_demand_mission_type() {
        let mut scenario = minimal_scenario();
        scenario.demand.push(Demand {
            mission_type: "nonexistent".into(),
            spec: DemandSpec::Poisson { rate_per_hour: 1.0 },
        });
        assert!(scenario.validate().is_err());
    }

    fn minimal_scenario() -> Scenario {
        Scenario {
            name: None,
            horizon_hours: 24.0,
            demand: Vec::new(),
            mission_types: vec![MissionType {
                name: "ISR".into(),
                required_aircrew: Aircrew::default(),
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
