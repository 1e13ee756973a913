//! Per-run output shapes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityDayEntry;
use crate::state::InitialResources;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MissionStats {
    pub requested: u32,
    pub started: u32,
    pub completed: u32,
    pub rejected: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Rejections {
    pub aircraft: u32,
    pub pilot: u32,
    pub so: u32,
    pub intel: u32,
    pub payload: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DutyStats {
    pub requested: u32,
    pub filled: u32,
    pub unfilled: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Utilization {
    pub aircraft: f64,
    pub pilot: f64,
    pub so: f64,
    pub intel: f64,
    pub availability_factor_pilot: f64,
    pub availability_factor_so: f64,
    pub availability_factor_intel: f64,
    pub initial_crew_pilot: u32,
    pub initial_crew_so: u32,
    pub initial_crew_intel: u32,
    pub effective_crew_pilot: u32,
    pub effective_crew_so: u32,
    pub effective_crew_intel: u32,
    pub peak_concurrent_aircraft: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub name: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewAssignmentRecord {
    pub id: u32,
    pub start: f64,
    pub end: f64,
    pub shift: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissionCrew {
    pub pilots: Vec<CrewAssignmentRecord>,
    pub sos: Vec<CrewAssignmentRecord>,
    pub intel: Vec<CrewAssignmentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEvent {
    Mission {
        unit: String,
        mission_type: String,
        demand_time: f64,
        finish_time: f64,
        segments: Vec<TimelineSegment>,
        crew: MissionCrew,
    },
    Duty {
        duty_type: String,
        unit: String,
        mos: String,
        start: f64,
        end: f64,
        crew_id: u32,
    },
    UnfilledDuty {
        duty_type: String,
        unit: String,
        time: f64,
    },
    Rejection {
        time: f64,
        unit: String,
        mission_type: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Results {
    pub horizon_hours: f64,
    pub missions: MissionStats,
    pub rejections: Rejections,
    pub duties: DutyStats,
    pub utilization: HashMap<String, Utilization>,
    pub by_type: HashMap<String, MissionStats>,
    pub timeline: Vec<TimelineEvent>,
    pub availability_timeline: Vec<AvailabilityTimelineEntry>,
    pub initial_resources: InitialResources,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityTimelineEntry {
    pub day: u32,
    pub mos: String,
    pub availability_factor: f64,
    pub effective_crew: u32,
}

impl From<AvailabilityDayEntry> for AvailabilityTimelineEntry {
    fn from(e: AvailabilityDayEntry) -> Self {
        AvailabilityTimelineEntry {
            day: e.day,
            mos: e.mos.as_str().to_string(),
            availability_factor: e.availability_factor,
            effective_crew: e.effective_crew,
        }
    }
}
