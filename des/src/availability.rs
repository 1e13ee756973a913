//! Expected unavailability per MOS over the horizon. Used only to scale
//! raw headcount to effective headcount for reporting — never to gate
//! allocation, which the event-level `CrewQueue` already governs.

use std::collections::HashMap;

use crate::scenario::{Mos, PersonnelAvailability};

#[derive(Debug, Clone, Copy)]
pub struct AvailabilityDayEntry {
    pub day: u32,
    pub mos: Mos,
    pub availability_factor: f64,
    pub effective_crew: u32,
}

/// `(365 - unavailable_days_per_year) / 365`, clamped to `[0.1, 1.0]`.
pub fn availability_factor(avail: &PersonnelAvailability) -> f64 {
    let unavailable_days_per_year = avail.annual_commitment_days
        + avail.quarterly_commitment_days * 4.0
        + avail.monthly_commitment_days * 12.0;
    let raw = (365.0 - unavailable_days_per_year) / 365.0;
    raw.clamp(0.1, 1.0)
}

/// One entry per day of the horizon, per MOS with a configured
/// availability block, carrying the day's effective headcount (the
/// days-on/days-off cycle can move the count day to day even though the
/// factor itself is fixed for a given commitment profile).
pub fn build_availability_timeline(
    horizon_hours: f64,
    personnel_availability: &HashMap<Mos, PersonnelAvailability>,
    raw_total_by_mos: &HashMap<Mos, u32>,
) -> Vec<AvailabilityDayEntry> {
    let days = (horizon_hours / 24.0).ceil().max(0.0) as u32;
    let mut out = Vec::new();
    for mos in Mos::ALL {
        let Some(avail) = personnel_availability.get(&mos) else {
            continue;
        };
        let factor = availability_factor(avail);
        let total = raw_total_by_mos.get(&mos).copied().unwrap_or(0);
        let effective = ((total as f64) * factor).round() as u32;
        for day in 0..days {
            out.push(AvailabilityDayEntry {
                day,
                mos,
                availability_factor: factor,
                effective_crew: effective,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_is_clamped() {
        let avail = PersonnelAvailability {
            annual_commitment_days: 400.0,
            ..Default::default()
        };
        assert_eq!(availability_factor(&avail), 0.1);
        let avail2 = PersonnelAvailability::default();
        assert_eq!(availability_factor(&avail2), 1.0);
    }

    #[test]
    fn timeline_has_one_entry_per_day_per_mos() {
        let mut pa = HashMap::new();
        pa.insert(Mos::Pilot, PersonnelAvailability::default());
        let mut totals = HashMap::new();
        totals.insert(Mos::Pilot, 10);
        let timeline = build_availability_timeline(72.0, &pa, &totals);
        assert_eq!(timeline.len(), 3);
        assert!(timeline.iter().all(|e| e.mos == Mos::Pilot));
    }
}
