//! Crew pool with work schedules, shift split, crew-rest, and fair-rotation
//! duty counters. Built in the idiom of `pool.rs` (denial counters, a
//! `try_acquire`-shaped boolean/Option API) generalized to per-member duty
//! accounting and shift windows.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::scenario::{CrewDistributionPolicy, WorkSchedule};

const DUTY_CYCLE_RESET_HOURS: f64 = 720.0;

#[derive(Debug, Clone, Copy)]
pub struct CrewMember {
    pub id: u32,
    pub available_at: f64,
    pub mission_count: u32,
    pub shift: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct ShiftAssignment {
    pub id: u32,
    pub start: f64,
    pub end: f64,
    pub shift: u8,
}

#[derive(Debug, Clone)]
pub struct CrewQueue {
    total: u32,
    crew: Vec<CrewMember>,
    work_schedule: WorkSchedule,
    crew_rest_hours: f64,
    duty_assignment_count: std::collections::HashMap<u32, u32>,
    duty_cycle_reset_time: f64,
    duty_rotation_pool_size: Option<u32>,
    used_crew_ids: std::collections::HashSet<u32>,
    busy_time: f64,
    allocations: u32,
    denials: u32,
}

impl CrewQueue {
    pub fn new(
        total: u32,
        work_schedule: WorkSchedule,
        crew_rest_hours: f64,
        duty_rotation_pool_size: Option<u32>,
    ) -> Self {
        let shift1_count = if work_schedule.split_enabled {
            ((total as f64) * work_schedule.split_percent / 100.0).round() as u32
        } else {
            total
        };
        let crew = (0..total)
            .map(|i| CrewMember {
                id: i,
                available_at: f64::NEG_INFINITY,
                mission_count: 0,
                shift: if i < shift1_count { 1 } else { 2 },
            })
            .collect();
        CrewQueue {
            total,
            crew,
            work_schedule,
            crew_rest_hours,
            duty_assignment_count: std::collections::HashMap::new(),
            duty_cycle_reset_time: 0.0,
            duty_rotation_pool_size,
            used_crew_ids: std::collections::HashSet::new(),
            busy_time: 0.0,
            allocations: 0,
            denials: 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    fn in_days_on(&self, member_index: usize, t: f64) -> bool {
        let ws = &self.work_schedule;
        if ws.days_off == 0 {
            return true;
        }
        let cycle = (ws.days_on + ws.days_off) as f64 * 24.0;
        if cycle <= 0.0 {
            return true;
        }
        let phase = (t - ws.stagger_days * member_index as f64 * 24.0 - ws.daily_start_hour)
            .rem_euclid(cycle);
        phase < ws.days_on as f64 * 24.0
    }

    fn in_working_hours(&self, shift: u8, t: f64) -> bool {
        let ws = &self.work_schedule;
        let working_hours = (24.0 - self.crew_rest_hours).max(0.0);
        if working_hours <= 0.0 {
            return false;
        }
        let shift_start = if shift == 2 {
            (ws.daily_start_hour + 12.0).rem_euclid(24.0)
        } else {
            ws.daily_start_hour.rem_euclid(24.0)
        };
        let hour_of_day = t.rem_euclid(24.0);
        let offset = (hour_of_day - shift_start).rem_euclid(24.0);
        offset < working_hours
    }

    fn is_available(&self, member_index: usize, t: f64, ignore_schedule: bool) -> bool {
        let member = &self.crew[member_index];
        if member.available_at > t {
            return false;
        }
        ignore_schedule
            || (self.in_days_on(member_index, t) && self.in_working_hours(member.shift, t))
    }

    fn eligible_indices(&self, rotating_duty: bool) -> Vec<usize> {
        let mut idxs: Vec<usize> = (0..self.crew.len()).collect();
        if rotating_duty {
            if let Some(pool_size) = self.duty_rotation_pool_size {
                idxs.retain(|&i| self.crew[i].id < pool_size);
            }
        }
        idxs
    }

    fn maybe_reset_duty_cycle(&mut self, t: f64, is_duty: bool, is_continuous_duty: bool) {
        if is_duty && !is_continuous_duty && (t - self.duty_cycle_reset_time) >= DUTY_CYCLE_RESET_HOURS {
            self.duty_assignment_count.clear();
            self.duty_cycle_reset_time = t;
        }
    }

    fn sort_candidates(
        &self,
        mut idxs: Vec<usize>,
        rotating_duty: bool,
        distribution: CrewDistributionPolicy,
        t: f64,
        rng: &mut impl Rng,
    ) -> Vec<usize> {
        if rotating_duty {
            idxs.sort_by(|&a, &b| {
                let ca = *self.duty_assignment_count.get(&self.crew[a].id).unwrap_or(&0);
                let cb = *self.duty_assignment_count.get(&self.crew[b].id).unwrap_or(&0);
                ca.cmp(&cb)
                    .then_with(|| {
                        self.crew[a]
                            .available_at
                            .partial_cmp(&self.crew[b].available_at)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .then_with(|| self.crew[a].id.cmp(&self.crew[b].id))
            });
            let _ = t;
            return idxs;
        }
        match distribution {
            CrewDistributionPolicy::Concentrate => {
                idxs.sort_by(|&a, &b| {
                    self.crew[b]
                        .mission_count
                        .cmp(&self.crew[a].mission_count)
                        .then_with(|| {
                            self.crew[b]
                                .available_at
                                .partial_cmp(&self.crew[a].available_at)
                                .unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .then_with(|| self.crew[a].id.cmp(&self.crew[b].id))
                });
            }
            CrewDistributionPolicy::Rotate => {
                idxs.sort_by(|&a, &b| {
                    self.crew[a]
                        .mission_count
                        .cmp(&self.crew[b].mission_count)
                        .then_with(|| {
                            self.crew[a]
                                .available_at
                                .partial_cmp(&self.crew[b].available_at)
                                .unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .then_with(|| self.crew[a].id.cmp(&self.crew[b].id))
                });
            }
            CrewDistributionPolicy::Random => {
                idxs.shuffle(rng);
            }
        }
        idxs
    }

    /// `count` members are needed for
    /// each entry in `shifts` (hours); shifts of equal duration run
    /// concurrently unless `force_sequential`, otherwise sequentially with
    /// re-evaluated availability at each boundary. No member appears in two
    /// shifts of the same call. Mutates only on success.
    #[allow(clippy::too_many_arguments)]
    pub fn try_acquire_shifts(
        &mut self,
        t: f64,
        shifts: &[f64],
        count: u32,
        is_duty: bool,
        is_continuous_duty: bool,
        force_sequential: bool,
        ignore_schedule: bool,
        duty_recovery_hours: f64,
        distribution: CrewDistributionPolicy,
        rng: &mut impl Rng,
    ) -> Option<Vec<ShiftAssignment>> {
        if shifts.is_empty() || count == 0 {
            return Some(Vec::new());
        }
        self.maybe_reset_duty_cycle(t, is_duty, is_continuous_duty);

        let rotating_duty = is_duty && !is_continuous_duty;
        let all_equal = shifts.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-9);
        let sequential = force_sequential || !all_equal;

        let mut used_this_call: std::collections::HashSet<usize> = std::collections::HashSet::new();
        let mut planned: Vec<(usize, f64, f64)> = Vec::new(); // (member_index, start, end)

        if sequential {
            let mut cursor = t;
            for &dur in shifts {
                let eligible = self.eligible_indices(rotating_duty);
                let available: Vec<usize> = eligible
                    .into_iter()
                    .filter(|&i| !used_this_call.contains(&i))
                    .filter(|&i| self.is_available(i, cursor, ignore_schedule))
                    .collect();
                let ordered = self.sort_candidates(available, rotating_duty, distribution, cursor, rng);
                if (ordered.len() as u32) < count {
                    return None;
                }
                for &idx in ordered.iter().take(count as usize) {
                    used_this_call.insert(idx);
                    planned.push((idx, cursor, cursor + dur));
                }
                cursor += dur;
            }
        } else {
            let dur = shifts[0];
            for _ in shifts {
                let eligible = self.eligible_indices(rotating_duty);
                let available: Vec<usize> = eligible
                    .into_iter()
                    .filter(|&i| !used_this_call.contains(&i))
                    .filter(|&i| self.is_available(i, t, ignore_schedule))
                    .collect();
                let ordered = self.sort_candidates(available, rotating_duty, distribution, t, rng);
                if (ordered.len() as u32) < count {
                    return None;
                }
                for &idx in ordered.iter().take(count as usize) {
                    used_this_call.insert(idx);
                    planned.push((idx, t, t + dur));
                }
            }
        }

        let mut assignments = Vec::with_capacity(planned.len());
        for (idx, start, end) in planned {
            let recovery = if is_duty { duty_recovery_hours } else { 0.0 };
            let shift_no = self.crew[idx].shift;
            let id = self.crew[idx].id;
            self.crew[idx].available_at = end + recovery;
            self.used_crew_ids.insert(id);
            if !is_duty {
                self.crew[idx].mission_count += 1;
            } else if !is_continuous_duty {
                *self.duty_assignment_count.entry(id).or_insert(0) += 1;
            }
            self.busy_time += (end - start) + recovery;
            self.allocations += 1;
            assignments.push(ShiftAssignment {
                id,
                start,
                end,
                shift: shift_no,
            });
        }
        Some(assignments)
    }

    /// Undoes a committed `try_acquire_shifts` result — used when a later
    /// resource in the same dispatch fails and these crew holds must not
    /// count. Must be called with the exact assignments that call
    /// returned, before any other acquisition on this queue intervenes.
    pub fn release_shifts(
        &mut self,
        assignments: &[ShiftAssignment],
        is_duty: bool,
        is_continuous_duty: bool,
        duty_recovery_hours: f64,
    ) {
        for a in assignments {
            let Some(idx) = self.crew.iter().position(|m| m.id == a.id) else {
                continue;
            };
            let recovery = if is_duty { duty_recovery_hours } else { 0.0 };
            self.crew[idx].available_at = a.start;
            if !is_duty {
                self.crew[idx].mission_count = self.crew[idx].mission_count.saturating_sub(1);
            } else if !is_continuous_duty {
                if let Some(c) = self.duty_assignment_count.get_mut(&a.id) {
                    *c = c.saturating_sub(1);
                }
            }
            let still_used = self.crew[idx].mission_count > 0
                || self.duty_assignment_count.get(&a.id).copied().unwrap_or(0) > 0;
            if !still_used {
                self.used_crew_ids.remove(&a.id);
            }
            self.busy_time -= (a.end - a.start) + recovery;
            self.allocations = self.allocations.saturating_sub(1);
        }
    }

    pub fn record_denial(&mut self, count: u32) {
        self.denials += count;
    }

    pub fn denials(&self) -> u32 {
        self.denials
    }

    pub fn allocations(&self) -> u32 {
        self.allocations
    }

    /// Count of members whose schedule (ignoring active holds) makes them
    /// available right now — used by the kernel's availability checks,
    /// which compare against a lookahead reservation count.
    pub fn available_count(&self, t: f64, ignore_schedule: bool) -> u32 {
        (0..self.crew.len())
            .filter(|&i| self.is_available(i, t, ignore_schedule))
            .count() as u32
    }

    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.used_crew_ids.len() as f64 / self.total as f64).min(1.0)
    }

    pub fn efficiency(&self, horizon_hours: f64) -> f64 {
        if self.total == 0 || horizon_hours <= 0.0 {
            return 0.0;
        }
        (self.busy_time / (self.total as f64 * horizon_hours)).min(1.0)
    }

    pub fn effective_total(&self, availability_factor: f64) -> u32 {
        ((self.total as f64) * availability_factor).round() as u32
    }

    pub fn raw_total(&self) -> u32 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::WorkSchedule;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn always_available_schedule() -> WorkSchedule {
        WorkSchedule {
            days_on: 7,
            days_off: 0,
            daily_start_hour: 0.0,
            stagger_days: 0.0,
            split_enabled: false,
            split_percent: 50.0,
        }
    }

    #[test]
    fn acquires_concurrent_shifts_without_reuse() {
        let mut q = CrewQueue::new(3, always_available_schedule(), 0.0, None);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = q
            .try_acquire_shifts(
                0.0,
                &[4.0, 4.0],
                1,
                false,
                false,
                false,
                false,
                0.0,
                CrewDistributionPolicy::Concentrate,
                &mut rng,
            )
            .expect("should succeed with 3 available crew for 2 concurrent seats");
        assert_eq!(result.len(), 2);
        assert_ne!(result[0].id, result[1].id);
    }

    #[test]
    fn rest_enforced_between_assignments() {
        let mut q = CrewQueue::new(1, always_available_schedule(), 0.0, None);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let first = q
            .try_acquire_shifts(
                0.0,
                &[4.0],
                1,
                true,
                false,
                false,
                true,
                6.0,
                CrewDistributionPolicy::Concentrate,
                &mut rng,
            )
            .unwrap();
        assert_eq!(first[0].end, 4.0);
        // Member is held until end + recovery = 10.0; requesting at t=5 must fail.
        let second = q.try_acquire_shifts(
            5.0,
            &[1.0],
            1,
            true,
            false,
            false,
            true,
            6.0,
            CrewDistributionPolicy::Concentrate,
            &mut rng,
        );
        assert!(second.is_none());
        let third = q
            .try_acquire_shifts(
                10.0,
                &[1.0],
                1,
                true,
                false,
                false,
                true,
                6.0,
                CrewDistributionPolicy::Concentrate,
                &mut rng,
            )
            .unwrap();
        assert_eq!(third[0].start, 10.0);
    }

    #[test]
    fn sequential_shifts_do_not_reuse_member() {
        let mut q = CrewQueue::new(1, always_available_schedule(), 0.0, None);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = q.try_acquire_shifts(
            0.0,
            &[4.0, 6.0],
            1,
            false,
            false,
            true,
            true,
            0.0,
            CrewDistributionPolicy::Concentrate,
            &mut rng,
        );
        assert!(result.is_none(), "only one member exists, cannot fill two sequential shifts");
    }

    #[test]
    fn no_crew_rest_window_blocks_availability() {
        let mut q = CrewQueue::new(1, always_available_schedule(), 24.0, None);
        assert_eq!(q.available_count(5.0, false), 0);
    }

    #[test]
    fn release_shifts_frees_member_and_drops_utilization() {
        let mut q = CrewQueue::new(1, always_available_schedule(), 0.0, None);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let assignments = q
            .try_acquire_shifts(
                0.0,
                &[4.0],
                1,
                false,
                false,
                false,
                false,
                0.0,
                CrewDistributionPolicy::Concentrate,
                &mut rng,
            )
            .unwrap();
        assert_eq!(q.available_count(1.0, false), 0);
        q.release_shifts(&assignments, false, false, 0.0);
        assert_eq!(q.available_count(1.0, false), 1);
        assert_eq!(q.utilization(), 0.0);
        assert_eq!(q.allocations(), 0);
    }
}
