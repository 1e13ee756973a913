//! Representative-timeline selection. `pX` selects the iteration at
//! sorted-position `100-X`, not `X` — pX represents the X-th percentile of
//! *operational risk*, so only X% of outcomes are worse. Encoded as a named
//! table rather than an inline `100 - p` to keep the inversion legible.

use vmu_sim_des::Results;

pub const PERCENTILE_TIMELINE_KEYS: &[(&str, u32)] = &[
    ("p10", 90),
    ("p25", 75),
    ("p50", 50),
    ("p75", 25),
    ("p90", 10),
    ("p95", 5),
    ("p99", 1),
];

#[derive(Debug, Clone, serde::Serialize)]
pub struct PercentileTimeline {
    pub timeline: Vec<vmu_sim_des::results::TimelineEvent>,
    pub availability_timeline: Vec<vmu_sim_des::results::AvailabilityTimelineEntry>,
    pub missions_completed: u32,
    pub stddev: f64,
}

fn timeline_from(iterations: &[Results], idx: usize, stddev: f64) -> PercentileTimeline {
    let r = &iterations[idx];
    PercentileTimeline {
        timeline: r.timeline.clone(),
        availability_timeline: r.availability_timeline.clone(),
        missions_completed: r.missions.completed,
        stddev,
    }
}

/// Selects one representative iteration per key in
/// `{mean, min, max, p10, p25, p50, p75, p90, p95, p99}`, ranked by
/// completed-mission count `C[i]`.
pub fn select_percentile_timelines(
    iterations: &[Results],
) -> std::collections::HashMap<String, PercentileTimeline> {
    let mut out = std::collections::HashMap::new();
    if iterations.is_empty() {
        return out;
    }

    let completed: Vec<f64> = iterations.iter().map(|r| r.missions.completed as f64).collect();
    let mut order: Vec<usize> = (0..iterations.len()).collect();
    order.sort_by(|&a, &b| completed[a].partial_cmp(&completed[b]).unwrap());

    let n = order.len();
    let mean_c = completed.iter().sum::<f64>() / n as f64;
    let variance = completed.iter().map(|v| (v - mean_c).powi(2)).sum::<f64>() / n as f64;
    let stddev = variance.sqrt();

    let min_idx = order[0];
    let max_idx = order[n - 1];
    let mean_idx = *order
        .iter()
        .min_by(|&&a, &&b| {
            (completed[a] - mean_c)
                .abs()
                .partial_cmp(&(completed[b] - mean_c).abs())
                .unwrap()
        })
        .unwrap();

    out.insert("min".to_string(), timeline_from(iterations, min_idx, stddev));
    out.insert("max".to_string(), timeline_from(iterations, max_idx, stddev));
    out.insert("mean".to_string(), timeline_from(iterations, mean_idx, stddev));

    for &(key, sorted_percentile) in PERCENTILE_TIMELINE_KEYS {
        let pos = ((sorted_percentile as f64 / 100.0) * n as f64).ceil() as i64 - 1;
        let pos = pos.clamp(0, n as i64 - 1) as usize;
        let idx = order[pos];
        out.insert(key.to_string(), timeline_from(iterations, idx, stddev));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_inverted() {
        let table: std::collections::HashMap<_, _> = PERCENTILE_TIMELINE_KEYS.iter().copied().collect();
        assert_eq!(table["p10"], 90);
        assert_eq!(table["p90"], 10);
        assert_eq!(table["p99"], 1);
    }
}
