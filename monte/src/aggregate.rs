//! Cross-iteration statistics over the three-MOS model — `rejections` and
//! `utilization` both carry an `intel` series alongside `pilot`/`so`.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use vmu_sim_des::Results;

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedStatistics {
    pub mean: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

/// `ceil(p/100 * N) - 1`, clamped to `[0, N-1]`. Not to be confused with the
/// percentile-*timeline* index inversion in `percentile.rs` — this one is
/// the plain ascending-sort lookup used for scalar aggregation.
fn calculate_percentiles(sorted: &[f64], percentiles: &[u32]) -> HashMap<u32, f64> {
    if sorted.is_empty() {
        return HashMap::new();
    }
    let mut result = HashMap::new();
    for &p in percentiles {
        let idx = ((p as f64 / 100.0) * sorted.len() as f64).ceil() as i64 - 1;
        let idx = idx.clamp(0, sorted.len() as i64 - 1) as usize;
        result.insert(p, sorted[idx]);
    }
    result
}

pub fn aggregate_statistics(values: &[f64]) -> Option<AggregatedStatistics> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let stddev = variance.sqrt();

    let p = calculate_percentiles(&sorted, &[10, 25, 50, 75, 90, 95, 99]);

    Some(AggregatedStatistics {
        mean,
        p10: p[&10],
        p25: p[&25],
        p50: p[&50],
        p75: p[&75],
        p90: p[&90],
        p95: p[&95],
        p99: p[&99],
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        stddev,
    })
}

fn collect(values: HashMap<String, Vec<f64>>) -> HashMap<String, AggregatedStatistics> {
    values
        .into_iter()
        .filter_map(|(k, v)| aggregate_statistics(&v).map(|s| (k, s)))
        .collect()
}

pub fn aggregate_missions(iterations: &[Results]) -> HashMap<String, AggregatedStatistics> {
    let mut values: HashMap<String, Vec<f64>> = HashMap::new();
    for iter in iterations {
        values.entry("requested".into()).or_default().push(iter.missions.requested as f64);
        values.entry("started".into()).or_default().push(iter.missions.started as f64);
        values.entry("completed".into()).or_default().push(iter.missions.completed as f64);
        values.entry("rejected".into()).or_default().push(iter.missions.rejected as f64);
    }
    collect(values)
}

pub fn aggregate_rejections(iterations: &[Results]) -> HashMap<String, AggregatedStatistics> {
    let mut values: HashMap<String, Vec<f64>> = HashMap::new();
    for iter in iterations {
        values.entry("aircraft".into()).or_default().push(iter.rejections.aircraft as f64);
        values.entry("pilot".into()).or_default().push(iter.rejections.pilot as f64);
        values.entry("so".into()).or_default().push(iter.rejections.so as f64);
        values.entry("intel".into()).or_default().push(iter.rejections.intel as f64);
        values.entry("payload".into()).or_default().push(iter.rejections.payload as f64);
    }
    collect(values)
}

pub fn aggregate_utilization(
    iterations: &[Results],
) -> HashMap<String, HashMap<String, AggregatedStatistics>> {
    let mut units = HashSet::new();
    for iter in iterations {
        units.extend(iter.utilization.keys().cloned());
    }

    let resource_types = ["aircraft", "pilot", "so", "intel"];
    let mut result = HashMap::new();
    for unit in units {
        let mut unit_stats = HashMap::new();
        for resource in resource_types {
            let values: Vec<f64> = iterations
                .iter()
                .filter_map(|iter| iter.utilization.get(&unit))
                .map(|u| match resource {
                    "aircraft" => u.aircraft,
                    "pilot" => u.pilot,
                    "so" => u.so,
                    "intel" => u.intel,
                    _ => unreachable!(),
                })
                .collect();
            if let Some(stats) = aggregate_statistics(&values) {
                unit_stats.insert(resource.to_string(), stats);
            }
        }
        if !unit_stats.is_empty() {
            result.insert(unit, unit_stats);
        }
    }
    result
}

pub fn aggregate_by_type(
    iterations: &[Results],
) -> HashMap<String, HashMap<String, AggregatedStatistics>> {
    let mut mission_types = HashSet::new();
    for iter in iterations {
        mission_types.extend(iter.by_type.keys().cloned());
    }

    let stats_keys = ["requested", "started", "completed", "rejected"];
    let mut result = HashMap::new();
    for mt in mission_types {
        let mut mt_stats = HashMap::new();
        for key in stats_keys {
            let values: Vec<f64> = iterations
                .iter()
                .filter_map(|iter| iter.by_type.get(&mt))
                .map(|s| match key {
                    "requested" => s.requested as f64,
                    "started" => s.started as f64,
                    "completed" => s.completed as f64,
                    "rejected" => s.rejected as f64,
                    _ => unreachable!(),
                })
                .collect();
            if let Some(stats) = aggregate_statistics(&values) {
                mt_stats.insert(key.to_string(), stats);
            }
        }
        if !mt_stats.is_empty() {
            result.insert(mt, mt_stats);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_match_ceil_formula() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let p = calculate_percentiles(&sorted, &[10, 50, 99]);
        assert_eq!(p[&10], 1.0);
        assert_eq!(p[&50], 5.0);
        assert_eq!(p[&99], 10.0);
    }

    #[test]
    fn stats_report_min_max_mean() {
        let values = vec![1.0, 2.0, 3.0];
        let stats = aggregate_statistics(&values).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert!((stats.mean - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_series_yields_none() {
        assert!(aggregate_statistics(&[]).is_none());
    }
}
