//! Collapses many `RunResult`s into percentile and distributional
//! summaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::instance::RunResult;
use crate::model::{Model, TaskMeta};

/// The four percentiles reported for every timing metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// One entry in `top_critical_paths`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathEntry {
    pub path: String,
    pub count: usize,
    pub share: f64,
}

/// The aggregated outcome of a batch of runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Per-metric percentiles. Absent metrics (e.g. no run observed a UI
    /// event) are simply missing from the map.
    pub percentiles: BTreeMap<String, Percentiles>,
    pub top_critical_paths: Vec<CriticalPathEntry>,
    /// v2-only: task name -> its metadata, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_metadata: Option<BTreeMap<String, TaskMeta>>,
}

/// Aggregate `results` into a [`Summary`]. `model` supplies `task_metadata`
/// passthrough for `schema_version >= 2`; pass `None` to omit it
/// regardless of schema version. `top_k` bounds `top_critical_paths`
/// (defaults to 10 if `None`).
pub fn aggregate(results: &[RunResult], model: Option<&Model>, top_k: Option<usize>) -> Summary {
    let mut percentiles = BTreeMap::new();

    let makespans: Vec<f64> = results.iter().map(|r| r.makespan_ms).collect();
    percentiles.insert("makespan_ms".to_string(), percentiles_of(&makespans));

    let first_ui: Vec<f64> = results
        .iter()
        .filter_map(|r| r.first_ui_event_time_ms)
        .collect();
    if !first_ui.is_empty() {
        percentiles.insert(
            "first_ui_event_time_ms".to_string(),
            percentiles_of(&first_ui),
        );
    }

    let last_ui: Vec<f64> = results
        .iter()
        .filter_map(|r| r.last_ui_event_time_ms)
        .collect();
    if !last_ui.is_empty() {
        percentiles.insert(
            "last_ui_event_time_ms".to_string(),
            percentiles_of(&last_ui),
        );
    }

    let top_critical_paths = top_critical_paths(results, top_k.unwrap_or(10));

    let task_metadata = model.and_then(|m| {
        if m.schema_version < 2 {
            return None;
        }
        let map: BTreeMap<String, TaskMeta> = m
            .tasks
            .iter()
            .filter_map(|t| t.meta.clone().map(|meta| (t.name.clone(), meta)))
            .collect();
        if map.is_empty() {
            None
        } else {
            Some(map)
        }
    });

    Summary {
        percentiles,
        top_critical_paths,
        task_metadata,
    }
}

/// Linear interpolation between closest ranks on the sorted sample. For
/// `N == 1`, every percentile is the single value. Deliberately not
/// delegated to `statrs`'s quantile helpers, which use a different
/// interpolation convention (see `DESIGN.md`).
fn percentiles_of(samples: &[f64]) -> Percentiles {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    Percentiles {
        p50: percentile(&sorted, 0.50),
        p90: percentile(&sorted, 0.90),
        p95: percentile(&sorted, 0.95),
        p99: percentile(&sorted, 0.99),
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn top_critical_paths(results: &[RunResult], top_k: usize) -> Vec<CriticalPathEntry> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for r in results {
        *counts.entry(r.critical_path_tasks.clone()).or_insert(0) += 1;
    }
    let total = results.len().max(1) as f64;

    let mut entries: Vec<CriticalPathEntry> = counts
        .into_iter()
        .map(|(path, count)| CriticalPathEntry {
            share: count as f64 / total,
            path,
            count,
        })
        .collect();

    // highest count first, ties broken lexicographically by path
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.path.cmp(&b.path)));
    entries.truncate(top_k);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(run_index: u64, makespan_ms: f64, path: &str) -> RunResult {
        RunResult {
            run_index,
            seed: 0,
            task_instances: Vec::new(),
            critical_path_tasks: path.to_string(),
            first_ui_event_time_ms: None,
            last_ui_event_time_ms: None,
            makespan_ms,
        }
    }

    #[test]
    fn single_sample_percentiles_equal_the_sample() {
        let p = percentiles_of(&[10.0]);
        assert_eq!(p, Percentiles { p50: 10.0, p90: 10.0, p95: 10.0, p99: 10.0 });
    }

    #[test]
    fn constant_distribution_collapses_all_percentiles() {
        let samples: Vec<f64> = std::iter::repeat(10.0).take(1000).collect();
        let p = percentiles_of(&samples);
        assert_eq!(p, Percentiles { p50: 10.0, p90: 10.0, p95: 10.0, p99: 10.0 });
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = vec![0.0, 10.0];
        // rank = 0.5 * 1 = 0.5 -> halfway between 0 and 10
        assert_eq!(percentile(&sorted, 0.50), 5.0);
    }

    #[test]
    fn top_critical_paths_breaks_ties_lexicographically() {
        let results = vec![result(0, 1.0, "b"), result(1, 1.0, "a")];
        let top = top_critical_paths(&results, 10);
        assert_eq!(top[0].path, "a");
        assert_eq!(top[1].path, "b");
        assert_eq!(top[0].count, 1);
        assert!((top[0].share - 0.5).abs() < 1e-9);
    }

    #[test]
    fn top_critical_paths_ranked_by_frequency() {
        let results = vec![
            result(0, 1.0, "x"),
            result(1, 1.0, "x"),
            result(2, 1.0, "y"),
        ];
        let top = top_critical_paths(&results, 10);
        assert_eq!(top[0].path, "x");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].path, "y");
    }
}
