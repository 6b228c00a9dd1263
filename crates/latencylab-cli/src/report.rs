//! Writers for `trace.csv`, `runs.csv`, and `summary.json`. Uses the `csv`
//! crate (which serializes `None` as an empty cell, so unset ids and
//! missing UI timings round-trip as blank fields) and `serde_json` for the
//! aggregate summary.

use std::fs::File;
use std::path::Path;

use anyhow::Result;
use latencylab_core::{RunResult, Summary};
use serde::Serialize;

#[derive(Serialize)]
struct TraceRow<'a> {
    run_index: u64,
    instance_id: u64,
    task_name: &'a str,
    context: &'a str,
    enqueue_ms: f64,
    start_ms: f64,
    end_ms: f64,
    parent_task_instance_id: Option<u64>,
    capacity_parent_instance_id: Option<u64>,
    synthetic: bool,
}

#[derive(Serialize)]
struct RunRow<'a> {
    run_index: u64,
    seed: u64,
    makespan_ms: f64,
    first_ui_event_time_ms: Option<f64>,
    last_ui_event_time_ms: Option<f64>,
    critical_path_tasks: &'a str,
}

/// Write `trace.csv`: one row per `TaskInstance`, emitted in `id` order
/// within each run, runs in `run_index` order.
pub fn write_trace_csv<P: AsRef<Path>>(path: P, results: &[RunResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for run in results {
        let mut instances: Vec<&latencylab_core::TaskInstance> = run.task_instances.iter().collect();
        instances.sort_by_key(|i| i.id);
        for inst in instances {
            writer.serialize(TraceRow {
                run_index: run.run_index,
                instance_id: inst.id,
                task_name: &inst.task_name,
                context: &inst.context,
                enqueue_ms: inst.enqueue_ms,
                start_ms: inst.start_ms,
                end_ms: inst.end_ms,
                parent_task_instance_id: inst.parent_task_instance_id,
                capacity_parent_instance_id: inst.capacity_parent_instance_id,
                synthetic: inst.synthetic,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write `runs.csv`: one row per run.
pub fn write_runs_csv<P: AsRef<Path>>(path: P, results: &[RunResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for run in results {
        writer.serialize(RunRow {
            run_index: run.run_index,
            seed: run.seed,
            makespan_ms: run.makespan_ms,
            first_ui_event_time_ms: run.first_ui_event_time_ms,
            last_ui_event_time_ms: run.last_ui_event_time_ms,
            critical_path_tasks: &run.critical_path_tasks,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `summary.json`.
pub fn write_summary_json<P: AsRef<Path>>(path: P, summary: &Summary) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use latencylab_core::TaskInstance;

    fn sample_result() -> RunResult {
        RunResult {
            run_index: 0,
            seed: 42,
            task_instances: vec![TaskInstance {
                id: 0,
                task_name: "t1".to_string(),
                context: "c1".to_string(),
                enqueue_ms: 0.0,
                start_ms: 0.0,
                end_ms: 5.0,
                parent_task_instance_id: None,
                capacity_parent_instance_id: None,
                synthetic: false,
            }],
            critical_path_tasks: "t1".to_string(),
            first_ui_event_time_ms: None,
            last_ui_event_time_ms: None,
            makespan_ms: 5.0,
        }
    }

    #[test]
    fn trace_csv_writes_unset_parents_as_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        write_trace_csv(&path, &[sample_result()]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        assert_eq!(
            data_line,
            "0,0,t1,c1,0.0,0.0,5.0,,,false"
        );
    }

    #[test]
    fn runs_csv_writes_one_row_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");
        write_runs_csv(&path, &[sample_result()]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
