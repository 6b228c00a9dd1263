//! Cross-cutting invariants that must hold for any model, seed, and run
//! count.

mod common;

use std::collections::HashSet;

use common::*;
use latencylab_core::executor::{run_many, RunOptions};
use latencylab_core::model::DurationDist;
use latencylab_core::scheduler;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

fn rng(seed: u64) -> Xoshiro256StarStar {
    Xoshiro256StarStar::seed_from_u64(seed)
}

fn three_stage_model() -> latencylab_core::Model {
    model(
        2,
        vec![ctx("cpu", 1), ctx("io", 2)],
        vec![event("start"), event("parsed"), event("done")],
        vec![
            task("parse", "cpu", fixed(3.0), &["parsed"]),
            task("fetch", "io", DurationDist::Normal { mean: 5.0, std: 1.0, min: Some(0.0) }, &["done"]),
            task("render", "cpu", fixed(2.0), &[]),
        ],
        vec![edge("start", "parse"), edge("parsed", "fetch"), edge("done", "render")],
    )
}

/// Determinism: the same (model, seed, run_index) always produces a
/// byte-identical trace.
#[test_log::test]
fn determinism_same_seed_same_trace() {
    let m = three_stage_model();
    let a = scheduler::run(&m, &mut rng(99), 0, 99, true).unwrap();
    let b = scheduler::run(&m, &mut rng(99), 0, 99, true).unwrap();
    assert_eq!(a.task_instances, b.task_instances);
    assert_eq!(a.critical_path_tasks, b.critical_path_tasks);
    assert_eq!(a.makespan_ms, b.makespan_ms);
}

/// Capacity: a context's running instance count never exceeds its
/// declared concurrency at any instant.
#[test_log::test]
fn capacity_is_never_exceeded() {
    let m = model(
        2,
        vec![ctx("c1", 2)],
        vec![event("start")],
        vec![
            task("a", "c1", fixed(10.0), &[]),
            task("b", "c1", fixed(10.0), &[]),
            task("c", "c1", fixed(10.0), &[]),
        ],
        vec![edge("start", "a"), edge("start", "b"), edge("start", "c")],
    );
    let result = scheduler::run(&m, &mut rng(1), 0, 1, true).unwrap();

    let mut boundaries: Vec<(f64, i32)> = Vec::new();
    for inst in &result.task_instances {
        boundaries.push((inst.start_ms, 1));
        boundaries.push((inst.end_ms, -1));
    }
    boundaries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap().then(a.1.cmp(&b.1)));
    let mut running = 0;
    for (_, delta) in boundaries {
        running += delta;
        assert!(running <= 2, "concurrency exceeded: {running}");
    }
}

/// FIFO admission: instances queued on the same context in the same
/// instant are admitted in declaration/arrival order, never reordered.
#[test_log::test]
fn fifo_admission_preserves_arrival_order() {
    let m = model(
        2,
        vec![ctx("c1", 1)],
        vec![event("start")],
        vec![
            task("first", "c1", fixed(4.0), &[]),
            task("second", "c1", fixed(4.0), &[]),
            task("third", "c1", fixed(4.0), &[]),
        ],
        vec![
            edge("start", "first"),
            edge("start", "second"),
            edge("start", "third"),
        ],
    );
    let result = scheduler::run(&m, &mut rng(1), 0, 1, true).unwrap();
    let mut by_start: Vec<_> = result.task_instances.iter().collect();
    by_start.sort_by(|a, b| a.start_ms.partial_cmp(&b.start_ms).unwrap());
    let order: Vec<&str> = by_start.iter().map(|i| i.task_name.as_str()).collect();
    assert_eq!(order, vec!["first", "second", "third"]);
}

/// Causal monotonicity: an instance never starts before the instant its
/// parent (causal or capacity) ended.
#[test_log::test]
fn causal_monotonicity_holds() {
    let m = three_stage_model();
    let result = scheduler::run(&m, &mut rng(7), 0, 7, true).unwrap();
    let by_id: std::collections::HashMap<u64, &latencylab_core::TaskInstance> =
        result.task_instances.iter().map(|i| (i.id, i)).collect();

    for inst in &result.task_instances {
        if let Some(parent_id) = inst.parent_task_instance_id {
            let parent = by_id[&parent_id];
            assert!(inst.enqueue_ms >= parent.end_ms - 1e-9);
        }
        if let Some(parent_id) = inst.capacity_parent_instance_id {
            let parent = by_id[&parent_id];
            assert!(inst.start_ms >= parent.end_ms - 1e-9);
        }
    }
}

/// Delay transparency: a delayed wiring edge never consumes context
/// capacity on behalf of its target task's context.
#[test_log::test]
fn delayed_edges_do_not_consume_target_context_capacity() {
    let m = model(
        2,
        vec![ctx("c1", 1)],
        vec![event("start"), event("e1")],
        vec![
            task("t0", "c1", fixed(10.0), &["e1"]),
            task("t1", "c1", fixed(1.0), &[]),
        ],
        vec![edge("start", "t0"), delayed_edge("e1", "t1", fixed(5.0))],
    );
    let result = scheduler::run(&m, &mut rng(3), 0, 3, true).unwrap();
    let delay = result.task_instances.iter().find(|i| i.synthetic).unwrap();
    assert_eq!(delay.context, "__delay__");
    assert!(!result.task_instances.iter().any(|i| !i.synthetic && i.context == "__delay__"));
}

/// Metadata isolation: task metadata never influences scheduling outcomes
/// — two models differing only in `meta` produce identical traces.
#[test_log::test]
fn metadata_never_affects_scheduling() {
    use std::collections::BTreeMap;
    use latencylab_core::TaskMeta;

    let plain = model(
        2,
        vec![ctx("c1", 1)],
        vec![event("start")],
        vec![task("t1", "c1", fixed(5.0), &[])],
        vec![edge("start", "t1")],
    );

    let mut labeled = plain.clone();
    labeled.tasks[0].meta = Some(TaskMeta {
        category: Some("network".to_string()),
        tags: vec!["critical".to_string()],
        labels: BTreeMap::from([("owner".to_string(), "team-a".to_string())]),
    });
    labeled.reindex();

    let a = scheduler::run(&plain, &mut rng(5), 0, 5, true).unwrap();
    let b = scheduler::run(&labeled, &mut rng(5), 0, 5, true).unwrap();
    assert_eq!(a.task_instances, b.task_instances);
    assert_eq!(a.critical_path_tasks, b.critical_path_tasks);
}

/// A batch's result ordering and values don't depend on how many worker
/// threads actually ran the runs.
#[test_log::test]
fn batch_ordering_is_independent_of_parallelism() {
    let m = three_stage_model();
    let serial = run_many(
        &m,
        64,
        123,
        RunOptions {
            max_parallelism: Some(1),
            ..RunOptions::default()
        },
        None,
    )
    .unwrap();
    let parallel = run_many(
        &m,
        64,
        123,
        RunOptions {
            max_parallelism: Some(8),
            ..RunOptions::default()
        },
        None,
    )
    .unwrap();

    assert_eq!(serial.results.len(), parallel.results.len());
    let indices: Vec<u64> = serial.results.iter().map(|r| r.run_index).collect();
    let sorted: HashSet<u64> = indices.iter().copied().collect();
    assert_eq!(sorted.len(), indices.len(), "run_index must be unique");

    for (a, b) in serial.results.iter().zip(parallel.results.iter()) {
        assert_eq!(a.run_index, b.run_index);
        assert_eq!(a.seed, b.seed);
        assert_eq!(a.makespan_ms, b.makespan_ms);
        assert_eq!(a.critical_path_tasks, b.critical_path_tasks);
    }
}
