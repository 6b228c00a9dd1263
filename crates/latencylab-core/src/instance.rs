//! Per-run output: task instances (including synthetic delay instances)
//! with full causality, and the aggregate result of a single run.

use serde::{Deserialize, Serialize};

/// One execution of a task (or a synthetic delay) within a single run.
/// Created when enqueued; finalized (`end_ms` set) when it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    /// Monotonic per-run id, starting at 0.
    pub id: u64,
    pub task_name: String,
    pub context: String,
    pub enqueue_ms: f64,
    pub start_ms: f64,
    pub end_ms: f64,
    /// The instance whose emission caused this one to be enqueued. Unset
    /// for the run's initial-event injections and for instances admitted
    /// purely because a context slot freed up.
    pub parent_task_instance_id: Option<u64>,
    /// The instance whose end freed the context slot this instance runs
    /// on. Unset for the first `concurrency` instances ever admitted onto
    /// a context, and always unset for synthetic delay instances.
    pub capacity_parent_instance_id: Option<u64>,
    /// True for synthetic delay instances inserted by delayed wiring.
    pub synthetic: bool,
}

/// The outcome of executing one run of a [`Model`](crate::model::Model)
/// against a seeded RNG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_index: u64,
    pub seed: u64,
    pub task_instances: Vec<TaskInstance>,
    /// The `>`-joined critical path, as produced by
    /// [`crate::critical_path::critical_path`].
    pub critical_path_tasks: String,
    pub first_ui_event_time_ms: Option<f64>,
    pub last_ui_event_time_ms: Option<f64>,
    /// `max(end_ms)` across non-delay instances.
    pub makespan_ms: f64,
}
