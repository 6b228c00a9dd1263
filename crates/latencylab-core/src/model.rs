//! The declarative, immutable model a run is executed against: contexts,
//! events, tasks, and the wiring between them.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// The reserved context name used for synthetic delay instances. Not
/// present in [`Model::contexts`]; not capacity-constrained.
pub const DELAY_CONTEXT: &str = "__delay__";

/// A named execution pool with a fixed concurrency cap and FIFO admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDef {
    pub name: String,
    pub concurrency: u32,
    pub policy: QueuePolicy,
}

/// Admission policy for a context. Locked to FIFO for now; kept as an enum
/// (rather than a bare assertion) so the wire format has a place to name
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePolicy {
    Fifo,
}

/// A named signal fired by a task's completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    #[serde(default)]
    pub tags: HashSet<String>,
}

impl EventDef {
    pub fn is_ui(&self) -> bool {
        self.tags.contains("ui")
    }
}

/// A sampled duration distribution, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DurationDist {
    /// Always samples exactly `value`.
    Fixed { value: f64 },
    /// Samples from N(mean, std^2), clamped to `[0, +inf)`, then to `[min,
    /// +inf)` if `min` is set. `std == 0.0` is a legal, degenerate normal
    /// that always samples `mean`.
    Normal {
        mean: f64,
        std: f64,
        #[serde(default)]
        min: Option<f64>,
    },
    /// Samples `exp(mu + sigma * Z)` for `Z ~ N(0, 1)`.
    Lognormal { mu: f64, sigma: f64 },
}

/// Measurement-only metadata carried on a task, passed through to
/// `Summary::task_metadata` verbatim; never affects simulation outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `BTreeMap` rather than `HashMap` so `summary.json` serializes in a
    /// deterministic key order.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// A named unit of work assigned to a context, with a sampled duration and
/// zero or more emitted events on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
    pub name: String,
    pub context: String,
    pub duration_ms: DurationDist,
    #[serde(default)]
    pub emit: Vec<String>,
    #[serde(default)]
    pub meta: Option<TaskMeta>,
}

/// A dispatch rule: when `event` fires, enqueue `task`, optionally after a
/// sampled `delay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WiringEdge {
    pub event: String,
    pub task: String,
    #[serde(default)]
    pub delay: Option<DurationDist>,
}

/// The validated, read-only model a run is executed against. Shared by
/// reference across every run in a batch; never mutated after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub schema_version: u32,
    pub contexts: Vec<ContextDef>,
    pub events: Vec<EventDef>,
    pub tasks: Vec<TaskDef>,
    pub wiring: Vec<WiringEdge>,

    #[serde(skip)]
    context_index: HashMap<String, usize>,
    #[serde(skip)]
    event_index: HashMap<String, usize>,
    #[serde(skip)]
    task_index: HashMap<String, usize>,
    #[serde(skip)]
    wiring_by_event: HashMap<String, Vec<usize>>,
    /// Events with no producing task, in declaration order: the run
    /// bootstrap set injected at `t = 0`.
    #[serde(skip)]
    initial_events: Vec<String>,
}

impl Model {
    /// Build a `Model` from its declarative parts and compute the derived
    /// lookup indices used by the scheduler. Does not validate references;
    /// callers are expected to have validated the model already — unresolved
    /// references surface as `Error::InvariantViolated` at scheduling time
    /// instead of here.
    pub fn new(
        schema_version: u32,
        contexts: Vec<ContextDef>,
        events: Vec<EventDef>,
        tasks: Vec<TaskDef>,
        wiring: Vec<WiringEdge>,
    ) -> Self {
        let mut model = Model {
            schema_version,
            contexts,
            events,
            tasks,
            wiring,
            context_index: HashMap::new(),
            event_index: HashMap::new(),
            task_index: HashMap::new(),
            wiring_by_event: HashMap::new(),
            initial_events: Vec::new(),
        };
        model.reindex();
        model
    }

    /// Recompute the derived indices. Must be called after deserializing a
    /// `Model` directly (e.g. via `serde_json::from_str`), since the index
    /// fields are `#[serde(skip)]` and come back empty.
    pub fn reindex(&mut self) {
        self.context_index = self
            .contexts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        self.event_index = self
            .events
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
        self.task_index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();

        self.wiring_by_event.clear();
        for (i, edge) in self.wiring.iter().enumerate() {
            self.wiring_by_event
                .entry(edge.event.clone())
                .or_default()
                .push(i);
        }

        let produced: HashSet<&str> = self
            .tasks
            .iter()
            .flat_map(|t| t.emit.iter().map(String::as_str))
            .collect();
        self.initial_events = self
            .events
            .iter()
            .map(|e| e.name.as_str())
            .filter(|name| !produced.contains(name))
            .map(String::from)
            .collect();
    }

    pub fn context(&self, name: &str) -> Option<&ContextDef> {
        self.context_index.get(name).map(|&i| &self.contexts[i])
    }

    pub fn event(&self, name: &str) -> Option<&EventDef> {
        self.event_index.get(name).map(|&i| &self.events[i])
    }

    pub fn task(&self, name: &str) -> Option<&TaskDef> {
        self.task_index.get(name).map(|&i| &self.tasks[i])
    }

    /// All wiring edges dispatched by `event`, in declaration order.
    pub fn wiring_for(&self, event: &str) -> impl Iterator<Item = &WiringEdge> {
        self.wiring_by_event
            .get(event)
            .into_iter()
            .flatten()
            .map(move |&i| &self.wiring[i])
    }

    /// Events with no producing task, in declaration order.
    pub fn initial_events(&self) -> &[String] {
        &self.initial_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(name: &str, concurrency: u32) -> ContextDef {
        ContextDef {
            name: name.to_string(),
            concurrency,
            policy: QueuePolicy::Fifo,
        }
    }

    #[test]
    fn initial_events_are_those_with_no_producer() {
        let events = vec![
            EventDef {
                name: "start".to_string(),
                tags: HashSet::new(),
            },
            EventDef {
                name: "done".to_string(),
                tags: HashSet::new(),
            },
        ];
        let tasks = vec![TaskDef {
            name: "t1".to_string(),
            context: "c1".to_string(),
            duration_ms: DurationDist::Fixed { value: 1.0 },
            emit: vec!["done".to_string()],
            meta: None,
        }];
        let model = Model::new(2, vec![ctx("c1", 1)], events, tasks, vec![]);
        assert_eq!(model.initial_events(), &["start".to_string()]);
    }

    #[test]
    fn wiring_for_preserves_declaration_order() {
        let wiring = vec![
            WiringEdge {
                event: "e".to_string(),
                task: "a".to_string(),
                delay: None,
            },
            WiringEdge {
                event: "e".to_string(),
                task: "b".to_string(),
                delay: None,
            },
        ];
        let model = Model::new(2, vec![], vec![], vec![], wiring);
        let targets: Vec<&str> = model.wiring_for("e").map(|w| w.task.as_str()).collect();
        assert_eq!(targets, vec!["a", "b"]);
    }
}
