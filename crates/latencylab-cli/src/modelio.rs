//! Reads a model JSON file and validates it into a `latencylab_core::Model`.
//! Deliberately thin: structural `serde` deserialization plus the
//! bounds/reference checks a model needs to run safely, not a
//! general-purpose schema validator.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use latencylab_core::{ContextDef, DurationDist, Error, EventDef, Model, QueuePolicy, TaskDef, TaskMeta, WiringEdge};
use serde::Deserialize;

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model, Error> {
    let contents = fs::read_to_string(path.as_ref())
        .map_err(|e| Error::ModelInvalid(format!("cannot read {}: {e}", path.as_ref().display())))?;
    let raw: RawModel = serde_json::from_str(&contents)
        .map_err(|e| Error::ModelInvalid(format!("malformed model JSON: {e}")))?;
    raw.into_model()
}

/// `IndexMap` rather than `BTreeMap`/`HashMap`: the file's own key order is
/// the model's declaration order, and the scheduler's run-bootstrap
/// tiebreak depends on it (events with no producing task are injected in
/// that order). A `BTreeMap` would silently resort everything
/// alphabetically.
#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(alias = "version", alias = "model_version")]
    schema_version: u32,
    #[serde(default)]
    contexts: IndexMap<String, RawContext>,
    #[serde(default)]
    events: IndexMap<String, RawEvent>,
    #[serde(default)]
    tasks: IndexMap<String, RawTask>,
    #[serde(default)]
    wiring: IndexMap<String, Vec<RawWiringTarget>>,
}

#[derive(Debug, Deserialize)]
struct RawContext {
    concurrency: u32,
    policy: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawEvent {
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTask {
    context: String,
    duration_ms: DurationDist,
    #[serde(default)]
    emit: Vec<String>,
    #[serde(default)]
    meta: Option<TaskMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawWiringTarget {
    Name(String),
    Full {
        task: String,
        #[serde(default)]
        delay_ms: Option<RawDelay>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDelay {
    Number(f64),
    Dist(DurationDist),
}

impl RawModel {
    fn into_model(self) -> Result<Model, Error> {
        if self.schema_version != 1 && self.schema_version != 2 {
            return Err(Error::ModelInvalid(format!(
                "schema_version must be 1 or 2, got {}",
                self.schema_version
            )));
        }

        let mut contexts = Vec::with_capacity(self.contexts.len());
        for (name, raw) in &self.contexts {
            if raw.concurrency < 1 {
                return Err(Error::ModelInvalid(format!(
                    "context {name}: concurrency must be >= 1, got {}",
                    raw.concurrency
                )));
            }
            if raw.policy != "fifo" {
                return Err(Error::ModelInvalid(format!(
                    "context {name}: unsupported policy {:?}, only \"fifo\" is recognized",
                    raw.policy
                )));
            }
            contexts.push(ContextDef {
                name: name.clone(),
                concurrency: raw.concurrency,
                policy: QueuePolicy::Fifo,
            });
        }

        let mut events = Vec::with_capacity(self.events.len());
        for (name, raw) in &self.events {
            events.push(EventDef {
                name: name.clone(),
                tags: raw.tags.iter().cloned().collect::<HashSet<_>>(),
            });
        }

        let known_contexts: HashSet<&str> = contexts.iter().map(|c| c.name.as_str()).collect();
        let known_events: HashSet<&str> = events.iter().map(|e| e.name.as_str()).collect();

        let mut tasks = Vec::with_capacity(self.tasks.len());
        for (name, raw) in &self.tasks {
            if !known_contexts.contains(raw.context.as_str()) {
                return Err(Error::ModelInvalid(format!(
                    "task {name}: unknown context {:?}",
                    raw.context
                )));
            }
            validate_dist(name, &raw.duration_ms)?;
            for emitted in &raw.emit {
                if !known_events.contains(emitted.as_str()) {
                    return Err(Error::ModelInvalid(format!(
                        "task {name}: emits unknown event {emitted:?}"
                    )));
                }
            }
            tasks.push(TaskDef {
                name: name.clone(),
                context: raw.context.clone(),
                duration_ms: raw.duration_ms,
                emit: raw.emit.clone(),
                meta: raw.meta.clone(),
            });
        }

        let known_tasks: HashSet<&str> = tasks.iter().map(|t| t.name.as_str()).collect();

        let mut wiring = Vec::new();
        for (event_name, targets) in &self.wiring {
            if !known_events.contains(event_name.as_str()) {
                return Err(Error::ModelInvalid(format!(
                    "wiring: unknown event {event_name:?}"
                )));
            }
            for target in targets {
                let (task_name, delay) = match target {
                    RawWiringTarget::Name(task) => (task.clone(), None),
                    RawWiringTarget::Full { task, delay_ms } => {
                        (task.clone(), delay_ms.as_ref().map(|d| match d {
                            RawDelay::Number(value) => DurationDist::Fixed { value: *value },
                            RawDelay::Dist(dist) => *dist,
                        }))
                    }
                };
                if !known_tasks.contains(task_name.as_str()) {
                    return Err(Error::ModelInvalid(format!(
                        "wiring: event {event_name:?} targets unknown task {task_name:?}"
                    )));
                }
                if let Some(dist) = &delay {
                    validate_dist(&task_name, dist)?;
                }
                wiring.push(WiringEdge {
                    event: event_name.clone(),
                    task: task_name,
                    delay,
                });
            }
        }

        Ok(Model::new(self.schema_version, contexts, events, tasks, wiring))
    }
}

fn validate_dist(owner: &str, dist: &DurationDist) -> Result<(), Error> {
    match *dist {
        DurationDist::Fixed { value } if value < 0.0 => Err(Error::ModelInvalid(format!(
            "{owner}: Fixed.value must be >= 0, got {value}"
        ))),
        DurationDist::Normal { std, .. } if std < 0.0 => Err(Error::ModelInvalid(format!(
            "{owner}: Normal.std must be >= 0, got {std}"
        ))),
        DurationDist::Normal { min: Some(min), .. } if min < 0.0 => Err(Error::ModelInvalid(format!(
            "{owner}: Normal.min must be >= 0, got {min}"
        ))),
        DurationDist::Lognormal { sigma, .. } if sigma < 0.0 => Err(Error::ModelInvalid(format!(
            "{owner}: Lognormal.sigma must be >= 0, got {sigma}"
        ))),
        _ => Ok(()),
    }
}
