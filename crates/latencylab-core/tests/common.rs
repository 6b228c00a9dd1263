//! Shared model-building helpers for the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;

use latencylab_core::{ContextDef, DurationDist, EventDef, Model, QueuePolicy, TaskDef, WiringEdge};

pub fn fixed(value: f64) -> DurationDist {
    DurationDist::Fixed { value }
}

pub fn ctx(name: &str, concurrency: u32) -> ContextDef {
    ContextDef {
        name: name.to_string(),
        concurrency,
        policy: QueuePolicy::Fifo,
    }
}

pub fn event(name: &str) -> EventDef {
    EventDef {
        name: name.to_string(),
        tags: HashSet::new(),
    }
}

pub fn ui_event(name: &str) -> EventDef {
    let mut tags = HashSet::new();
    tags.insert("ui".to_string());
    EventDef {
        name: name.to_string(),
        tags,
    }
}

pub fn task(name: &str, context: &str, duration_ms: DurationDist, emit: &[&str]) -> TaskDef {
    TaskDef {
        name: name.to_string(),
        context: context.to_string(),
        duration_ms,
        emit: emit.iter().map(|s| s.to_string()).collect(),
        meta: None,
    }
}

pub fn edge(event: &str, task: &str) -> WiringEdge {
    WiringEdge {
        event: event.to_string(),
        task: task.to_string(),
        delay: None,
    }
}

pub fn delayed_edge(event: &str, task: &str, delay: DurationDist) -> WiringEdge {
    WiringEdge {
        event: event.to_string(),
        task: task.to_string(),
        delay: Some(delay),
    }
}

pub fn model(
    schema_version: u32,
    contexts: Vec<ContextDef>,
    events: Vec<EventDef>,
    tasks: Vec<TaskDef>,
    wiring: Vec<WiringEdge>,
) -> Model {
    Model::new(schema_version, contexts, events, tasks, wiring)
}
