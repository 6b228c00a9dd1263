//! The discrete-event engine: the event-driven scheduler, the context
//! capacity/queueing model, and the delayed-wiring state machine.
//!
//! [`legacy`] and [`extended`] both drive [`run`]; the only difference
//! between them is whether delayed wiring edges are permitted (see
//! `DESIGN.md` for why the legacy engine is a real, independent v1 engine
//! rather than a byte-compatible oracle in this implementation).

pub mod extended;
pub mod legacy;
pub mod queue;

use std::collections::{BinaryHeap, HashMap};

use log::debug;
use rand_core::RngCore;

use crate::error::Error;
use crate::instance::{RunResult, TaskInstance};
use crate::model::{DurationDist, Model, DELAY_CONTEXT};
use crate::sampler;
use queue::{ContextState, PendingEnqueue, ScheduledItem, ScheduledKind};

/// Execute one run of `model` against `rng`. `allow_delay` distinguishes
/// the extended engine (delayed wiring permitted) from the legacy engine
/// (any delayed edge is a schema-version programmer error).
pub fn run<R: RngCore>(
    model: &Model,
    rng: &mut R,
    run_index: u64,
    seed: u64,
    allow_delay: bool,
) -> Result<RunResult, Error> {
    let mut sched = Scheduler::new(model, allow_delay, rng);

    // Bootstrap: inject every initial event at t=0, FIFO by declaration
    // order, with an unset parent.
    let initial: Vec<String> = model.initial_events().to_vec();
    for event_name in &initial {
        sched.fire_event(event_name, 0.0, None)?;
    }

    while let Some(item) = sched.event_queue.pop() {
        if item.time < sched.now_ms {
            return Err(Error::InvariantViolated(
                "scheduled item moves time backwards".to_string(),
            ));
        }
        sched.now_ms = item.time;

        match item.kind {
            ScheduledKind::EnqueueTask { task_name, parent } => {
                sched.enqueue_task(&task_name, parent)?;
            }
            ScheduledKind::EndInstance { instance_id } => {
                sched.end_instance(instance_id)?;
            }
        }
    }

    Ok(sched.into_result(run_index, seed))
}

struct Scheduler<'m, R> {
    model: &'m Model,
    allow_delay: bool,
    rng: &'m mut R,
    now_ms: f64,
    event_queue: BinaryHeap<ScheduledItem>,
    seq: u64,
    next_instance_id: u64,
    instances: Vec<TaskInstance>,
    contexts: HashMap<String, ContextState>,
}

impl<'m, R: RngCore> Scheduler<'m, R> {
    fn new(model: &'m Model, allow_delay: bool, rng: &'m mut R) -> Self {
        let mut contexts: HashMap<String, ContextState> = model
            .contexts
            .iter()
            .map(|c| (c.name.clone(), ContextState::new(c.concurrency)))
            .collect();
        // the reserved delay context has effectively infinite capacity
        contexts.insert(DELAY_CONTEXT.to_string(), ContextState::new(u32::MAX));

        Scheduler {
            model,
            allow_delay,
            rng,
            now_ms: 0.0,
            event_queue: BinaryHeap::new(),
            seq: 0,
            next_instance_id: 0,
            instances: Vec::new(),
            contexts,
        }
    }

    fn next_seq(&mut self) -> u64 {
        let s = self.seq;
        self.seq += 1;
        s
    }

    fn alloc_instance_id(&mut self) -> u64 {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        id
    }

    fn push(&mut self, time: f64, kind: ScheduledKind) {
        let seq = self.next_seq();
        self.event_queue.push(ScheduledItem { time, seq, kind });
    }

    /// Fire every wiring edge dispatched by `event_name` at `time`, caused
    /// by `emitting_instance_id` (`None` for the run's initial injector).
    fn fire_event(
        &mut self,
        event_name: &str,
        time: f64,
        emitting_instance_id: Option<u64>,
    ) -> Result<(), Error> {
        let edges: Vec<_> = self.model.wiring_for(event_name).cloned().collect();
        for edge in edges {
            match &edge.delay {
                None => {
                    debug!(
                        "scheduler: {event_name} -> enqueue {} at {time}",
                        edge.task
                    );
                    self.push(
                        time,
                        ScheduledKind::EnqueueTask {
                            task_name: edge.task.clone(),
                            parent: emitting_instance_id,
                        },
                    );
                }
                Some(delay_dist) => {
                    if !self.allow_delay {
                        return Err(Error::InvariantViolated(format!(
                            "wiring edge {event_name}->{} carries a delay, which the legacy engine does not support",
                            edge.task
                        )));
                    }
                    self.fire_delayed_edge(&edge.event, &edge.task, delay_dist, time, emitting_instance_id)?;
                }
            }
        }
        Ok(())
    }

    /// Create a synthetic delay instance for a delayed wiring edge,
    /// bypassing the normal context admission path entirely (the delay
    /// context has no concurrency limit and is never queued on).
    fn fire_delayed_edge(
        &mut self,
        event_name: &str,
        target_task: &str,
        delay_dist: &DurationDist,
        t_emit: f64,
        emitting_instance_id: Option<u64>,
    ) -> Result<(), Error> {
        let d = sampler::sample(delay_dist, self.rng);
        if !d.is_finite() || d < 0.0 {
            return Err(Error::InvariantViolated(format!(
                "sampled delay for {event_name}->{target_task} is invalid: {d}"
            )));
        }
        let id = self.alloc_instance_id();
        let end_ms = t_emit + d;
        self.instances.push(TaskInstance {
            id,
            task_name: format!("delay({event_name}->{target_task})"),
            context: DELAY_CONTEXT.to_string(),
            enqueue_ms: t_emit,
            start_ms: t_emit,
            end_ms,
            parent_task_instance_id: emitting_instance_id,
            capacity_parent_instance_id: None,
            synthetic: true,
        });
        self.push(end_ms, ScheduledKind::EndInstance { instance_id: id });
        Ok(())
    }

    fn enqueue_task(&mut self, task_name: &str, parent: Option<u64>) -> Result<(), Error> {
        let task = self
            .model
            .task(task_name)
            .ok_or_else(|| Error::InvariantViolated(format!("unknown task: {task_name}")))?;
        let context_name = task.context.clone();
        if self.model.context(&context_name).is_none() {
            return Err(Error::InvariantViolated(format!(
                "unknown context: {context_name}"
            )));
        }

        let enqueue_ms = self.now_ms;
        let ctx = self
            .contexts
            .get_mut(&context_name)
            .expect("context state pre-populated from model.contexts");
        ctx.ready_queue.push_back(PendingEnqueue {
            task_name: task_name.to_string(),
            enqueue_ms,
            parent_task_instance_id: parent,
        });

        self.admit(&context_name)
    }

    /// Admit as many pending enqueues on `context_name` as capacity
    /// allows, FIFO.
    fn admit(&mut self, context_name: &str) -> Result<(), Error> {
        loop {
            let Some(pending) = ({
                let ctx = self.contexts.get(context_name).unwrap();
                if ctx.has_capacity() {
                    ctx.ready_queue.front().cloned()
                } else {
                    None
                }
            }) else {
                break;
            };

            let task = self.model.task(&pending.task_name).ok_or_else(|| {
                Error::InvariantViolated(format!("unknown task: {}", pending.task_name))
            })?;
            let duration = sampler::sample(&task.duration_ms, self.rng);
            if !duration.is_finite() || duration < 0.0 {
                return Err(Error::InvariantViolated(format!(
                    "sampled duration for {} is invalid: {duration}",
                    pending.task_name
                )));
            }

            let ctx = self.contexts.get_mut(context_name).unwrap();
            ctx.ready_queue.pop_front();
            let capacity_parent = ctx.freed_by.pop_front();
            ctx.running_count += 1;

            let id = self.alloc_instance_id();
            let start_ms = self.now_ms;
            let end_ms = start_ms + duration;
            self.instances.push(TaskInstance {
                id,
                task_name: pending.task_name.clone(),
                context: context_name.to_string(),
                enqueue_ms: pending.enqueue_ms,
                start_ms,
                end_ms,
                parent_task_instance_id: pending.parent_task_instance_id,
                capacity_parent_instance_id: capacity_parent,
                synthetic: false,
            });
            self.push(end_ms, ScheduledKind::EndInstance { instance_id: id });
        }
        Ok(())
    }

    fn end_instance(&mut self, instance_id: u64) -> Result<(), Error> {
        let idx = instance_id as usize;
        let (task_name, context, is_delay, end_ms) = {
            let inst = self
                .instances
                .get_mut(idx)
                .ok_or_else(|| Error::InvariantViolated(format!("unknown instance: {instance_id}")))?;
            inst.end_ms = self.now_ms;
            (
                inst.task_name.clone(),
                inst.context.clone(),
                inst.synthetic,
                inst.end_ms,
            )
        };

        if is_delay {
            // a delay instance has exactly one target, fired directly.
            let target = parse_delay_target(&task_name).ok_or_else(|| {
                Error::InvariantViolated(format!("malformed synthetic delay name: {task_name}"))
            })?;
            self.push(
                end_ms,
                ScheduledKind::EnqueueTask {
                    task_name: target,
                    parent: Some(instance_id),
                },
            );
            return Ok(());
        }

        // free the context slot and let any queued work onto it
        let ctx = self.contexts.get_mut(&context).unwrap();
        ctx.running_count -= 1;
        ctx.freed_by.push_back(instance_id);
        self.admit(&context)?;

        // fire this task's emit list
        let task = self
            .model
            .task(&task_name)
            .ok_or_else(|| Error::InvariantViolated(format!("unknown task: {task_name}")))?;
        let emits = task.emit.clone();
        for event_name in emits {
            self.fire_event(&event_name, end_ms, Some(instance_id))?;
        }

        Ok(())
    }

    fn into_result(self, run_index: u64, seed: u64) -> RunResult {
        let makespan_ms = self
            .instances
            .iter()
            .filter(|i| !i.synthetic)
            .map(|i| i.end_ms)
            .fold(0.0_f64, f64::max);

        let mut first_ui: Option<f64> = None;
        let mut last_ui: Option<f64> = None;
        for inst in &self.instances {
            if inst.synthetic {
                continue;
            }
            let Some(task) = self.model.task(&inst.task_name) else {
                continue;
            };
            for event_name in &task.emit {
                let Some(event) = self.model.event(event_name) else {
                    continue;
                };
                if event.is_ui() {
                    first_ui = Some(first_ui.map_or(inst.end_ms, |t: f64| t.min(inst.end_ms)));
                    last_ui = Some(last_ui.map_or(inst.end_ms, |t: f64| t.max(inst.end_ms)));
                }
            }
        }

        let critical_path_tasks = crate::critical_path::critical_path(&self.instances);

        RunResult {
            run_index,
            seed,
            task_instances: self.instances,
            critical_path_tasks,
            first_ui_event_time_ms: first_ui,
            last_ui_event_time_ms: last_ui,
            makespan_ms,
        }
    }
}

fn parse_delay_target(delay_name: &str) -> Option<String> {
    // "delay(<event>-><task>)"
    let inner = delay_name.strip_prefix("delay(")?.strip_suffix(')')?;
    let (_, task) = inner.split_once("->")?;
    Some(task.to_string())
}
