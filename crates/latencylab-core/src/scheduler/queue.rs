//! The event queue and per-context admission bookkeeping used by the main
//! scheduler loop.

use std::cmp::Ordering;
use std::collections::VecDeque;

/// An item scheduled to occur at a simulated time. Equal-time items are
/// processed in insertion order via `seq` (a stable FIFO tiebreak).
#[derive(Debug, Clone)]
pub struct ScheduledItem {
    pub time: f64,
    pub seq: u64,
    pub kind: ScheduledKind,
}

#[derive(Debug, Clone)]
pub enum ScheduledKind {
    EnqueueTask {
        task_name: String,
        parent: Option<u64>,
    },
    EndInstance {
        instance_id: u64,
    },
}

impl PartialEq for ScheduledItem {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for ScheduledItem {}

impl Ord for ScheduledItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed so that a std::collections::BinaryHeap (a max-heap)
        // yields the smallest (time, seq) pair first
        other
            .time
            .partial_cmp(&self.time)
            .expect("scheduled time must be comparable (NaN time is a bug)")
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A task enqueued onto a context, waiting for a free concurrency slot.
#[derive(Debug, Clone)]
pub struct PendingEnqueue {
    pub task_name: String,
    pub enqueue_ms: f64,
    pub parent_task_instance_id: Option<u64>,
}

/// Per-context admission state: a FIFO of pending enqueues, a count of
/// currently-running instances, and a FIFO of instance ids that most
/// recently freed a slot (consumed in order as new instances are
/// admitted, giving each admission the correct `capacity_parent_instance_id`).
#[derive(Debug, Default)]
pub struct ContextState {
    pub concurrency: u32,
    pub running_count: u32,
    pub ready_queue: VecDeque<PendingEnqueue>,
    pub freed_by: VecDeque<u64>,
}

impl ContextState {
    pub fn new(concurrency: u32) -> Self {
        ContextState {
            concurrency,
            running_count: 0,
            ready_queue: VecDeque::new(),
            freed_by: VecDeque::new(),
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.running_count < self.concurrency
    }
}
