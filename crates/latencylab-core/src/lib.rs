//! LatencyLab's core discrete-event simulation engine.
//!
//! Given a declarative [`model`] of execution contexts, tasks, and wiring,
//! [`scheduler`] executes one run under seeded randomness, [`critical_path`]
//! reconstructs the longest causal chain through the result, [`executor`]
//! fans out many independent runs, and [`aggregator`] collapses the batch
//! into percentile summaries.
//!
//! Model JSON parsing/validation, CSV/JSON report writers, CLI argument
//! handling, and any GUI are out of scope for this crate — see the
//! `latencylab-cli` crate in this workspace for a thin driver around it.

pub mod aggregator;
pub mod critical_path;
pub mod error;
pub mod executor;
pub mod instance;
pub mod model;
pub mod sampler;
pub mod scheduler;

pub use aggregator::{aggregate, Summary};
pub use error::Error;
pub use executor::{run_many, BatchReport, CancelSignal, ExecutorKind, RunOptions};
pub use instance::{RunResult, TaskInstance};
pub use model::{ContextDef, DurationDist, EventDef, Model, QueuePolicy, TaskDef, TaskMeta, WiringEdge};
