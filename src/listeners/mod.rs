//! # Lifecycle listeners and their orchestration.
//!
//! This module provides the listener capability sets and the machinery that runs them
//! around job, step and item-write boundaries.
//!
//! ## Architecture
//! ```text
//! Job engine hook
//!     │
//!     ▼
//! {Job,Step,ItemWrite}ListenerExecutor   (one per run scope)
//!     │
//!     ▼
//! ListenerPipeline ──► ListenerRegistry::resolve(list, job, step)
//!     │                     └─► "<job>.<step>.<list>" → "<job>.<list>" → "<list>" → []
//!     ├─► run_before:   l1 → l2 → l3        (push each onto the execution stack)
//!     └─► run_after /
//!         run_on_error: l3 → l2 → l1        (all run; first failure re-raised)
//!                │
//!                ▼
//!          ListenerContext (one per round: job, step, process_succeeded, statuses)
//! ```
//!
//! ## Contents
//! - [`JobListener`], [`StepListener`], [`ItemWriteListener`] capability sets with no-op defaults
//! - [`ListenerRegistry`], [`ListenerScope`] three-tier listener lookup
//! - [`ListenerPipeline`], [`PipelineState`] before/after/on-error protocol
//! - [`ListenerContext`] per-round view of the job run
//! - [`LogListener`] built-in lifecycle logger

mod context;
mod executors;
mod failures;
mod listener;
mod log;
mod pipeline;
mod registry;

pub use context::ListenerContext;
pub use executors::{ItemWriteListenerExecutor, JobListenerExecutor, StepListenerExecutor};
pub use listener::{ItemWriteListener, JobListener, NamedListener, StepListener};
pub use log::LogListener;
pub use pipeline::{ListenerPipeline, PipelineState};
pub use registry::{
    ITEM_WRITE_LISTENERS, JOB_LISTENERS, ListenerRegistry, ListenerScope, STEP_LISTENERS,
};
