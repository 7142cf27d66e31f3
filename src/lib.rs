//! # batchvisor
//!
//! **Batchvisor** orchestrates a single batch job run around an external job engine.
//!
//! It provides two building blocks:
//! - a **listener orchestration protocol**: resolve which listeners apply to a job, step or
//!   chunk write, run their "before" callbacks in order, and tear them down in reverse order
//!   with fault-tolerant failure aggregation;
//! - a **job completion poller**: launch the job, poll until a terminal status, and derive
//!   the process exit code.
//!
//! Step/chunk processing, checkpointing and transactions stay inside the engine.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        ┌──────────────────────────── external job engine ────────────────────────────┐
//!        │   start(job, params)   status(id)   exit_status(id)   lifecycle hooks        │
//!        └──────▲───────────────────▲────────────────▲───────────────────┬─────────────┘
//!               │                   │                │                   │ before/after
//!        ┌──────┴───────────────────┴────────────────┴──┐                ▼
//!        │  JobRunner (completion poller)               │   ┌───────────────────────────────┐
//!        │  - one-shot start()                          │   │ Job/Step/ItemWrite executors  │
//!        │  - poll every N ms, cancellable sleep        │   │ (one per run scope)           │
//!        │  - ExitCode::derive(status, exit_status)     │   └──────────────┬────────────────┘
//!        └──────────────────────────────────────────────┘                  ▼
//!                                                          ┌───────────────────────────────┐
//!                                                          │ ListenerPipeline              │
//!                                                          │  - ListenerRegistry lookup    │
//!                                                          │  - execution stack            │
//!                                                          │  - first-failure-wins teardown│
//!                                                          └───────────────────────────────┘
//! ```
//!
//! ### Listener lifecycle
//! ```text
//! before_job ─► [A.before, B.before, C.before]      stack = [A, B, C]
//!                                 │
//!                        C fails with X ─► Err(X)   stack unchanged
//!
//! after_job  ─► [C.after, B.after, A.after]         every listener runs
//!                  └─ failures: logged (warn, job/step), first re-raised
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                                   |
//! |-------------------|------------------------------------------------------------------|------------------------------------------------------|
//! | **Listeners**     | Capability sets with no-op defaults.                             | [`JobListener`], [`StepListener`], [`ItemWriteListener`] |
//! | **Registry**      | Step → job → global override lookup.                             | [`ListenerRegistry`], [`ListenerScope`]              |
//! | **Pipeline**      | Ordered before, reverse teardown, first failure re-raised.       | [`ListenerPipeline`], [`ListenerContext`]            |
//! | **Executors**     | Engine-facing adapters, one per run scope.                       | [`JobListenerExecutor`], [`StepListenerExecutor`], [`ItemWriteListenerExecutor`] |
//! | **Polling**       | Launch, poll, cancel, exit code.                                 | [`JobRunner`], [`ExitCode`]                          |
//! | **Errors**        | Typed errors for usage, listeners and the engine.                | [`RuntimeError`], [`ListenerError`], [`EngineError`] |
//! | **Configuration** | Poll interval and log filter, from code or environment.          | [`Config`]                                           |
//!
//! ## Optional features
//! - `logging`: exports [`observability::ensure_initialized`], a `tracing-subscriber` bootstrap.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use batchvisor::{
//!     BoxError, ExecutionId, JobExecution, JobListener, JobListenerExecutor, JobParameters,
//!     ListenerContext, ListenerRegistry, ListenerScope, JOB_LISTENERS,
//! };
//!
//! struct MarkWarning;
//!
//! impl JobListener for MarkWarning {
//!     fn after_job(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
//!         ctx.set_exit_status("WARNING");
//!         Ok(())
//!     }
//! }
//!
//! let registry = ListenerRegistry::new()
//!     .with(ListenerScope::Global, JOB_LISTENERS, vec![Arc::new(MarkWarning) as Arc<dyn JobListener>])
//!     .unwrap();
//!
//! let mut execution = JobExecution::new(ExecutionId(1), "payroll", JobParameters::new());
//! let mut executor = JobListenerExecutor::new(Arc::new(registry), "payroll");
//! executor.before_job(&mut execution).unwrap();
//! executor.after_job(&mut execution).unwrap();
//! assert_eq!(execution.exit_status(), Some("WARNING"));
//! ```
mod config;
mod core;
mod engine;
mod error;
mod listeners;

// ---- Public re-exports ----

pub use config::{Config, ENV_LOG, ENV_POLL_INTERVAL_MS};
pub use crate::core::{ExitCode, JobRunner, spawn_shutdown_watcher, wait_for_shutdown_signal};
pub use engine::{
    BatchStatus, ExecutionId, JobEngine, JobExecution, JobParameters, WARNING_EXIT_STATUS,
};
pub use error::{BoxError, EngineError, ListenerError, Phase, RuntimeError};
pub use listeners::{
    ITEM_WRITE_LISTENERS, ItemWriteListener, ItemWriteListenerExecutor, JOB_LISTENERS,
    JobListener, JobListenerExecutor, ListenerContext, ListenerPipeline, ListenerRegistry,
    ListenerScope, LogListener, NamedListener, PipelineState, STEP_LISTENERS, StepListener,
    StepListenerExecutor,
};

// Optional: process-wide log bootstrap.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub mod observability;
