//! External job engine seam.
//!
//! The engine that actually runs steps, chunks and checkpoints lives outside this crate.
//! This module defines the data it exchanges with the orchestration core:
//!
//! ## Contents
//! - [`BatchStatus`] lifecycle status of a job run (with terminal-state classification)
//! - [`ExecutionId`], [`JobParameters`], [`JobExecution`] run handle and record
//! - [`JobEngine`] launch / status / exit-status contract consumed by [`JobRunner`](crate::JobRunner)
//!
//! ## Quick wiring
//! ```text
//! JobRunner ──► JobEngine::start(job, params) ──► ExecutionId
//!     └─► loop JobEngine::status(id) until BatchStatus::is_terminal()
//!     └─► JobEngine::exit_status(id) ──► ExitCode::derive
//!
//! Engine lifecycle hooks ──► Job/Step/ItemWrite listener executors (&mut JobExecution)
//! ```

mod engine;
mod execution;
mod status;

pub use engine::JobEngine;
pub use execution::{ExecutionId, JobExecution, JobParameters};
pub use status::{BatchStatus, WARNING_EXIT_STATUS};
