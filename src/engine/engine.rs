//! # Job engine contract.
//!
//! [`JobEngine`] is the extension point for plugging the real batch engine into
//! [`JobRunner`](crate::JobRunner). The runner only launches and observes; step/chunk
//! processing and checkpointing stay inside the engine.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use batchvisor::{BatchStatus, EngineError, ExecutionId, JobEngine, JobParameters};
//!
//! struct AlwaysDone;
//!
//! #[async_trait]
//! impl JobEngine for AlwaysDone {
//!     async fn start(&self, _job: &str, _params: &JobParameters) -> Result<ExecutionId, EngineError> {
//!         Ok(ExecutionId(1))
//!     }
//!     async fn status(&self, _id: ExecutionId) -> Result<BatchStatus, EngineError> {
//!         Ok(BatchStatus::Completed)
//!     }
//!     async fn exit_status(&self, _id: ExecutionId) -> Result<Option<String>, EngineError> {
//!         Ok(Some("COMPLETED".into()))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::engine::{BatchStatus, ExecutionId, JobParameters};
use crate::error::EngineError;

/// External batch engine consumed by the completion poller.
///
/// ### Implementation requirements
/// - `start` returns as soon as the run is launched; it must not wait for completion.
/// - `status` and `exit_status` are cheap reads; they are called once per poll.
#[async_trait]
pub trait JobEngine: Send + Sync + 'static {
    /// Launches `job_name` with `parameters` and returns the run handle.
    async fn start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, EngineError>;

    /// Reads the current batch status of a run.
    async fn status(&self, execution: ExecutionId) -> Result<BatchStatus, EngineError>;

    /// Reads the exit-status string of a run, if the engine has set one.
    async fn exit_status(&self, execution: ExecutionId) -> Result<Option<String>, EngineError>;
}
