//! # Job completion poller.
//!
//! [`JobRunner`] launches one job run on the external engine, polls it until a terminal
//! status, and turns the outcome into an [`ExitCode`].
//!
//! ## Flow
//! ```text
//! execute(poll_interval_ms)
//!   ├─► poll_interval_ms == 0 ─► Err(InvalidArgument)       (nothing launched)
//!   ├─► start() ─► engine.start(job, params) ─► ExecutionId
//!   │      └─ already started ─► Err(InvalidState)
//!   ├─► loop {
//!   │     status = engine.status(id)
//!   │     terminal? ─► break
//!   │     select! { sleep(interval) ─► continue
//!   │               cancelled       ─► return Ok(ExitCode::Failure) }
//!   │   }
//!   └─► ExitCode::derive(status, engine.exit_status(id))
//! ```
//!
//! ## Rules
//! - One runner launches at most one job run; there is no relaunch.
//! - The sleep between polls is the only cancellation point; cancellation is never an error.
//! - There is no timeout: polling continues until a terminal status or cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::exit_code::ExitCode;
use crate::core::shutdown::spawn_shutdown_watcher;
use crate::engine::{ExecutionId, JobEngine, JobParameters};
use crate::error::RuntimeError;

/// One-shot launcher and completion poller for a named job.
pub struct JobRunner<E: ?Sized> {
    engine: Arc<E>,
    job_name: String,
    parameters: JobParameters,
    execution: Option<ExecutionId>,
    cancel: CancellationToken,
}

impl<E: JobEngine + ?Sized> JobRunner<E> {
    /// Creates a runner for `job_name`; nothing is launched until [`start`](Self::start)
    /// or [`execute`](Self::execute).
    pub fn new(engine: Arc<E>, job_name: impl Into<String>, parameters: JobParameters) -> Self {
        Self {
            engine,
            job_name: job_name.into(),
            parameters,
            execution: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token observed while sleeping between polls.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a clone of the token that interrupts polling.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels polling when the process receives a termination signal.
    pub fn cancel_on_shutdown_signal(&self) -> JoinHandle<()> {
        spawn_shutdown_watcher(self.cancel.clone())
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Returns the run handle once the job was launched.
    pub fn execution(&self) -> Option<ExecutionId> {
        self.execution
    }

    /// Launches the job and records the run handle.
    ///
    /// ### Errors
    /// - `InvalidState` if this runner already launched its job.
    /// - `Engine` if the engine refused the launch.
    pub async fn start(&mut self) -> Result<ExecutionId, RuntimeError> {
        if let Some(id) = self.execution {
            return Err(RuntimeError::invalid_state(
                &self.job_name,
                format!("job already started as execution {id}"),
            ));
        }

        let id = self.engine.start(&self.job_name, &self.parameters).await?;
        info!(job = %self.job_name, execution = %id, "job launched");
        self.execution = Some(id);
        Ok(id)
    }

    /// Launches the job, waits for a terminal status and derives the exit code.
    ///
    /// ### Errors
    /// - `InvalidArgument` if `poll_interval_ms` is `0` (checked before launching).
    /// - Everything [`start`](Self::start) returns.
    /// - `Engine` if a status read fails.
    ///
    /// Cancellation while sleeping is not an error: it yields `Ok(ExitCode::Failure)`.
    pub async fn execute(&mut self, poll_interval_ms: u64) -> Result<ExitCode, RuntimeError> {
        if poll_interval_ms < 1 {
            return Err(RuntimeError::invalid_argument(
                "poll_interval_ms",
                format!("must be >= 1, got {poll_interval_ms}"),
            ));
        }
        let interval = Duration::from_millis(poll_interval_ms);
        let id = self.start().await?;

        let mut polls: u64 = 0;
        let status = loop {
            let status = self.engine.status(id).await?;
            polls += 1;
            if status.is_terminal() {
                break status;
            }
            debug!(
                job = %self.job_name,
                execution = %id,
                status = %status,
                poll = polls,
                "job still running"
            );

            let sleep = time::sleep(interval);
            tokio::pin!(sleep);
            select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(
                        job = %self.job_name,
                        execution = %id,
                        "polling interrupted; reporting abnormal termination"
                    );
                    return Ok(ExitCode::Failure);
                }
                _ = &mut sleep => {}
            }
        };

        let exit_status = self.engine.exit_status(id).await?;
        let code = ExitCode::derive(status, exit_status.as_deref());
        info!(
            job = %self.job_name,
            execution = %id,
            status = %status,
            exit_status = exit_status.as_deref().unwrap_or("-"),
            exit_code = code.code(),
            polls,
            "job finished"
        );
        Ok(code)
    }

    /// [`execute`](Self::execute) with the interval from `cfg`.
    pub async fn execute_with(&mut self, cfg: &Config) -> Result<ExitCode, RuntimeError> {
        self.execute(cfg.poll_interval_ms).await
    }
}
