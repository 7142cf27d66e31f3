//! # LogListener: lifecycle logger
//!
//! A minimal listener that emits one `tracing` event per lifecycle boundary.
//! It implements every capability set, so one instance can be registered for jobs,
//! steps and item writes alike.
//!
//! ## Example output
//! ```text
//! INFO batchvisor::listeners::log: job starting job="payroll" execution=#4
//! INFO batchvisor::listeners::log: step finished job="payroll" step="load" exit_status="-"
//! WARN batchvisor::listeners::log: write failed job="payroll" step="load" items=50 error=...
//! ```

use tracing::{info, warn};

use crate::error::BoxError;
use crate::listeners::context::ListenerContext;
use crate::listeners::listener::{ItemWriteListener, JobListener, StepListener};

/// Lifecycle logger listener.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogListener;

impl LogListener {
    /// Construct a new [`LogListener`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl JobListener for LogListener {
    fn name(&self) -> &str {
        "LogListener"
    }

    fn before_job(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        info!(job = ctx.job_name(), execution = %ctx.execution_id(), "job starting");
        Ok(())
    }

    fn after_job(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        info!(
            job = ctx.job_name(),
            execution = %ctx.execution_id(),
            status = %ctx.batch_status(),
            exit_status = ctx.exit_status().unwrap_or("-"),
            "job finished"
        );
        Ok(())
    }
}

impl StepListener for LogListener {
    fn name(&self) -> &str {
        "LogListener"
    }

    fn before_step(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        info!(
            job = ctx.job_name(),
            step = ctx.step_name().unwrap_or("-"),
            "step starting"
        );
        Ok(())
    }

    fn after_step(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        info!(
            job = ctx.job_name(),
            step = ctx.step_name().unwrap_or("-"),
            exit_status = ctx.exit_status().unwrap_or("-"),
            "step finished"
        );
        Ok(())
    }
}

impl<T> ItemWriteListener<T> for LogListener {
    fn name(&self) -> &str {
        "LogListener"
    }

    fn after_write(&self, items: &[T], ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        info!(
            job = ctx.job_name(),
            step = ctx.step_name().unwrap_or("-"),
            items = items.len(),
            "items written"
        );
        Ok(())
    }

    fn on_write_error(
        &self,
        items: &[T],
        error: &(dyn std::error::Error + Send + Sync),
        ctx: &mut ListenerContext<'_>,
    ) -> Result<(), BoxError> {
        warn!(
            job = ctx.job_name(),
            step = ctx.step_name().unwrap_or("-"),
            items = items.len(),
            error = %error,
            "write failed"
        );
        Ok(())
    }
}
