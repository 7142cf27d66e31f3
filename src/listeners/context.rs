//! # Per-round listener context.
//!
//! A [`ListenerContext`] is created by the pipeline at the start of every
//! before/after/on-error round and lent to each listener of that round in turn.
//! It is dropped when the round ends.
//!
//! ## Rules
//! - `process_succeeded` starts `true` and flips to `false` as soon as any listener
//!   of the round fails; later listeners of the same round observe it.
//! - Batch and exit status writes go straight through to the [`JobExecution`].

use crate::engine::{BatchStatus, ExecutionId, JobExecution};

/// Mutable view of a job run shared by the listeners of one round.
pub struct ListenerContext<'a> {
    job_name: &'a str,
    step_name: Option<&'a str>,
    process_succeeded: bool,
    execution: &'a mut JobExecution,
}

impl<'a> ListenerContext<'a> {
    pub(crate) fn new(
        job_name: &'a str,
        step_name: Option<&'a str>,
        execution: &'a mut JobExecution,
    ) -> Self {
        Self {
            job_name,
            step_name,
            process_succeeded: true,
            execution,
        }
    }

    pub fn job_name(&self) -> &str {
        self.job_name
    }

    /// Returns the step name for step and item-write rounds, `None` for job rounds.
    pub fn step_name(&self) -> Option<&str> {
        self.step_name
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution.id()
    }

    /// Returns `false` once any listener in the current round has failed.
    pub fn process_succeeded(&self) -> bool {
        self.process_succeeded
    }

    pub(crate) fn mark_failed(&mut self) {
        self.process_succeeded = false;
    }

    pub fn batch_status(&self) -> BatchStatus {
        self.execution.batch_status()
    }

    pub fn set_batch_status(&mut self, status: BatchStatus) {
        self.execution.set_batch_status(status);
    }

    pub fn exit_status(&self) -> Option<&str> {
        self.execution.exit_status()
    }

    pub fn set_exit_status(&mut self, exit_status: impl Into<String>) {
        self.execution.set_exit_status(exit_status);
    }

    /// Read-only access to the whole run record (parameters, id, ...).
    pub fn execution(&self) -> &JobExecution {
        &*self.execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::JobParameters;

    #[test]
    fn test_writes_reach_the_execution() {
        let mut exec = JobExecution::new(ExecutionId(3), "payroll", JobParameters::new());
        {
            let mut ctx = ListenerContext::new("payroll", Some("load"), &mut exec);
            assert!(ctx.process_succeeded());
            assert_eq!(ctx.step_name(), Some("load"));
            ctx.set_exit_status("WARNING");
            ctx.set_batch_status(BatchStatus::Failed);
            ctx.mark_failed();
            assert!(!ctx.process_succeeded());
        }
        assert_eq!(exec.exit_status(), Some("WARNING"));
        assert_eq!(exec.batch_status(), BatchStatus::Failed);
    }
}
