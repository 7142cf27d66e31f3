//! # Listener executors: the engine-facing adapters.
//!
//! The job engine calls one executor per run scope at its lifecycle points. Each executor
//! owns exactly one [`ListenerPipeline`] and maps the engine hook to a pipeline round:
//!
//! | Executor                        | Hook                | Round          |
//! |---------------------------------|---------------------|----------------|
//! | [`JobListenerExecutor`]         | `before_job`        | `run_before`   |
//! |                                 | `after_job`         | `run_after`    |
//! | [`StepListenerExecutor`]        | `before_step`       | `run_before`   |
//! |                                 | `after_step`        | `run_after`    |
//! | [`ItemWriteListenerExecutor`]   | `before_write`      | `run_before`   |
//! |                                 | `after_write`       | `run_after`    |
//! |                                 | `on_write_error`    | `run_on_error` |
//!
//! ## Rules
//! - Create a fresh executor for every job run, step run and chunk write.
//! - After a failed `before_*`, the engine must still call the teardown hook.

use std::sync::Arc;

use crate::engine::JobExecution;
use crate::error::RuntimeError;
use crate::listeners::listener::{ItemWriteListener, JobListener, StepListener};
use crate::listeners::pipeline::{ListenerPipeline, PipelineState};
use crate::listeners::registry::{
    ITEM_WRITE_LISTENERS, JOB_LISTENERS, ListenerRegistry, STEP_LISTENERS,
};

/// Runs job listeners around one job run.
pub struct JobListenerExecutor {
    pipeline: ListenerPipeline<dyn JobListener>,
}

impl JobListenerExecutor {
    /// Creates an executor resolving the default [`JOB_LISTENERS`] list.
    pub fn new(
        registry: Arc<ListenerRegistry<dyn JobListener>>,
        job_name: impl Into<String>,
    ) -> Self {
        Self::with_list(registry, JOB_LISTENERS, job_name)
    }

    /// Creates an executor resolving a custom list name.
    pub fn with_list(
        registry: Arc<ListenerRegistry<dyn JobListener>>,
        list_name: &'static str,
        job_name: impl Into<String>,
    ) -> Self {
        Self {
            pipeline: ListenerPipeline::new(registry, list_name, job_name, None),
        }
    }

    pub fn before_job(&mut self, execution: &mut JobExecution) -> Result<(), RuntimeError> {
        self.pipeline
            .run_before(execution, |listener, ctx| listener.before_job(ctx))
    }

    pub fn after_job(&mut self, execution: &mut JobExecution) -> Result<(), RuntimeError> {
        self.pipeline
            .run_after(execution, |listener, ctx| listener.after_job(ctx))
    }

    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }
}

/// Runs step listeners around one step run.
pub struct StepListenerExecutor {
    pipeline: ListenerPipeline<dyn StepListener>,
}

impl StepListenerExecutor {
    /// Creates an executor resolving the default [`STEP_LISTENERS`] list.
    pub fn new(
        registry: Arc<ListenerRegistry<dyn StepListener>>,
        job_name: impl Into<String>,
        step_name: impl Into<String>,
    ) -> Self {
        Self {
            pipeline: ListenerPipeline::new(
                registry,
                STEP_LISTENERS,
                job_name,
                Some(step_name.into()),
            ),
        }
    }

    pub fn before_step(&mut self, execution: &mut JobExecution) -> Result<(), RuntimeError> {
        self.pipeline
            .run_before(execution, |listener, ctx| listener.before_step(ctx))
    }

    pub fn after_step(&mut self, execution: &mut JobExecution) -> Result<(), RuntimeError> {
        self.pipeline
            .run_after(execution, |listener, ctx| listener.after_step(ctx))
    }

    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }
}

/// Runs item-write listeners around one chunk write of a step.
pub struct ItemWriteListenerExecutor<T: 'static> {
    pipeline: ListenerPipeline<dyn ItemWriteListener<T>>,
}

impl<T: 'static> ItemWriteListenerExecutor<T> {
    /// Creates an executor resolving the default [`ITEM_WRITE_LISTENERS`] list.
    pub fn new(
        registry: Arc<ListenerRegistry<dyn ItemWriteListener<T>>>,
        job_name: impl Into<String>,
        step_name: impl Into<String>,
    ) -> Self {
        Self {
            pipeline: ListenerPipeline::new(
                registry,
                ITEM_WRITE_LISTENERS,
                job_name,
                Some(step_name.into()),
            ),
        }
    }

    pub fn before_write(
        &mut self,
        items: &[T],
        execution: &mut JobExecution,
    ) -> Result<(), RuntimeError> {
        self.pipeline
            .run_before(execution, |listener, ctx| listener.before_write(items, ctx))
    }

    pub fn after_write(
        &mut self,
        items: &[T],
        execution: &mut JobExecution,
    ) -> Result<(), RuntimeError> {
        self.pipeline
            .run_after(execution, |listener, ctx| listener.after_write(items, ctx))
    }

    /// Tears down with `on_write_error` after the writer failed with `error`.
    pub fn on_write_error(
        &mut self,
        items: &[T],
        error: &(dyn std::error::Error + Send + Sync),
        execution: &mut JobExecution,
    ) -> Result<(), RuntimeError> {
        self.pipeline.run_on_error(execution, |listener, ctx| {
            listener.on_write_error(items, error, ctx)
        })
    }

    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tracing_test::traced_test;

    use super::*;
    use crate::engine::{BatchStatus, ExecutionId, JobParameters};
    use crate::error::{BoxError, ListenerError, Phase};
    use crate::listeners::context::ListenerContext;
    use crate::listeners::registry::ListenerScope;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Audit {
        tag: &'static str,
        log: Log,
    }

    impl Audit {
        fn push(&self, entry: String) {
            self.log.lock().unwrap().push(format!("{}:{}", self.tag, entry));
        }
    }

    impl JobListener for Audit {
        fn name(&self) -> &str {
            self.tag
        }

        fn after_job(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
            self.push(format!("after_job:{}", ctx.batch_status()));
            ctx.set_exit_status("WARNING");
            Ok(())
        }
    }

    impl StepListener for Audit {
        fn name(&self) -> &str {
            self.tag
        }

        fn before_step(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
            self.push(format!("before_step:{}", ctx.step_name().unwrap_or("-")));
            Ok(())
        }

        fn after_step(&self, _ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
            self.push("after_step".into());
            Err("step cleanup failed".into())
        }
    }

    impl ItemWriteListener<u32> for Audit {
        fn name(&self) -> &str {
            self.tag
        }

        fn before_write(
            &self,
            items: &[u32],
            _ctx: &mut ListenerContext<'_>,
        ) -> Result<(), BoxError> {
            self.push(format!("before_write:{}", items.len()));
            Ok(())
        }

        fn after_write(
            &self,
            _items: &[u32],
            _ctx: &mut ListenerContext<'_>,
        ) -> Result<(), BoxError> {
            self.push("after_write".into());
            Ok(())
        }

        fn on_write_error(
            &self,
            items: &[u32],
            error: &(dyn std::error::Error + Send + Sync),
            _ctx: &mut ListenerContext<'_>,
        ) -> Result<(), BoxError> {
            self.push(format!("on_write_error:{}:{error}", items.len()));
            Ok(())
        }
    }

    /// Refuses to open a step.
    struct Gate;

    impl StepListener for Gate {
        fn name(&self) -> &str {
            "gate"
        }

        fn before_step(&self, _ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
            Err("input file missing".into())
        }
    }

    fn execution() -> JobExecution {
        JobExecution::new(ExecutionId(11), "payroll", JobParameters::new())
    }

    #[test]
    fn test_job_executor_only_no_op_before() {
        let log: Log = Arc::default();
        let listener: Arc<dyn JobListener> = Arc::new(Audit {
            tag: "audit",
            log: Arc::clone(&log),
        });
        let registry = ListenerRegistry::new()
            .with(ListenerScope::job("payroll"), JOB_LISTENERS, vec![listener])
            .expect("valid registry");
        let mut exec = execution();
        exec.set_batch_status(BatchStatus::Completed);

        let mut executor = JobListenerExecutor::new(Arc::new(registry), "payroll");
        executor.before_job(&mut exec).expect("default before_job");
        executor.after_job(&mut exec).expect("after_job");

        assert_eq!(executor.state(), PipelineState::Done);
        assert_eq!(*log.lock().unwrap(), vec!["audit:after_job:COMPLETED"]);
        assert_eq!(exec.exit_status(), Some("WARNING"));
    }

    #[test]
    fn test_step_executor_resolves_step_override() {
        let log: Log = Arc::default();
        let global: Arc<dyn StepListener> = Arc::new(Audit {
            tag: "global",
            log: Arc::clone(&log),
        });
        let special: Arc<dyn StepListener> = Arc::new(Audit {
            tag: "special",
            log: Arc::clone(&log),
        });
        let registry = Arc::new(
            ListenerRegistry::new()
                .with(ListenerScope::Global, STEP_LISTENERS, vec![global])
                .and_then(|r| {
                    r.with(ListenerScope::step("payroll", "load"), STEP_LISTENERS, vec![special])
                })
                .expect("valid registry"),
        );
        let mut exec = execution();

        let mut load = StepListenerExecutor::new(Arc::clone(&registry), "payroll", "load");
        load.before_step(&mut exec).expect("before_step");
        let err = load.after_step(&mut exec).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Listener(ListenerError::Failed { ref listener, phase: Phase::After, .. })
                if listener == "special"
        ));

        let mut export = StepListenerExecutor::new(registry, "payroll", "export");
        export.before_step(&mut exec).expect("before_step");

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "special:before_step:load",
                "special:after_step",
                "global:before_step:export",
            ]
        );
    }

    #[test]
    fn test_item_write_executor_error_path() {
        let log: Log = Arc::default();
        let first: Arc<dyn ItemWriteListener<u32>> = Arc::new(Audit {
            tag: "first",
            log: Arc::clone(&log),
        });
        let second: Arc<dyn ItemWriteListener<u32>> = Arc::new(Audit {
            tag: "second",
            log: Arc::clone(&log),
        });
        let registry = ListenerRegistry::new()
            .with(ListenerScope::Global, ITEM_WRITE_LISTENERS, vec![first, second])
            .expect("valid registry");
        let mut exec = execution();
        let items = [1, 2, 3];
        let write_error = std::io::Error::other("constraint violation");

        let mut executor = ItemWriteListenerExecutor::new(Arc::new(registry), "payroll", "load");
        executor.before_write(&items, &mut exec).expect("before_write");
        executor
            .on_write_error(&items, &write_error, &mut exec)
            .expect("on_write_error");

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first:before_write:3",
                "second:before_write:3",
                "second:on_write_error:3:constraint violation",
                "first:on_write_error:3:constraint violation",
            ]
        );
    }

    #[test]
    fn test_item_write_executor_after_path() {
        let log: Log = Arc::default();
        let only: Arc<dyn ItemWriteListener<u32>> = Arc::new(Audit {
            tag: "only",
            log: Arc::clone(&log),
        });
        let registry = ListenerRegistry::new()
            .with(ListenerScope::job("payroll"), ITEM_WRITE_LISTENERS, vec![only])
            .expect("valid registry");
        let mut exec = execution();

        let mut executor = ItemWriteListenerExecutor::new(Arc::new(registry), "payroll", "load");
        executor.before_write(&[7], &mut exec).expect("before_write");
        executor.after_write(&[7], &mut exec).expect("after_write");
        assert_eq!(executor.state(), PipelineState::Done);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["only:before_write:1", "only:after_write"]
        );
    }

    #[traced_test]
    #[test]
    fn test_step_teardown_failures_are_logged_with_step() {
        let log: Log = Arc::default();
        let first: Arc<dyn StepListener> = Arc::new(Audit {
            tag: "first",
            log: Arc::clone(&log),
        });
        let second: Arc<dyn StepListener> = Arc::new(Audit {
            tag: "second",
            log: Arc::clone(&log),
        });
        let registry = ListenerRegistry::new()
            .with(ListenerScope::Global, STEP_LISTENERS, vec![first, second])
            .expect("valid registry");
        let mut exec = execution();

        let mut executor = StepListenerExecutor::new(Arc::new(registry), "payroll", "reconcile");
        executor.before_step(&mut exec).expect("before_step");
        let err = executor.after_step(&mut exec).unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::Listener(ListenerError::Failed { ref listener, phase: Phase::After, .. })
                if listener == "second"
        ));
        logs_assert(|lines: &[&str]| {
            let warned = lines
                .iter()
                .filter(|line| {
                    line.contains("listener teardown failed")
                        && line.contains("payroll")
                        && line.contains("reconcile")
                        && line.contains("step cleanup failed")
                })
                .count();
            match warned {
                2 => Ok(()),
                n => Err(format!("expected 2 teardown warnings, got {n}")),
            }
        });
    }

    #[traced_test]
    #[test]
    fn test_step_before_failure_is_logged_and_torn_down() {
        let log: Log = Arc::default();
        let audit: Arc<dyn StepListener> = Arc::new(Audit {
            tag: "audit",
            log: Arc::clone(&log),
        });
        let registry = ListenerRegistry::new()
            .with(
                ListenerScope::step("payroll", "reconcile"),
                STEP_LISTENERS,
                vec![audit, Arc::new(Gate) as Arc<dyn StepListener>],
            )
            .expect("valid registry");
        let mut exec = execution();

        let mut executor = StepListenerExecutor::new(Arc::new(registry), "payroll", "reconcile");
        let err = executor.before_step(&mut exec).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Listener(ListenerError::Failed { ref listener, phase: Phase::Before, .. })
                if listener == "gate"
        ));
        assert_eq!(executor.state(), PipelineState::Done);

        logs_assert(|lines: &[&str]| {
            lines
                .iter()
                .find(|line| {
                    line.contains("WARN")
                        && line.contains("before round aborted")
                        && line.contains("reconcile")
                        && line.contains("input file missing")
                })
                .map(|_| ())
                .ok_or_else(|| "missing before-round warning".to_string())
        });

        // Both stacked listeners are still torn down; Gate keeps the no-op after_step.
        let err = executor.after_step(&mut exec).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Listener(ListenerError::Failed { ref listener, .. })
                if listener == "audit"
        ));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["audit:before_step:reconcile", "audit:after_step"]
        );
    }
}
