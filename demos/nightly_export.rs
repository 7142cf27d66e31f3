//! # Example: nightly_export
//!
//! Runs a two-step job on a toy in-memory engine and exits with the derived exit code.
//!
//! Demonstrates how to:
//! - Register listeners globally, per job and per step with [`ListenerRegistry`].
//! - Drive the listener executors from engine lifecycle hooks.
//! - Launch and poll the job with [`JobRunner`], interruptible with Ctrl-C.
//!
//! ## Flow
//! ```text
//! JobRunner::execute(poll)
//!     ├─► InMemoryEngine::start() ─► spawn job
//!     │     ├─► JobListenerExecutor::before_job
//!     │     ├─► for step in [extract, export]:
//!     │     │     ├─► StepListenerExecutor::before_step
//!     │     │     ├─► ItemWriteListenerExecutor::{before_write, after_write}
//!     │     │     └─► StepListenerExecutor::after_step
//!     │     └─► JobListenerExecutor::after_job
//!     └─► poll status until terminal ─► ExitCode
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example nightly_export --features logging
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use batchvisor::{
    BatchStatus, BoxError, Config, EngineError, ExecutionId, ITEM_WRITE_LISTENERS,
    ItemWriteListener, ItemWriteListenerExecutor, JOB_LISTENERS, JobEngine, JobExecution,
    JobListener, JobListenerExecutor, JobParameters, JobRunner, ListenerContext, ListenerRegistry,
    ListenerScope, LogListener, RuntimeError, STEP_LISTENERS, StepListener, StepListenerExecutor,
    observability,
};

/// Flags the run as WARNING when a step wrote nothing.
struct EmptyExportGuard;

impl ItemWriteListener<String> for EmptyExportGuard {
    fn name(&self) -> &str {
        "empty-export-guard"
    }

    fn after_write(&self, items: &[String], ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        if items.is_empty() {
            ctx.set_exit_status("WARNING");
        }
        Ok(())
    }
}

struct Listeners {
    jobs: Arc<ListenerRegistry<dyn JobListener>>,
    steps: Arc<ListenerRegistry<dyn StepListener>>,
    writes: Arc<ListenerRegistry<dyn ItemWriteListener<String>>>,
}

impl Listeners {
    fn build() -> Result<Self, RuntimeError> {
        let log = Arc::new(LogListener::new());
        let jobs = ListenerRegistry::new().with(
            ListenerScope::Global,
            JOB_LISTENERS,
            vec![log.clone() as Arc<dyn JobListener>],
        )?;
        let steps = ListenerRegistry::new().with(
            ListenerScope::job("nightly_export"),
            STEP_LISTENERS,
            vec![log.clone() as Arc<dyn StepListener>],
        )?;
        let writes = ListenerRegistry::new().with(
            ListenerScope::step("nightly_export", "export"),
            ITEM_WRITE_LISTENERS,
            vec![
                log as Arc<dyn ItemWriteListener<String>>,
                Arc::new(EmptyExportGuard),
            ],
        )?;
        Ok(Self {
            jobs: Arc::new(jobs),
            steps: Arc::new(steps),
            writes: Arc::new(writes),
        })
    }
}

/// Shared state of the toy engine: listener registries and the execution table.
struct EngineState {
    listeners: Listeners,
    executions: Mutex<HashMap<ExecutionId, JobExecution>>,
}

impl EngineState {
    fn run_job(&self, mut execution: JobExecution) -> JobExecution {
        let job = execution.job_name().to_string();
        execution.set_batch_status(BatchStatus::Started);

        let mut job_listeners = JobListenerExecutor::new(self.listeners.jobs.clone(), &job);
        let mut failed = job_listeners.before_job(&mut execution).is_err();

        let steps = [
            ("extract", vec!["a".to_string(), "b".to_string()]),
            ("export", vec![]),
        ];
        for (step, items) in steps {
            if failed {
                break;
            }
            let mut step_listeners =
                StepListenerExecutor::new(self.listeners.steps.clone(), &job, step);

            // A failed before_step skips the chunk but still tears the step listeners down.
            if step_listeners.before_step(&mut execution).is_ok() {
                let mut writes =
                    ItemWriteListenerExecutor::new(self.listeners.writes.clone(), &job, step);
                failed |= writes.before_write(&items, &mut execution).is_err();
                failed |= writes.after_write(&items, &mut execution).is_err();
            } else {
                failed = true;
            }
            failed |= step_listeners.after_step(&mut execution).is_err();
        }

        if job_listeners.after_job(&mut execution).is_err() {
            failed = true;
        }
        execution.set_batch_status(if failed {
            BatchStatus::Failed
        } else {
            BatchStatus::Completed
        });
        execution
    }

    fn read<R>(
        &self,
        id: ExecutionId,
        f: impl FnOnce(&JobExecution) -> R,
    ) -> Result<R, EngineError> {
        let table = self
            .executions
            .lock()
            .map_err(|_| EngineError::Unavailable("execution table poisoned".into()))?;
        table.get(&id).map(f).ok_or(EngineError::UnknownExecution(id))
    }
}

/// Toy engine: runs each job on a tokio task and keeps executions in memory.
struct InMemoryEngine {
    state: Arc<EngineState>,
    next_id: AtomicU64,
}

#[async_trait]
impl JobEngine for InMemoryEngine {
    async fn start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, EngineError> {
        let id = ExecutionId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let execution = JobExecution::new(id, job_name, parameters.clone());
        self.state
            .executions
            .lock()
            .map_err(|_| EngineError::Unavailable("execution table poisoned".into()))?
            .insert(id, execution.clone());

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let done = state.run_job(execution);
            if let Ok(mut table) = state.executions.lock() {
                table.insert(id, done);
            }
        });
        Ok(id)
    }

    async fn status(&self, execution: ExecutionId) -> Result<BatchStatus, EngineError> {
        self.state.read(execution, JobExecution::batch_status)
    }

    async fn exit_status(&self, execution: ExecutionId) -> Result<Option<String>, EngineError> {
        self.state
            .read(execution, |e| e.exit_status().map(str::to_string))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<std::process::ExitCode, Box<dyn std::error::Error>> {
    // 1. Configuration and logging
    let cfg = Config::from_env()?;
    observability::ensure_initialized(&cfg.log_filter);

    // 2. Engine with its listener registries
    let engine = Arc::new(InMemoryEngine {
        state: Arc::new(EngineState {
            listeners: Listeners::build()?,
            executions: Mutex::new(HashMap::new()),
        }),
        next_id: AtomicU64::new(0),
    });

    // 3. Launch, poll, derive exit code (Ctrl-C interrupts polling)
    let params = JobParameters::new().with("run.date", "2026-10-18");
    let mut runner = JobRunner::new(engine, "nightly_export", params);
    let _watcher = runner.cancel_on_shutdown_signal();
    let code = runner.execute_with(&cfg).await?;

    println!("exit code: {code}");
    Ok(code.into())
}
