//! # Listener execution pipeline.
//!
//! Drives one run scope (a job, a step, or a chunk write) through the listener protocol:
//! run every listener's "before" callback in configured order, then tear them down in
//! reverse order with "after" or "on-error".
//!
//! ## Flow
//! ```text
//! run_before(cb)
//!   ├─► resolve list (registry, once per round)
//!   └─► for l in list:  push l onto stack ─► cb(l, ctx)
//!                                              └─ Err/panic ─► ctx.failed, re-raise, stop
//!
//! run_after(cb) / run_on_error(cb)
//!   └─► for l in stack.rev():  cb(l, ctx)
//!                                └─ Err/panic ─► record + warn!, keep going
//!       └─► aggregate non-empty ─► re-raise the FIRST failure only
//! ```
//!
//! ## State machine
//! ```text
//! Idle ─► BeforeRunning ─► BeforeDone ─► AfterRunning | OnErrorRunning ─► Done
//!               └──────── failure ────────────────────────────────────► Done
//! ```
//!
//! ## Rules
//! - A listener is on the stack iff its "before" callback was entered, even if it failed.
//! - Teardown invokes every stacked listener exactly once, whatever the others do.
//! - Panics are caught and reported as [`ListenerError::Fault`].
//! - One pipeline serves exactly one run scope and holds no locks.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::JobExecution;
use crate::error::{BoxError, ListenerError, Phase, RuntimeError};
use crate::listeners::context::ListenerContext;
use crate::listeners::failures::{FailureAggregate, panic_message};
use crate::listeners::listener::NamedListener;
use crate::listeners::registry::ListenerRegistry;

/// Lifecycle of one pipeline instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing ran yet.
    Idle,
    /// Inside the "before" round.
    BeforeRunning,
    /// Every "before" callback succeeded.
    BeforeDone,
    /// Inside the "after" round.
    AfterRunning,
    /// Inside the "on-error" round.
    OnErrorRunning,
    /// Torn down, or the "before" round failed.
    Done,
}

/// Run-scoped driver of the before/after/on-error protocol over one listener list.
pub struct ListenerPipeline<L: ?Sized> {
    registry: Arc<ListenerRegistry<L>>,
    list_name: Cow<'static, str>,
    job_name: String,
    step_name: Option<String>,
    executed: Vec<Arc<L>>,
    state: PipelineState,
    torn_down: bool,
}

impl<L: ?Sized + NamedListener> ListenerPipeline<L> {
    /// Creates an idle pipeline for one run scope.
    ///
    /// `step_name` is `None` for job-level scopes.
    pub fn new(
        registry: Arc<ListenerRegistry<L>>,
        list_name: impl Into<Cow<'static, str>>,
        job_name: impl Into<String>,
        step_name: Option<String>,
    ) -> Self {
        Self {
            registry,
            list_name: list_name.into(),
            job_name: job_name.into(),
            step_name,
            executed: Vec::new(),
            state: PipelineState::Idle,
            torn_down: false,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Listeners whose "before" callback was entered, in invocation order.
    pub fn executed(&self) -> &[Arc<L>] {
        &self.executed
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn step_name(&self) -> Option<&str> {
        self.step_name.as_deref()
    }

    /// Runs `callback` for every resolved listener in configured order.
    ///
    /// Stops at the first failure and re-raises it; listeners invoked so far, including
    /// the failing one, stay on the stack for teardown.
    ///
    /// ### Errors
    /// - `InvalidState` if this pipeline already ran a "before" round.
    /// - `Listener` with the failure of the first listener that failed.
    pub fn run_before<F>(
        &mut self,
        execution: &mut JobExecution,
        mut callback: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(&L, &mut ListenerContext<'_>) -> Result<(), BoxError>,
    {
        if self.state != PipelineState::Idle {
            return Err(RuntimeError::invalid_state(
                &self.job_name,
                format!(
                    "before round of `{}` cannot run in state {:?}",
                    self.list_name, self.state
                ),
            ));
        }
        self.state = PipelineState::BeforeRunning;

        let registry = Arc::clone(&self.registry);
        let listeners =
            registry.resolve(&self.list_name, &self.job_name, self.step_name.as_deref());
        debug!(
            job = %self.job_name,
            step = self.step_name.as_deref().unwrap_or("-"),
            list = %self.list_name,
            listeners = listeners.len(),
            "running before round"
        );

        let mut ctx = ListenerContext::new(&self.job_name, self.step_name.as_deref(), execution);
        for listener in listeners {
            self.executed.push(Arc::clone(listener));
            if let Err(failure) = invoke(listener.as_ref(), &mut ctx, Phase::Before, &mut callback)
            {
                ctx.mark_failed();
                warn!(
                    job = %self.job_name,
                    step = self.step_name.as_deref().unwrap_or("-"),
                    listener = failure.listener(),
                    phase = %Phase::Before,
                    error = %failure,
                    "listener failed; before round aborted"
                );
                self.state = PipelineState::Done;
                return Err(failure.into());
            }
        }

        self.state = PipelineState::BeforeDone;
        Ok(())
    }

    /// Tears down every stacked listener, most recent first, with the "after" callback.
    ///
    /// All listeners run even if some fail; every failure is logged and only the first
    /// one is re-raised.
    pub fn run_after<F>(
        &mut self,
        execution: &mut JobExecution,
        callback: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(&L, &mut ListenerContext<'_>) -> Result<(), BoxError>,
    {
        self.run_teardown(Phase::After, execution, callback)
    }

    /// Same contract as [`run_after`](Self::run_after), for run scopes that aborted.
    pub fn run_on_error<F>(
        &mut self,
        execution: &mut JobExecution,
        callback: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(&L, &mut ListenerContext<'_>) -> Result<(), BoxError>,
    {
        self.run_teardown(Phase::OnError, execution, callback)
    }

    fn run_teardown<F>(
        &mut self,
        phase: Phase,
        execution: &mut JobExecution,
        mut callback: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(&L, &mut ListenerContext<'_>) -> Result<(), BoxError>,
    {
        if self.torn_down {
            return Err(RuntimeError::invalid_state(
                &self.job_name,
                format!("`{}` listeners were already torn down", self.list_name),
            ));
        }
        self.state = match phase {
            Phase::OnError => PipelineState::OnErrorRunning,
            _ => PipelineState::AfterRunning,
        };

        let mut failures = FailureAggregate::new();
        let mut ctx = ListenerContext::new(&self.job_name, self.step_name.as_deref(), execution);
        for listener in self.executed.iter().rev() {
            if let Err(failure) = invoke(listener.as_ref(), &mut ctx, phase, &mut callback) {
                ctx.mark_failed();
                warn!(
                    job = %self.job_name,
                    step = self.step_name.as_deref().unwrap_or("-"),
                    listener = failure.listener(),
                    phase = %phase,
                    error = %failure,
                    "listener teardown failed"
                );
                failures.record(failure);
            }
        }

        self.state = PipelineState::Done;
        self.torn_down = true;

        if failures.len() > 1 {
            debug!(
                job = %self.job_name,
                discarded = failures.len() - 1,
                "re-raising first teardown failure only"
            );
        }
        match failures.into_first() {
            Some(first) => Err(first.into()),
            None => Ok(()),
        }
    }
}

/// Invokes one callback, converting a returned error or a panic into a [`ListenerError`].
fn invoke<L, F>(
    listener: &L,
    ctx: &mut ListenerContext<'_>,
    phase: Phase,
    callback: &mut F,
) -> Result<(), ListenerError>
where
    L: ?Sized + NamedListener,
    F: FnMut(&L, &mut ListenerContext<'_>) -> Result<(), BoxError>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| callback(listener, ctx))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(ListenerError::Failed {
            listener: listener.listener_name().to_string(),
            phase,
            source,
        }),
        Err(payload) => Err(ListenerError::Fault {
            listener: listener.listener_name().to_string(),
            phase,
            message: panic_message(payload.as_ref()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tracing_test::traced_test;

    use super::*;
    use crate::engine::{ExecutionId, JobParameters};
    use crate::listeners::listener::JobListener;
    use crate::listeners::registry::{JOB_LISTENERS, ListenerScope};

    #[derive(Debug)]
    struct Boom(&'static str);

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Boom {}

    #[derive(Clone, Copy)]
    enum Behavior {
        Ok,
        Fail(&'static str),
        Panic(&'static str),
    }

    struct Recorder {
        name: &'static str,
        before: Behavior,
        after: Behavior,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn react(
            &self,
            phase: &str,
            behavior: Behavior,
            ctx: &ListenerContext<'_>,
        ) -> Result<(), BoxError> {
            self.calls.lock().unwrap().push(format!(
                "{}:{}:{}",
                self.name,
                phase,
                ctx.process_succeeded()
            ));
            match behavior {
                Behavior::Ok => Ok(()),
                Behavior::Fail(msg) => Err(Box::new(Boom(msg))),
                Behavior::Panic(msg) => panic!("{}", msg),
            }
        }
    }

    impl JobListener for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn before_job(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
            self.react("before", self.before, ctx)
        }

        fn after_job(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
            self.react("after", self.after, ctx)
        }
    }

    struct Fixture {
        calls: Arc<Mutex<Vec<String>>>,
        pipeline: ListenerPipeline<dyn JobListener>,
        execution: JobExecution,
    }

    impl Fixture {
        fn new(spec: &[(&'static str, Behavior, Behavior)]) -> Self {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let listeners: Vec<Arc<dyn JobListener>> = spec
                .iter()
                .map(|&(name, before, after)| {
                    Arc::new(Recorder {
                        name,
                        before,
                        after,
                        calls: Arc::clone(&calls),
                    }) as Arc<dyn JobListener>
                })
                .collect();
            let registry = ListenerRegistry::new()
                .with(ListenerScope::Global, JOB_LISTENERS, listeners)
                .expect("valid registry");
            Self {
                calls,
                pipeline: ListenerPipeline::new(Arc::new(registry), JOB_LISTENERS, "payroll", None),
                execution: JobExecution::new(ExecutionId(1), "payroll", JobParameters::new()),
            }
        }

        fn before(&mut self) -> Result<(), RuntimeError> {
            self.pipeline
                .run_before(&mut self.execution, |l, ctx| l.before_job(ctx))
        }

        fn after(&mut self) -> Result<(), RuntimeError> {
            self.pipeline
                .run_after(&mut self.execution, |l, ctx| l.after_job(ctx))
        }

        fn on_error(&mut self) -> Result<(), RuntimeError> {
            self.pipeline
                .run_on_error(&mut self.execution, |l, ctx| l.after_job(ctx))
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn stack(&self) -> Vec<String> {
            self.pipeline
                .executed()
                .iter()
                .map(|l| l.name().to_string())
                .collect()
        }
    }

    fn source_text(err: &RuntimeError) -> Option<String> {
        match err {
            RuntimeError::Listener(ListenerError::Failed { source, .. }) => {
                Some(source.to_string())
            }
            _ => None,
        }
    }

    #[test]
    fn test_before_runs_in_order_and_after_in_reverse() {
        let mut fx = Fixture::new(&[
            ("a", Behavior::Ok, Behavior::Ok),
            ("b", Behavior::Ok, Behavior::Ok),
            ("c", Behavior::Ok, Behavior::Ok),
        ]);
        fx.before().expect("before succeeds");
        assert_eq!(fx.pipeline.state(), PipelineState::BeforeDone);
        fx.after().expect("after succeeds");
        assert_eq!(fx.pipeline.state(), PipelineState::Done);
        assert_eq!(
            fx.calls(),
            vec![
                "a:before:true",
                "b:before:true",
                "c:before:true",
                "c:after:true",
                "b:after:true",
                "a:after:true",
            ]
        );
    }

    #[test]
    fn test_failing_before_stays_on_stack_and_is_torn_down() {
        let mut fx = Fixture::new(&[
            ("a", Behavior::Ok, Behavior::Ok),
            ("b", Behavior::Ok, Behavior::Ok),
            ("c", Behavior::Fail("X"), Behavior::Ok),
        ]);
        let err = fx.before().unwrap_err();
        assert_eq!(source_text(&err).as_deref(), Some("X"));
        assert_eq!(fx.stack(), vec!["a", "b", "c"]);
        assert_eq!(fx.pipeline.state(), PipelineState::Done);

        fx.after().expect("teardown succeeds");
        let teardown: Vec<String> = fx.calls().into_iter().skip(3).collect();
        assert_eq!(teardown, vec!["c:after:true", "b:after:true", "a:after:true"]);
    }

    #[test]
    fn test_before_failure_stops_the_round() {
        let mut fx = Fixture::new(&[
            ("a", Behavior::Fail("early"), Behavior::Ok),
            ("b", Behavior::Ok, Behavior::Ok),
        ]);
        assert!(fx.before().is_err());
        assert_eq!(fx.stack(), vec!["a"]);
        assert_eq!(fx.calls(), vec!["a:before:true"]);
    }

    #[test]
    fn test_before_panic_is_a_fault() {
        let mut fx = Fixture::new(&[("a", Behavior::Panic("kaput"), Behavior::Ok)]);
        let err = fx.before().unwrap_err();
        match err {
            RuntimeError::Listener(ref e) => {
                assert!(e.is_fault());
                assert_eq!(e.listener(), "a");
                assert_eq!(e.phase(), Phase::Before);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fx.stack(), vec!["a"]);
    }

    #[traced_test]
    #[test]
    fn test_teardown_runs_everyone_and_raises_first_failure() {
        let mut fx = Fixture::new(&[
            ("a", Behavior::Ok, Behavior::Fail("a-broke")),
            ("b", Behavior::Ok, Behavior::Ok),
            ("c", Behavior::Ok, Behavior::Fail("c-broke")),
        ]);
        fx.before().expect("before succeeds");
        let err = fx.after().unwrap_err();

        assert_eq!(source_text(&err).as_deref(), Some("c-broke"));
        let teardown: Vec<String> = fx.calls().into_iter().skip(3).collect();
        assert_eq!(
            teardown,
            vec!["c:after:true", "b:after:false", "a:after:false"]
        );
        assert!(logs_contain("listener teardown failed"));
        assert!(logs_contain("c-broke"));
        assert!(logs_contain("a-broke"));
        assert!(logs_contain("payroll"));
    }

    #[test]
    fn test_teardown_preserves_fault_kind_of_first_failure() {
        let mut fx = Fixture::new(&[
            ("a", Behavior::Ok, Behavior::Fail("later")),
            ("b", Behavior::Ok, Behavior::Panic("first")),
        ]);
        fx.before().expect("before succeeds");
        let err = fx.on_error().unwrap_err();
        match err {
            RuntimeError::Listener(ListenerError::Fault {
                listener, phase, message, ..
            }) => {
                assert_eq!(listener, "b");
                assert_eq!(phase, Phase::OnError);
                assert_eq!(message, "first");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fx.calls().len(), 4);
    }

    #[test]
    fn test_before_cannot_run_twice() {
        let mut fx = Fixture::new(&[("a", Behavior::Ok, Behavior::Ok)]);
        fx.before().expect("before succeeds");
        let err = fx.before().unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidState { ref job, .. } if job == "payroll"));
        assert_eq!(fx.stack(), vec!["a"]);
    }

    #[test]
    fn test_teardown_runs_once() {
        let mut fx = Fixture::new(&[("a", Behavior::Ok, Behavior::Ok)]);
        fx.before().expect("before succeeds");
        fx.after().expect("after succeeds");
        assert!(matches!(fx.on_error(), Err(RuntimeError::InvalidState { .. })));
        assert_eq!(fx.calls().len(), 2);
    }

    #[test]
    fn test_teardown_without_before_invokes_nothing() {
        let mut fx = Fixture::new(&[("a", Behavior::Ok, Behavior::Ok)]);
        fx.after().expect("empty teardown succeeds");
        assert!(fx.calls().is_empty());
        assert_eq!(fx.pipeline.state(), PipelineState::Done);
    }

    #[test]
    fn test_empty_list_is_not_an_error() {
        let registry: Arc<ListenerRegistry<dyn JobListener>> = Arc::new(ListenerRegistry::new());
        let mut pipeline = ListenerPipeline::new(registry, JOB_LISTENERS, "payroll", None);
        let mut exec = JobExecution::new(ExecutionId(1), "payroll", JobParameters::new());
        pipeline
            .run_before(&mut exec, |l, ctx| l.before_job(ctx))
            .expect("nothing to run");
        assert!(pipeline.executed().is_empty());
        pipeline
            .run_after(&mut exec, |l, ctx| l.after_job(ctx))
            .expect("nothing to tear down");
    }
}
