//! Error types used by the batchvisor runtime, its listeners and the job engine seam.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`]: errors raised by the orchestration core itself.
//! - [`ListenerError`]: failures raised by listener callbacks during a pipeline round.
//! - [`EngineError`]: failures reported by the external job engine.
//!
//! All of them provide `as_label` for logs; [`ListenerError::is_fault`] tells a
//! returned error apart from a panic caught at the pipeline boundary.

use std::fmt;

use thiserror::Error;

use crate::engine::ExecutionId;

/// Boxed error returned by listener callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the batchvisor runtime.
///
/// Usage errors (`InvalidArgument`, `InvalidState`) are raised synchronously,
/// before any listener or job work begins.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// An argument or configuration value was rejected.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument or configuration key.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// An operation was attempted in a state that does not allow it.
    #[error("invalid state for job `{job}`: {reason}")]
    InvalidState {
        /// Job the operation was attempted for.
        job: String,
        /// What was wrong.
        reason: String,
    },

    /// A listener failed during a pipeline round.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The external job engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use batchvisor::RuntimeError;
    ///
    /// let err = RuntimeError::InvalidArgument { name: "poll_interval_ms", reason: "must be >= 1".into() };
    /// assert_eq!(err.as_label(), "runtime_invalid_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidArgument { .. } => "runtime_invalid_argument",
            RuntimeError::InvalidState { .. } => "runtime_invalid_state",
            RuntimeError::Listener(e) => e.as_label(),
            RuntimeError::Engine(e) => e.as_label(),
        }
    }

    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        RuntimeError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(job: impl Into<String>, reason: impl Into<String>) -> Self {
        RuntimeError::InvalidState {
            job: job.into(),
            reason: reason.into(),
        }
    }
}

/// Lifecycle boundary at which a listener callback ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// A "before" round (`before_job`, `before_step`, `before_write`).
    Before,
    /// An "after" teardown round.
    After,
    /// An "on-error" teardown round.
    OnError,
}

impl Phase {
    /// Returns the phase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
            Phase::OnError => "on_error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Failure raised by a listener callback.
///
/// Both kinds share one domain so the pipeline can aggregate them uniformly:
/// - `Failed`: the callback returned an error; the original error is kept as the source.
/// - `Fault`: the callback panicked; the panic payload is kept as a message.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The listener returned an error.
    #[error("listener `{listener}` failed in {phase} phase: {source}")]
    Failed {
        /// Listener name.
        listener: String,
        /// Phase the callback ran in.
        phase: Phase,
        /// The error returned by the listener.
        #[source]
        source: BoxError,
    },

    /// The listener panicked.
    #[error("listener `{listener}` faulted in {phase} phase: {message}")]
    Fault {
        /// Listener name.
        listener: String,
        /// Phase the callback ran in.
        phase: Phase,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl ListenerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Failed { .. } => "listener_failed",
            ListenerError::Fault { .. } => "listener_fault",
        }
    }

    /// Returns `true` if the listener panicked rather than returning an error.
    ///
    /// # Example
    /// ```
    /// use batchvisor::{ListenerError, Phase};
    ///
    /// let err = ListenerError::Fault { listener: "audit".into(), phase: Phase::After, message: "boom".into() };
    /// assert!(err.is_fault());
    /// ```
    pub fn is_fault(&self) -> bool {
        matches!(self, ListenerError::Fault { .. })
    }

    /// Returns the name of the listener that raised the failure.
    pub fn listener(&self) -> &str {
        match self {
            ListenerError::Failed { listener, .. } | ListenerError::Fault { listener, .. } => {
                listener
            }
        }
    }

    /// Returns the phase the failure was raised in.
    pub fn phase(&self) -> Phase {
        match self {
            ListenerError::Failed { phase, .. } | ListenerError::Fault { phase, .. } => *phase,
        }
    }
}

/// # Errors reported by the external job engine.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine refused or failed to launch the job.
    #[error("job `{job}` could not be started: {reason}")]
    StartFailed {
        /// Job name.
        job: String,
        /// Engine-provided reason.
        reason: String,
    },

    /// The engine does not know the execution.
    #[error("unknown execution {0}")]
    UnknownExecution(ExecutionId),

    /// The engine could not be reached.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::StartFailed { .. } => "engine_start_failed",
            EngineError::UnknownExecution(_) => "engine_unknown_execution",
            EngineError::Unavailable(_) => "engine_unavailable",
        }
    }
}
