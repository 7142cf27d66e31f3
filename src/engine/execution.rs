//! # Job run handle and record.
//!
//! - [`ExecutionId`] opaque run handle returned by [`JobEngine::start`](crate::JobEngine::start).
//! - [`JobParameters`] ordered launch parameters.
//! - [`JobExecution`] the run record listeners read and mutate through
//!   [`ListenerContext`](crate::ListenerContext).

use std::collections::BTreeMap;
use std::fmt;

use crate::engine::status::BatchStatus;

/// Opaque handle of one job run, assigned by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionId(pub u64);

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Launch parameters of a job run, ordered by key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobParameters {
    values: BTreeMap<String, String>,
}

impl JobParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set with `key` bound to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Binds `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Returns the value bound to `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Iterates parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Record of one job run as seen by listeners.
///
/// The engine owns it and lends it mutably to the listener executors at each
/// lifecycle boundary; listeners may rewrite the batch and exit status.
#[derive(Clone, Debug)]
pub struct JobExecution {
    id: ExecutionId,
    job_name: String,
    parameters: JobParameters,
    batch_status: BatchStatus,
    exit_status: Option<String>,
}

impl JobExecution {
    /// Creates a record in the `Starting` state with no exit status.
    pub fn new(id: ExecutionId, job_name: impl Into<String>, parameters: JobParameters) -> Self {
        Self {
            id,
            job_name: job_name.into(),
            parameters,
            batch_status: BatchStatus::Starting,
            exit_status: None,
        }
    }

    pub fn id(&self) -> ExecutionId {
        self.id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn batch_status(&self) -> BatchStatus {
        self.batch_status
    }

    pub fn set_batch_status(&mut self, status: BatchStatus) {
        self.batch_status = status;
    }

    /// Returns the exit-status string, if one was set.
    pub fn exit_status(&self) -> Option<&str> {
        self.exit_status.as_deref()
    }

    pub fn set_exit_status(&mut self, exit_status: impl Into<String>) {
        self.exit_status = Some(exit_status.into());
    }
}
