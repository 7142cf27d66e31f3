//! # Listener registry with cascading overrides.
//!
//! [`ListenerRegistry`] stores ordered listener lists under string keys and resolves
//! the most specific list for a job/step boundary.
//!
//! ## Resolution
//! ```text
//! resolve(list, job, Some(step))
//!   ├─► "<job>.<step>.<list>"   step override
//!   ├─► "<job>.<list>"          job override
//!   ├─► "<list>"                global default
//!   └─► []                      nothing registered (not an error)
//! ```
//! The first registered key wins; lists from different tiers are never merged.
//!
//! ## Rules
//! - Names must be non-empty and must not contain `.` so keys stay unambiguous.
//! - Registering the same scope/list again replaces the previous list.
//! - Resolution is read-only: the same key yields the same ordered list until reconfigured.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RuntimeError;

/// Default list name for job listeners.
pub const JOB_LISTENERS: &str = "jobListeners";
/// Default list name for step listeners.
pub const STEP_LISTENERS: &str = "stepListeners";
/// Default list name for item-write listeners.
pub const ITEM_WRITE_LISTENERS: &str = "itemWriteListeners";

/// Tier a listener list is registered at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerScope {
    /// Applies to every job and step without a more specific override.
    Global,
    /// Applies to one job (and its steps without a step override).
    Job(String),
    /// Applies to one step of one job.
    Step {
        /// Job name.
        job: String,
        /// Step name.
        step: String,
    },
}

impl ListenerScope {
    pub fn job(job: impl Into<String>) -> Self {
        ListenerScope::Job(job.into())
    }

    pub fn step(job: impl Into<String>, step: impl Into<String>) -> Self {
        ListenerScope::Step {
            job: job.into(),
            step: step.into(),
        }
    }

    /// Builds the registry key for `list_name` at this tier.
    pub fn key(&self, list_name: &str) -> String {
        match self {
            ListenerScope::Global => list_name.to_string(),
            ListenerScope::Job(job) => format!("{job}.{list_name}"),
            ListenerScope::Step { job, step } => format!("{job}.{step}.{list_name}"),
        }
    }

    fn validate(&self, list_name: &str) -> Result<(), RuntimeError> {
        validate_name("list_name", list_name)?;
        match self {
            ListenerScope::Global => Ok(()),
            ListenerScope::Job(job) => validate_name("job", job),
            ListenerScope::Step { job, step } => {
                validate_name("job", job)?;
                validate_name("step", step)
            }
        }
    }
}

fn validate_name(name: &'static str, value: &str) -> Result<(), RuntimeError> {
    if value.is_empty() {
        return Err(RuntimeError::invalid_argument(name, "must not be empty"));
    }
    if value.contains('.') {
        return Err(RuntimeError::invalid_argument(
            name,
            format!("`{value}` must not contain '.'"),
        ));
    }
    Ok(())
}

/// Ordered listener lists keyed by scope and list name.
///
/// `L` is the capability set, e.g. `dyn JobListener`.
pub struct ListenerRegistry<L: ?Sized> {
    lists: HashMap<String, Vec<Arc<L>>>,
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            lists: HashMap::new(),
        }
    }
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listeners` under `scope` and `list_name`, replacing any previous list.
    ///
    /// ### Errors
    /// `InvalidArgument` if a name is empty or contains `.`.
    pub fn register(
        &mut self,
        scope: ListenerScope,
        list_name: &str,
        listeners: Vec<Arc<L>>,
    ) -> Result<(), RuntimeError> {
        scope.validate(list_name)?;
        self.lists.insert(scope.key(list_name), listeners);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(
        mut self,
        scope: ListenerScope,
        list_name: &str,
        listeners: Vec<Arc<L>>,
    ) -> Result<Self, RuntimeError> {
        self.register(scope, list_name, listeners)?;
        Ok(self)
    }

    /// Returns the most specific list registered for the boundary, or an empty slice.
    pub fn resolve(&self, list_name: &str, job_name: &str, step_name: Option<&str>) -> &[Arc<L>] {
        let step_key = step_name.map(|step| format!("{job_name}.{step}.{list_name}"));
        let job_key = format!("{job_name}.{list_name}");

        step_key
            .as_deref()
            .into_iter()
            .chain([job_key.as_str(), list_name])
            .find_map(|key| self.lists.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns `true` if a list is registered exactly at `scope`.
    pub fn contains(&self, scope: &ListenerScope, list_name: &str) -> bool {
        self.lists.contains_key(&scope.key(list_name))
    }

    /// Number of registered lists across all tiers.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}
