//! # Teardown failure aggregate.
//!
//! Collects listener failures of one teardown round in occurrence order.
//! Only the first one is handed back to the caller; the rest were already logged
//! by the pipeline and are dropped with the aggregate.

use std::any::Any;

use crate::error::ListenerError;

/// Ordered failures of one teardown round.
#[derive(Debug, Default)]
pub(crate) struct FailureAggregate {
    failures: Vec<ListenerError>,
}

impl FailureAggregate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, failure: ListenerError) {
        self.failures.push(failure);
    }

    pub(crate) fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns the first recorded failure, discarding the others.
    pub(crate) fn into_first(self) -> Option<ListenerError> {
        self.failures.into_iter().next()
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
