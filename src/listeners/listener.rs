//! # Listener capability sets.
//!
//! A listener implements exactly the set of callbacks for the boundary it watches:
//!
//! | Trait                 | Callbacks                                        | Executor                      |
//! |-----------------------|--------------------------------------------------|-------------------------------|
//! | [`JobListener`]       | `before_job`, `after_job`                        | `JobListenerExecutor`         |
//! | [`StepListener`]      | `before_step`, `after_step`                      | `StepListenerExecutor`        |
//! | [`ItemWriteListener`] | `before_write`, `after_write`, `on_write_error`  | `ItemWriteListenerExecutor`   |
//!
//! Every callback has a no-op default, so a listener overrides only what it needs.
//!
//! ## Rules
//! - Return `Err` to report a failure; a panic is caught and reported as a fault.
//! - If `before_*` was entered, the matching teardown callback is guaranteed to run,
//!   even when `before_*` itself failed.
//!
//! ## Example
//! ```rust
//! use batchvisor::{BoxError, JobListener, ListenerContext};
//!
//! struct ReleaseLock;
//!
//! impl JobListener for ReleaseLock {
//!     fn name(&self) -> &str { "release-lock" }
//!
//!     fn after_job(&self, ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
//!         if !ctx.process_succeeded() {
//!             // an earlier teardown listener failed; release anyway
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::BoxError;
use crate::listeners::context::ListenerContext;

/// Listener invoked at job start and job end.
pub trait JobListener: Send + Sync + 'static {
    /// Returns the listener name used in logs and errors.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn before_job(&self, _ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    fn after_job(&self, _ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Listener invoked at step start and step end.
pub trait StepListener: Send + Sync + 'static {
    /// Returns the listener name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn before_step(&self, _ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    fn after_step(&self, _ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Listener invoked around each item-write batch of a chunk.
pub trait ItemWriteListener<T>: Send + Sync + 'static {
    /// Returns the listener name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn before_write(&self, _items: &[T], _ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    fn after_write(&self, _items: &[T], _ctx: &mut ListenerContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called instead of `after_write` when the writer failed.
    fn on_write_error(
        &self,
        _items: &[T],
        _error: &(dyn std::error::Error + Send + Sync),
        _ctx: &mut ListenerContext<'_>,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Name lookup shared by every capability set, used by the pipeline for logs.
pub trait NamedListener {
    fn listener_name(&self) -> &str;
}

impl NamedListener for dyn JobListener {
    fn listener_name(&self) -> &str {
        self.name()
    }
}

impl NamedListener for dyn StepListener {
    fn listener_name(&self) -> &str {
        self.name()
    }
}

impl<T: 'static> NamedListener for dyn ItemWriteListener<T> {
    fn listener_name(&self) -> &str {
        self.name()
    }
}
