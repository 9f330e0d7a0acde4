//! # Batch Operation Engine
//!
//! A chained, single-threaded execution pipeline: an ordered list of
//! operations with lifecycle hooks (before/execution/after/success/error/
//! complete), shared mutable state visible to every step, mid-stream value
//! forwarding, skip directives, cooperative cancellation and a
//! when-all-finished rendezvous.

pub mod context;
pub mod engine;
pub mod logger;
pub mod operation;
pub mod phases;

pub use context::{OperationContext, SkipDirective};
pub use engine::Batch;
pub use logger::{LogRecord, LoggerCallback};
pub use operation::{Hook, Operation};
pub use phases::{ExecutionPhase, InvokeStrategy};

use crate::error::Result;

/// Start a batch pipeline from its first step's action
pub fn new_batch(action: impl Fn(&mut OperationContext) -> Result<()> + 'static) -> Batch {
    Batch::new(action)
}
