//! Per-step execution context.
//!
//! One explicit mutable record threads through a step's lifecycle phases.
//! Field lifecycles: `prev_value` is fixed at step start from the previous
//! step's `next_value`; `next_value` is write-only for the next step;
//! `result`/`value` carry across the whole batch unless reassigned; the
//! invoke gates and skip directives are consumed by the engine.

use crate::batch::phases::ExecutionPhase;
use crate::error::StepseqError;
use crate::value::{Observable, ObservableArray, Value};
use std::fmt;
use std::rc::Rc;

/// Suppression rule for upcoming steps, set by an earlier step's context
#[derive(Clone)]
pub enum SkipDirective {
    /// Skip the next `n` steps (decremented as steps are skipped)
    Count(usize),
    /// Skip every remaining step
    All,
    /// Skip steps while the predicate matches their upcoming context
    While(Rc<dyn Fn(&OperationContext) -> bool>),
}

impl fmt::Debug for SkipDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipDirective::Count(n) => write!(f, "SkipDirective::Count({n})"),
            SkipDirective::All => write!(f, "SkipDirective::All"),
            SkipDirective::While(_) => write!(f, "SkipDirective::While(..)"),
        }
    }
}

/// The mutable record handed to every lifecycle hook of one step
#[derive(Debug)]
pub struct OperationContext {
    /// Id of the owning batch
    pub batch_id: String,
    /// Position of this operation within the batch
    pub operation_index: usize,
    /// Total operations in the batch
    pub operation_count: usize,
    /// Operation id, when assigned
    pub operation_id: Option<String>,
    /// Operation name, when assigned
    pub operation_name: Option<String>,

    /// Value forwarded from the previous step's `next_value`
    pub prev_value: Value,
    /// Value to forward to the next step
    pub next_value: Value,
    /// Running result accumulator, returned by `start()` at the end
    pub result: Value,
    /// Working value carried alongside the result
    pub value: Value,

    /// Phase gates: a hook may clear a later gate to suppress that phase
    pub invoke_before: bool,
    pub invoke_action: bool,
    pub invoke_after: bool,
    pub invoke_success: bool,
    pub invoke_error: bool,
    pub invoke_complete: bool,

    /// Current lifecycle phase
    pub phase: ExecutionPhase,
    /// The captured error, set while the error hook runs
    pub error: Option<StepseqError>,

    /// Batch-wide shared key/value bag
    pub object: Observable,
    /// Batch-wide shared items list
    pub items: ObservableArray,

    cancelled: bool,
    skip_directive: Option<SkipDirective>,
    finish_check_requested: bool,
    pending_logs: Vec<String>,
}

impl OperationContext {
    pub(crate) fn new(
        batch_id: String,
        operation_index: usize,
        operation_count: usize,
        object: Observable,
        items: ObservableArray,
    ) -> Self {
        Self {
            batch_id,
            operation_index,
            operation_count,
            operation_id: None,
            operation_name: None,
            prev_value: Value::Undefined,
            next_value: Value::Undefined,
            result: Value::Undefined,
            value: Value::Undefined,
            invoke_before: true,
            invoke_action: true,
            invoke_after: true,
            invoke_success: true,
            invoke_error: true,
            invoke_complete: true,
            phase: ExecutionPhase::Before,
            error: None,
            object,
            items,
            cancelled: false,
            skip_directive: None,
            finish_check_requested: false,
            pending_logs: Vec::new(),
        }
    }

    // ---- position predicates ----

    pub fn is_first(&self) -> bool {
        self.operation_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.operation_index + 1 == self.operation_count
    }

    pub fn is_between(&self) -> bool {
        !self.is_first() && !self.is_last()
    }

    // ---- cancellation ----

    /// Request (or withdraw) cancellation of the whole batch; checked by
    /// the engine after every phase
    pub fn cancel(&mut self, flag: bool) {
        self.cancelled = flag;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    // ---- value threading ----

    /// Set both `result` and `value` in one call
    pub fn set_result_and_value(&mut self, v: Value) {
        self.result = v.clone();
        self.value = v;
    }

    // ---- skip directives ----

    /// Suppress the lifecycle hooks of the next `n` steps
    pub fn skip(&mut self, n: usize) {
        self.skip_directive = Some(SkipDirective::Count(n));
    }

    /// Suppress (or stop suppressing) every remaining step
    pub fn skip_all(&mut self, flag: bool) {
        self.skip_directive = if flag { Some(SkipDirective::All) } else { None };
    }

    /// Suppress (or not) just the following step
    pub fn skip_next(&mut self, flag: bool) {
        self.skip_directive = if flag {
            Some(SkipDirective::Count(1))
        } else {
            None
        };
    }

    /// Suppress upcoming steps while the predicate matches their context
    pub fn skip_while(&mut self, predicate: impl Fn(&OperationContext) -> bool + 'static) {
        self.skip_directive = Some(SkipDirective::While(Rc::new(predicate)));
    }

    pub(crate) fn take_skip_directive(&mut self) -> Option<SkipDirective> {
        self.skip_directive.take()
    }

    // ---- finish check ----

    /// Request the finish check for this step; required under
    /// `InvokeStrategy::Manual`
    pub fn invoke_next(&mut self) {
        self.finish_check_requested = true;
    }

    pub(crate) fn finish_check_requested(&self) -> bool {
        self.finish_check_requested
    }

    // ---- logging ----

    /// Queue a message for the batch's registered loggers
    pub fn log(&mut self, message: impl Into<String>) {
        self.pending_logs.push(message.into());
    }

    pub(crate) fn drain_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(index: usize, count: usize) -> OperationContext {
        OperationContext::new(
            "batch-1".to_string(),
            index,
            count,
            Observable::new(),
            ObservableArray::new(),
        )
    }

    #[test]
    fn test_position_predicates() {
        assert!(ctx(0, 3).is_first());
        assert!(ctx(2, 3).is_last());
        assert!(ctx(1, 3).is_between());
        let only = ctx(0, 1);
        assert!(only.is_first() && only.is_last() && !only.is_between());
    }

    #[test]
    fn test_set_result_and_value() {
        let mut c = ctx(0, 1);
        c.set_result_and_value(Value::Int(7));
        assert_eq!(c.result, Value::Int(7));
        assert_eq!(c.value, Value::Int(7));
    }

    #[test]
    fn test_skip_directive_take() {
        let mut c = ctx(0, 2);
        c.skip(2);
        assert!(matches!(
            c.take_skip_directive(),
            Some(SkipDirective::Count(2))
        ));
        assert!(c.take_skip_directive().is_none());
    }

    #[test]
    fn test_skip_next_toggle() {
        let mut c = ctx(0, 2);
        c.skip_next(true);
        assert!(matches!(
            c.take_skip_directive(),
            Some(SkipDirective::Count(1))
        ));
        c.skip_next(true);
        c.skip_next(false);
        assert!(c.take_skip_directive().is_none());
    }

    #[test]
    fn test_cancel_flag() {
        let mut c = ctx(0, 1);
        assert!(!c.is_cancelled());
        c.cancel(true);
        assert!(c.is_cancelled());
        c.cancel(false);
        assert!(!c.is_cancelled());
    }

    #[test]
    fn test_log_queue_drains() {
        let mut c = ctx(0, 1);
        c.log("one");
        c.log("two");
        assert_eq!(c.drain_logs(), vec!["one".to_string(), "two".to_string()]);
        assert!(c.drain_logs().is_empty());
    }
}
