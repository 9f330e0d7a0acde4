//! The batch pipeline: fluent construction and the `start()` state machine.

use crate::batch::context::{OperationContext, SkipDirective};
use crate::batch::logger::{fan_out, LogRecord, LoggerCallback};
use crate::batch::operation::{Hook, Operation};
use crate::batch::phases::{ExecutionPhase, InvokeStrategy};
use crate::config::EngineConfig;
use crate::error::{Result, StepseqError};
use crate::value::{Observable, ObservableArray, Value};
use std::rc::Rc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Outcome of running one operation's lifecycle
enum StepOutcome {
    Completed,
    Cancelled,
}

/// An ordered pipeline of operations sharing mutable state, executed
/// synchronously to completion, cancellation or error.
///
/// Construction is fluent: configuration calls apply to the most recently
/// appended operation (`id`, `on_success`, ...) or to the batch as a whole
/// (`before`, `when_all_finished`, ...). `start()` runs the pipeline once
/// and returns the final result accumulator.
pub struct Batch {
    id: String,
    name: Option<String>,
    operations: Vec<Operation>,
    object: Observable,
    items: ObservableArray,
    before: Option<Hook>,
    after: Option<Hook>,
    when_all_finished: Option<Hook>,
    when_cancelled: Option<Hook>,
    loggers: Vec<LoggerCallback>,
    invoke_strategy: InvokeStrategy,
    trace_phases: bool,
    max_operations: usize,
}

impl Batch {
    /// New batch with one initial operation, using default configuration
    pub fn new(action: impl Fn(&mut OperationContext) -> Result<()> + 'static) -> Self {
        Self::with_config(action, &EngineConfig::default())
    }

    /// New batch with one initial operation and explicit engine defaults
    pub fn with_config(
        action: impl Fn(&mut OperationContext) -> Result<()> + 'static,
        config: &EngineConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: None,
            operations: vec![Operation::with_action(Rc::new(action))],
            object: Observable::new(),
            items: ObservableArray::new(),
            before: None,
            after: None,
            when_all_finished: None,
            when_cancelled: None,
            loggers: Vec::new(),
            invoke_strategy: config.invoke_strategy,
            trace_phases: config.trace_phases,
            max_operations: config.max_operations,
        }
    }

    // ---- batch identity and shared state ----

    pub fn batch_id(&self) -> &str {
        &self.id
    }

    /// Name the batch (also replaces the generated id)
    pub fn batch_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self.id = name.to_string();
        self
    }

    /// The batch-wide shared key/value bag
    pub fn object(&self) -> Observable {
        self.object.clone()
    }

    /// The batch-wide shared items list
    pub fn items(&self) -> ObservableArray {
        self.items.clone()
    }

    // ---- appending operations ----

    /// Append an operation with the given action
    pub fn next(mut self, action: impl Fn(&mut OperationContext) -> Result<()> + 'static) -> Self {
        self.operations.push(Operation::with_action(Rc::new(action)));
        self
    }

    /// Alias for `next`
    pub fn then(self, action: impl Fn(&mut OperationContext) -> Result<()> + 'static) -> Self {
        self.next(action)
    }

    // ---- per-operation configuration (applies to the latest operation) ----

    /// Assign an id to the latest operation; ids must be unique within
    /// the batch
    pub fn id(mut self, id: &str) -> Result<Self> {
        let taken = self
            .operations
            .iter()
            .rev()
            .skip(1)
            .any(|op| op.id.as_deref() == Some(id));
        if taken {
            return Err(StepseqError::DuplicateOperationId { id: id.to_string() });
        }
        if let Some(op) = self.operations.last_mut() {
            op.id = Some(id.to_string());
        }
        Ok(self)
    }

    /// Name the latest operation
    pub fn name(mut self, name: &str) -> Self {
        if let Some(op) = self.operations.last_mut() {
            op.name = Some(name.to_string());
        }
        self
    }

    /// Success hook for the latest operation
    pub fn on_success(
        mut self,
        hook: impl Fn(&mut OperationContext) -> Result<()> + 'static,
    ) -> Self {
        if let Some(op) = self.operations.last_mut() {
            op.success = Some(Rc::new(hook));
        }
        self
    }

    /// Error hook for the latest operation; handles failures from the
    /// before/execution/after phases
    pub fn on_error(
        mut self,
        hook: impl Fn(&mut OperationContext) -> Result<()> + 'static,
    ) -> Self {
        if let Some(op) = self.operations.last_mut() {
            op.error = Some(Rc::new(hook));
        }
        self
    }

    /// Complete hook for the latest operation
    pub fn on_complete(
        mut self,
        hook: impl Fn(&mut OperationContext) -> Result<()> + 'static,
    ) -> Self {
        if let Some(op) = self.operations.last_mut() {
            op.complete = Some(Rc::new(hook));
        }
        self
    }

    /// Swallow unhandled errors in the latest operation instead of
    /// aborting the batch
    pub fn ignore_errors(mut self, flag: bool) -> Self {
        if let Some(op) = self.operations.last_mut() {
            op.ignore_errors = flag;
        }
        self
    }

    /// Finish-check strategy override for the latest operation
    pub fn operation_invoke_strategy(mut self, strategy: InvokeStrategy) -> Self {
        if let Some(op) = self.operations.last_mut() {
            op.invoke_strategy = Some(strategy);
        }
        self
    }

    // ---- batch-level configuration ----

    /// Batch-wide hook run before every operation's action
    pub fn before(mut self, hook: impl Fn(&mut OperationContext) -> Result<()> + 'static) -> Self {
        self.before = Some(Rc::new(hook));
        self
    }

    /// Batch-wide hook run after every operation's action
    pub fn after(mut self, hook: impl Fn(&mut OperationContext) -> Result<()> + 'static) -> Self {
        self.after = Some(Rc::new(hook));
        self
    }

    /// Hook run exactly once when every operation has completed
    pub fn when_all_finished(
        mut self,
        hook: impl Fn(&mut OperationContext) -> Result<()> + 'static,
    ) -> Self {
        self.when_all_finished = Some(Rc::new(hook));
        self
    }

    /// Hook run once when the pipeline is cancelled
    pub fn when_cancelled(
        mut self,
        hook: impl Fn(&mut OperationContext) -> Result<()> + 'static,
    ) -> Self {
        self.when_cancelled = Some(Rc::new(hook));
        self
    }

    /// Register a logger; loggers are invoked defensively and independently
    pub fn add_logger(mut self, logger: impl Fn(&LogRecord) + 'static) -> Self {
        self.loggers.push(Rc::new(logger));
        self
    }

    /// Default finish-check strategy for every operation
    pub fn invoke_strategy(mut self, strategy: InvokeStrategy) -> Self {
        self.invoke_strategy = strategy;
        self
    }

    /// Send a message to every registered logger
    pub fn log(&self, message: impl Into<String>) {
        fan_out(&self.loggers, &LogRecord::new(&self.id, None, message.into()));
    }

    // ---- execution ----

    /// Run the pipeline to completion, cancellation or error; returns the
    /// final result accumulator
    pub fn start(&mut self) -> Result<Value> {
        let total = self.operations.len();
        if self.max_operations > 0 && total > self.max_operations {
            return Err(StepseqError::Configuration {
                message: format!(
                    "batch has {total} operations, limit is {}",
                    self.max_operations
                ),
            });
        }
        debug!(batch_id = %self.id, operations = total, "starting batch");
        crate::logging::log_batch_operation("start", &self.id, None, "running", None);

        let operations = self.operations.clone();
        let mut finished = vec![false; total];
        let mut finished_fired = false;
        let mut forwarded = Value::Undefined;
        let mut result = Value::Undefined;
        let mut value = Value::Undefined;
        let mut skip: Option<SkipDirective> = None;

        for (index, op) in operations.iter().enumerate() {
            let mut ctx = self.make_context(index, total, op, &forwarded, &result, &value);

            if self.should_skip(&mut skip, &ctx) {
                trace!(batch_id = %self.id, operation_index = index, "operation skipped");
                // completion bookkeeping stays consistent for skipped steps
                self.note_finished(
                    &mut finished,
                    &mut finished_fired,
                    index,
                    total,
                    &forwarded,
                    &result,
                    &value,
                )?;
                continue;
            }

            let outcome = self.run_operation(index, op, &mut ctx)?;
            self.flush_logs(&mut ctx);
            if let Some(directive) = ctx.take_skip_directive() {
                skip = Some(directive);
            }

            if let StepOutcome::Cancelled = outcome {
                self.enter_phase(&mut ctx, ExecutionPhase::Cancelled);
                if let Some(hook) = &self.when_cancelled {
                    hook(&mut ctx).map_err(|e| {
                        self.step_error(index, ExecutionPhase::Cancelled, e)
                    })?;
                    self.flush_logs(&mut ctx);
                }
                debug!(batch_id = %self.id, operation_index = index, "batch cancelled");
                crate::logging::log_batch_operation(
                    "start",
                    &self.id,
                    Some(index),
                    "cancelled",
                    None,
                );
                return Ok(ctx.result.clone());
            }

            forwarded = ctx.next_value.clone();
            result = ctx.result.clone();
            value = ctx.value.clone();

            let strategy = op.invoke_strategy.unwrap_or(self.invoke_strategy);
            if strategy == InvokeStrategy::Automatic || ctx.finish_check_requested() {
                self.note_finished(
                    &mut finished,
                    &mut finished_fired,
                    index,
                    total,
                    &forwarded,
                    &result,
                    &value,
                )?;
            }
        }

        debug!(batch_id = %self.id, "batch finished");
        crate::logging::log_batch_operation("start", &self.id, None, "finished", None);
        Ok(result)
    }

    fn make_context(
        &self,
        index: usize,
        total: usize,
        op: &Operation,
        forwarded: &Value,
        result: &Value,
        value: &Value,
    ) -> OperationContext {
        let mut ctx = OperationContext::new(
            self.id.clone(),
            index,
            total,
            self.object.clone(),
            self.items.clone(),
        );
        ctx.operation_id = op.id.clone();
        ctx.operation_name = op.name.clone();
        ctx.prev_value = forwarded.clone();
        ctx.result = result.clone();
        ctx.value = value.clone();
        ctx
    }

    /// Evaluate and update the pending skip directive against the upcoming
    /// step's context
    fn should_skip(&self, skip: &mut Option<SkipDirective>, ctx: &OperationContext) -> bool {
        match skip.take() {
            None => false,
            Some(SkipDirective::Count(n)) => {
                if n > 1 {
                    *skip = Some(SkipDirective::Count(n - 1));
                }
                n > 0
            }
            Some(SkipDirective::All) => {
                *skip = Some(SkipDirective::All);
                true
            }
            Some(SkipDirective::While(predicate)) => {
                let matched = predicate(ctx);
                if matched {
                    *skip = Some(SkipDirective::While(predicate));
                }
                matched
            }
        }
    }

    /// Run one operation through its lifecycle phases
    fn run_operation(
        &self,
        index: usize,
        op: &Operation,
        ctx: &mut OperationContext,
    ) -> Result<StepOutcome> {
        let mut captured: Option<StepseqError> = None;

        self.enter_phase(ctx, ExecutionPhase::Before);
        if ctx.invoke_before {
            if let Some(hook) = &self.before {
                if let Err(e) = hook(ctx) {
                    captured = Some(e);
                }
            }
        }
        self.flush_logs(ctx);
        if captured.is_none() && ctx.is_cancelled() {
            return Ok(StepOutcome::Cancelled);
        }

        if captured.is_none() {
            self.enter_phase(ctx, ExecutionPhase::Execution);
            if ctx.invoke_action {
                if let Some(action) = &op.action {
                    if let Err(e) = action(ctx) {
                        captured = Some(e);
                    }
                }
            }
            self.flush_logs(ctx);
            if captured.is_none() && ctx.is_cancelled() {
                return Ok(StepOutcome::Cancelled);
            }
        }

        if captured.is_none() {
            self.enter_phase(ctx, ExecutionPhase::After);
            if ctx.invoke_after {
                if let Some(hook) = &self.after {
                    if let Err(e) = hook(ctx) {
                        captured = Some(e);
                    }
                }
            }
            self.flush_logs(ctx);
            if captured.is_none() && ctx.is_cancelled() {
                return Ok(StepOutcome::Cancelled);
            }
        }

        if let Some(err) = captured {
            // Error side channel for the before/execution/after phases
            let failed_phase = ctx.phase;
            ctx.error = Some(err.clone());
            if op.error.is_some() && ctx.invoke_error {
                self.enter_phase(ctx, ExecutionPhase::Error);
                if let Some(hook) = &op.error {
                    hook(ctx).map_err(|e| self.step_error(index, ExecutionPhase::Error, e))?;
                }
                self.flush_logs(ctx);
            } else if !op.ignore_errors {
                return Err(self.step_error(index, failed_phase, err));
            }
            // handled or swallowed; fall through to complete
            if ctx.is_cancelled() {
                return Ok(StepOutcome::Cancelled);
            }
        } else {
            // Past this point errors are no longer routed to the error
            // hook: a failing success hook propagates unless swallowed.
            self.enter_phase(ctx, ExecutionPhase::Success);
            if ctx.invoke_success {
                if let Some(hook) = &op.success {
                    if let Err(e) = hook(ctx) {
                        if !op.ignore_errors {
                            return Err(self.step_error(index, ExecutionPhase::Success, e));
                        }
                    }
                }
            }
            self.flush_logs(ctx);
            if ctx.is_cancelled() {
                return Ok(StepOutcome::Cancelled);
            }
        }

        self.enter_phase(ctx, ExecutionPhase::Complete);
        if ctx.invoke_complete {
            if let Some(hook) = &op.complete {
                hook(ctx).map_err(|e| self.step_error(index, ExecutionPhase::Complete, e))?;
            }
        }
        self.flush_logs(ctx);
        if ctx.is_cancelled() {
            return Ok(StepOutcome::Cancelled);
        }

        Ok(StepOutcome::Completed)
    }

    /// Mark one step finished; fires `when_all_finished` exactly once when
    /// the whole batch is accounted for
    #[allow(clippy::too_many_arguments)]
    fn note_finished(
        &self,
        finished: &mut [bool],
        fired: &mut bool,
        index: usize,
        total: usize,
        forwarded: &Value,
        result: &Value,
        value: &Value,
    ) -> Result<()> {
        finished[index] = true;
        if *fired || !finished.iter().all(|f| *f) {
            return Ok(());
        }
        *fired = true;
        debug!(batch_id = %self.id, "all operations finished");
        if let Some(hook) = &self.when_all_finished {
            let mut ctx = OperationContext::new(
                self.id.clone(),
                index,
                total,
                self.object.clone(),
                self.items.clone(),
            );
            ctx.prev_value = forwarded.clone();
            ctx.result = result.clone();
            ctx.value = value.clone();
            self.enter_phase(&mut ctx, ExecutionPhase::Finished);
            hook(&mut ctx).map_err(|e| self.step_error(index, ExecutionPhase::Finished, e))?;
            self.flush_logs(&mut ctx);
        }
        Ok(())
    }

    fn enter_phase(&self, ctx: &mut OperationContext, phase: ExecutionPhase) {
        ctx.phase = phase;
        if self.trace_phases {
            trace!(
                batch_id = %self.id,
                operation_index = ctx.operation_index,
                phase = %phase,
                "phase transition"
            );
        }
    }

    fn flush_logs(&self, ctx: &mut OperationContext) {
        if self.loggers.is_empty() {
            ctx.drain_logs();
            return;
        }
        for message in ctx.drain_logs() {
            fan_out(
                &self.loggers,
                &LogRecord::new(&self.id, Some(ctx.operation_index), message),
            );
        }
    }

    fn step_error(&self, index: usize, phase: ExecutionPhase, err: StepseqError) -> StepseqError {
        StepseqError::StepFailed {
            operation_index: index,
            phase: phase.to_string(),
            message: err.message(),
        }
    }
}
