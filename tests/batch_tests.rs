//! Integration tests for the batch pipeline's lifecycle state machine.

use std::cell::RefCell;
use std::rc::Rc;

use stepseq::batch::{new_batch, Batch, ExecutionPhase, InvokeStrategy};
use stepseq::value::Value;
use stepseq::StepseqError;

#[test]
fn three_steps_append_in_order() {
    let mut batch = new_batch(|ctx| {
        ctx.items.push(Value::Int(0));
        Ok(())
    })
    .next(|ctx| {
        ctx.items.push(Value::Int(1));
        Ok(())
    })
    .then(|ctx| {
        ctx.items.push(Value::Int(2));
        Ok(())
    });
    batch.start().unwrap();
    assert_eq!(
        batch.items().items(),
        vec![Value::Int(0), Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn cancellation_suppresses_own_success_and_later_operations() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let action0 = events.clone();
    let success0 = events.clone();
    let complete0 = events.clone();
    let action1 = events.clone();
    let cancelled = events.clone();

    let mut batch = new_batch(move |ctx| {
        action0.borrow_mut().push("action0".to_string());
        ctx.cancel(true);
        Ok(())
    })
    .on_success(move |_ctx| {
        success0.borrow_mut().push("success0".to_string());
        Ok(())
    })
    .on_complete(move |_ctx| {
        complete0.borrow_mut().push("complete0".to_string());
        Ok(())
    })
    .next(move |_ctx| {
        action1.borrow_mut().push("action1".to_string());
        Ok(())
    })
    .when_cancelled(move |ctx| {
        assert_eq!(ctx.phase, ExecutionPhase::Cancelled);
        cancelled.borrow_mut().push("cancelled".to_string());
        Ok(())
    });

    batch.start().unwrap();
    assert_eq!(*events.borrow(), vec!["action0", "cancelled"]);
}

#[test]
fn ignore_errors_continues_and_still_completes() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let complete0 = events.clone();
    let action1 = events.clone();

    let mut batch = new_batch(|_ctx| Err(StepseqError::step_failure("exploded")))
        .ignore_errors(true)
        .on_complete(move |_ctx| {
            complete0.borrow_mut().push("complete0");
            Ok(())
        })
        .next(move |_ctx| {
            action1.borrow_mut().push("action1");
            Ok(())
        });
    batch.start().unwrap();
    assert_eq!(*events.borrow(), vec!["complete0", "action1"]);
}

#[test]
fn unhandled_step_error_aborts_start() {
    let finished = Rc::new(RefCell::new(false));
    let flag = finished.clone();
    let mut batch = new_batch(|_ctx| Ok(()))
        .next(|_ctx| Err(StepseqError::step_failure("fatal")))
        .when_all_finished(move |_ctx| {
            *flag.borrow_mut() = true;
            Ok(())
        });
    let err = batch.start().unwrap_err();
    assert!(
        matches!(err, StepseqError::StepFailed { operation_index: 1, ref phase, .. } if phase == "execution")
    );
    assert!(!*finished.borrow());
}

#[test]
fn duplicate_operation_id_rejected_before_start() {
    let result = new_batch(|_ctx| Ok(()))
        .id("step")
        .unwrap()
        .next(|_ctx| Ok(()))
        .id("step");
    assert!(matches!(
        result,
        Err(StepseqError::DuplicateOperationId { ref id }) if id == "step"
    ));
}

#[test]
fn skip_two_runs_finish_tracking_for_skipped_steps() {
    let ran = Rc::new(RefCell::new(Vec::new()));
    let r0 = ran.clone();
    let r1 = ran.clone();
    let r2 = ran.clone();
    let r3 = ran.clone();
    let all_finished = Rc::new(RefCell::new(0));
    let fin = all_finished.clone();

    let mut batch = new_batch(move |ctx| {
        r0.borrow_mut().push(0);
        ctx.skip(2);
        Ok(())
    })
    .next(move |_ctx| {
        r1.borrow_mut().push(1);
        Ok(())
    })
    .next(move |_ctx| {
        r2.borrow_mut().push(2);
        Ok(())
    })
    .next(move |_ctx| {
        r3.borrow_mut().push(3);
        Ok(())
    })
    .when_all_finished(move |_ctx| {
        *fin.borrow_mut() += 1;
        Ok(())
    });
    batch.start().unwrap();
    assert_eq!(*ran.borrow(), vec![0, 3]);
    assert_eq!(*all_finished.borrow(), 1);
}

#[test]
fn forwarded_value_and_result_thread_through() {
    let mut batch = new_batch(|ctx| {
        assert!(ctx.is_first());
        ctx.next_value = Value::Str("from step 0".into());
        Ok(())
    })
    .next(|ctx| {
        assert!(ctx.is_last());
        assert_eq!(ctx.prev_value, Value::Str("from step 0".into()));
        ctx.set_result_and_value(Value::Int(99));
        Ok(())
    });
    assert_eq!(batch.start().unwrap(), Value::Int(99));
}

#[test]
fn shared_object_mutations_visible_to_later_steps_and_hooks() {
    let mut batch = new_batch(|ctx| {
        ctx.object.set("count", Value::Int(1));
        Ok(())
    })
    .next(|ctx| {
        let bumped = ctx.object.get("count").add(&Value::Int(1))?;
        ctx.object.set("count", bumped);
        Ok(())
    })
    .when_all_finished(|ctx| {
        assert_eq!(ctx.object.get("count"), Value::Int(2));
        Ok(())
    });
    batch.start().unwrap();
    assert_eq!(batch.object().get("count"), Value::Int(2));
}

#[test]
fn manual_invoke_strategy_defers_finish_tracking_to_steps() {
    let finished = Rc::new(RefCell::new(0));
    let counter = finished.clone();
    let mut batch = Batch::new(|ctx| {
        ctx.invoke_next();
        Ok(())
    })
    .invoke_strategy(InvokeStrategy::Manual)
    .next(|ctx| {
        ctx.invoke_next();
        Ok(())
    })
    .when_all_finished(move |_ctx| {
        *counter.borrow_mut() += 1;
        Ok(())
    });
    batch.start().unwrap();
    assert_eq!(*finished.borrow(), 1);
}

#[test]
fn per_operation_strategy_overrides_batch_default() {
    let finished = Rc::new(RefCell::new(0));
    let counter = finished.clone();
    // Batch default is manual; the lone operation opts back into automatic.
    let mut batch = Batch::new(|_ctx| Ok(()))
        .invoke_strategy(InvokeStrategy::Manual)
        .operation_invoke_strategy(InvokeStrategy::Automatic)
        .when_all_finished(move |_ctx| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
    batch.start().unwrap();
    assert_eq!(*finished.borrow(), 1);
}

#[test]
fn error_hook_sees_captured_error_and_recovers() {
    let message = Rc::new(RefCell::new(String::new()));
    let sink = message.clone();
    let mut batch = new_batch(|_ctx| Err(StepseqError::step_failure("recoverable")))
        .on_error(move |ctx| {
            if let Some(err) = &ctx.error {
                *sink.borrow_mut() = err.message();
            }
            ctx.set_result_and_value(Value::Str("recovered".into()));
            Ok(())
        })
        .next(|ctx| {
            assert_eq!(ctx.result, Value::Str("recovered".into()));
            Ok(())
        });
    batch.start().unwrap();
    assert_eq!(*message.borrow(), "recoverable");
}

#[test]
fn loggers_run_defensively() {
    let delivered = Rc::new(RefCell::new(0));
    let counter = delivered.clone();
    let mut batch = new_batch(|ctx| {
        ctx.log("working");
        Ok(())
    })
    .add_logger(|_record| panic!("broken logger"))
    .add_logger(move |_record| {
        *counter.borrow_mut() += 1;
    });
    batch.start().unwrap();
    assert_eq!(*delivered.borrow(), 1);
}
