//! Batch logger fan-out.
//!
//! Registered logger callbacks are invoked independently and defensively:
//! a panicking logger never aborts the batch or the remaining loggers.

use chrono::{DateTime, Utc};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use tracing::warn;

/// One timestamped batch log entry
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub batch_id: String,
    /// Position of the step that logged, when the message came from a step
    pub operation_index: Option<usize>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogRecord {
    pub fn new(batch_id: &str, operation_index: Option<usize>, message: String) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            operation_index,
            timestamp: Utc::now(),
            message,
        }
    }
}

/// A registered batch logger
pub type LoggerCallback = Rc<dyn Fn(&LogRecord)>;

/// Deliver `record` to every logger, isolating panics per logger
pub(crate) fn fan_out(loggers: &[LoggerCallback], record: &LogRecord) {
    for logger in loggers {
        let outcome = catch_unwind(AssertUnwindSafe(|| logger(record)));
        if outcome.is_err() {
            warn!(
                batch_id = %record.batch_id,
                message = %record.message,
                "batch logger panicked; continuing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_fan_out_reaches_every_logger() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let a = seen.clone();
        let b = seen.clone();
        let loggers: Vec<LoggerCallback> = vec![
            Rc::new(move |record: &LogRecord| a.borrow_mut().push(format!("a:{}", record.message))),
            Rc::new(move |record: &LogRecord| b.borrow_mut().push(format!("b:{}", record.message))),
        ];
        fan_out(&loggers, &LogRecord::new("batch-1", Some(0), "hi".into()));
        assert_eq!(*seen.borrow(), vec!["a:hi".to_string(), "b:hi".to_string()]);
    }

    #[test]
    fn test_panicking_logger_does_not_stop_the_rest() {
        let seen = Rc::new(RefCell::new(0usize));
        let counter = seen.clone();
        let loggers: Vec<LoggerCallback> = vec![
            Rc::new(|_record: &LogRecord| panic!("broken sink")),
            Rc::new(move |_record: &LogRecord| *counter.borrow_mut() += 1),
        ];
        fan_out(&loggers, &LogRecord::new("batch-1", None, "still here".into()));
        assert_eq!(*seen.borrow(), 1);
    }
}
