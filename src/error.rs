//! # Structured Error Handling
//!
//! Central error taxonomy for the query and batch engines using thiserror
//! for structured error types instead of `Box<dyn Error>` patterns.

use thiserror::Error;

/// All errors raised by the stepseq engines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepseqError {
    /// Malformed lambda-string input to the expression compiler
    #[error("Invalid expression: {message}: {expression}")]
    InvalidExpression { message: String, expression: String },

    /// A first/single/element_at-style terminal found no matching element
    #[error("Sequence contains no matching element: {operation}")]
    EmptySequence { operation: String },

    /// single/single_or_default found more than one matching element
    #[error("Sequence contains more than one matching element: {operation}")]
    MultipleMatches { operation: String },

    /// cast/of_type given a type tag outside the recognized set
    #[error("Unsupported cast: unrecognized type tag: {type_tag}")]
    UnsupportedCast { type_tag: String },

    /// A value that is neither an array, object, grouping nor observable
    /// was handed to as_enumerable
    #[error("Value of kind {kind} cannot be enumerated")]
    NotEnumerable { kind: String },

    /// Two operations in the same batch were assigned the same id
    #[error("Duplicate operation id in batch: {id}")]
    DuplicateOperationId { id: String },

    /// An unhandled error raised inside a step's lifecycle phase
    #[error("Step {operation_index} failed during {phase}: {message}")]
    StepFailed {
        operation_index: usize,
        phase: String,
        message: String,
    },

    /// Engine configuration could not be parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl StepseqError {
    /// Construct a step failure for a user hook that wants to raise.
    ///
    /// Index and phase are filled in by the engine when it captures the
    /// error; user hooks only supply the message.
    pub fn step_failure(message: impl Into<String>) -> Self {
        StepseqError::StepFailed {
            operation_index: 0,
            phase: String::new(),
            message: message.into(),
        }
    }

    /// The failure message carried by this error
    pub fn message(&self) -> String {
        match self {
            StepseqError::StepFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StepseqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StepseqError::UnsupportedCast {
            type_tag: "widget".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported cast: unrecognized type tag: widget"
        );

        let err = StepseqError::DuplicateOperationId {
            id: "load".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate operation id in batch: load");
    }

    #[test]
    fn test_step_failure_message() {
        let err = StepseqError::step_failure("boom");
        assert_eq!(err.message(), "boom");
    }
}
