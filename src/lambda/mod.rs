//! # Lambda Compiler
//!
//! Converts strings of the form `"(x, y) => expr"` into callable values.
//! The arrow grammar is parsed into a small AST that is interpreted at call
//! time; there is no general-purpose evaluation of user input.

pub mod ast;
pub mod callback;
pub mod parser;

pub use ast::{BinaryOp, Expr, Lambda, UnaryOp};
pub use callback::{Callback, ItemContext};
pub use parser::parse_lambda;

use crate::error::{Result, StepseqError};
use crate::value::Value;

/// Coerce a value into a callback.
///
/// - A callable is returned unchanged.
/// - A falsy value means "no operation configured" and yields `None`.
/// - A string is compiled as an arrow lambda.
/// - Anything else is not a function: raises `InvalidExpression` when
///   `throw_on_invalid`, otherwise yields `None`.
pub fn as_func(value: &Value, throw_on_invalid: bool) -> Result<Option<Callback>> {
    match value {
        Value::Func(callback) => Ok(Some(callback.clone())),
        v if !v.is_truthy() => Ok(None),
        Value::Str(source) => match Callback::parse(source) {
            Ok(callback) => Ok(Some(callback)),
            Err(err) => {
                if throw_on_invalid {
                    Err(err)
                } else {
                    Ok(None)
                }
            }
        },
        other => {
            if throw_on_invalid {
                Err(StepseqError::InvalidExpression {
                    message: "value is neither callable nor a lambda string".to_string(),
                    expression: other.to_display_string(),
                })
            } else {
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_func_passthrough() {
        let callback = Callback::predicate(|_| true);
        let func = Value::Func(callback.clone());
        let result = as_func(&func, true).unwrap().unwrap();
        assert_eq!(result, callback);
    }

    #[test]
    fn test_as_func_falsy_is_none() {
        assert!(as_func(&Value::Undefined, true).unwrap().is_none());
        assert!(as_func(&Value::Null, true).unwrap().is_none());
        assert!(as_func(&Value::Str(String::new()), true).unwrap().is_none());
    }

    #[test]
    fn test_as_func_compiles_strings() {
        let callback = as_func(&Value::Str("(x, y) => x + y".to_string()), true)
            .unwrap()
            .unwrap();
        assert_eq!(
            callback.call(&[2.into(), 3.into()]).unwrap(),
            Value::Int(5)
        );
    }

    #[test]
    fn test_as_func_invalid_string() {
        let bad = Value::Str("bad syntax".to_string());
        assert!(matches!(
            as_func(&bad, true),
            Err(StepseqError::InvalidExpression { .. })
        ));
        assert!(as_func(&bad, false).unwrap().is_none());
    }

    #[test]
    fn test_as_func_non_callable() {
        let n = Value::Int(7);
        assert!(as_func(&n, true).is_err());
        assert!(as_func(&n, false).unwrap().is_none());
    }
}
