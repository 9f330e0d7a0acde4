//! Type-tag casting for `cast`/`of_type`.
//!
//! The tag set is closed; anything outside it raises `UnsupportedCast`.

use crate::error::{Result, StepseqError};
use crate::lambda::Callback;
use crate::value::{Observable, ObservableArray, Value};

/// Whether `tag` belongs to the recognized type-tag set
pub fn is_known_tag(tag: &str) -> bool {
    matches!(
        tag,
        "" | "null"
            | "undefined"
            | "number"
            | "float"
            | "int"
            | "integer"
            | "str"
            | "string"
            | "enumerable"
            | "seq"
            | "sequence"
            | "array"
            | "observable"
            | "observablearray"
            | "bool"
            | "boolean"
            | "func"
            | "function"
    )
}

fn check_tag(tag: &str) -> Result<()> {
    if is_known_tag(tag) {
        Ok(())
    } else {
        Err(StepseqError::UnsupportedCast {
            type_tag: tag.to_string(),
        })
    }
}

/// Whether `value`'s kind matches `tag` (the `of_type` filter test)
pub fn matches_tag(value: &Value, tag: &str) -> Result<bool> {
    check_tag(tag)?;
    let matched = match tag {
        "" => true,
        "null" => matches!(value, Value::Null),
        "undefined" => matches!(value, Value::Undefined),
        "number" => matches!(value, Value::Int(_) | Value::Float(_)),
        "float" => matches!(value, Value::Float(_)),
        "int" | "integer" => matches!(value, Value::Int(_)),
        "str" | "string" => matches!(value, Value::Str(_)),
        "array" => matches!(value, Value::Array(_)),
        "bool" | "boolean" => matches!(value, Value::Bool(_)),
        "observable" => matches!(value, Value::Observable(_)),
        "observablearray" => matches!(value, Value::ObservableArray(_)),
        "func" | "function" => matches!(value, Value::Func(_)),
        "enumerable" | "seq" | "sequence" => matches!(
            value,
            Value::Array(_)
                | Value::Object(_)
                | Value::Group(_)
                | Value::Observable(_)
                | Value::ObservableArray(_)
        ),
        _ => unreachable!("tag validated above"),
    };
    Ok(matched)
}

/// Convert `value` to the kind named by `tag` (the `cast` mapping).
///
/// Conversions that cannot succeed yield `undefined` rather than raising;
/// only an unrecognized tag is an error.
pub fn cast_to(value: &Value, tag: &str) -> Result<Value> {
    check_tag(tag)?;
    let converted = match tag {
        "" => value.clone(),
        "null" => Value::Null,
        "undefined" => Value::Undefined,
        "number" => match value {
            Value::Int(_) | Value::Float(_) => value.clone(),
            Value::Bool(b) => Value::Int(i64::from(*b)),
            Value::Str(s) => parse_number(s),
            _ => Value::Undefined,
        },
        "float" => match value {
            Value::Float(_) => value.clone(),
            Value::Int(i) => Value::Float(*i as f64),
            Value::Bool(b) => Value::Float(f64::from(u8::from(*b))),
            Value::Str(s) => match s.trim().parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => Value::Undefined,
            },
            _ => Value::Undefined,
        },
        "int" | "integer" => match value {
            Value::Int(_) => value.clone(),
            Value::Float(f) => Value::Int(*f as i64),
            Value::Bool(b) => Value::Int(i64::from(*b)),
            Value::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => match s.trim().parse::<f64>() {
                    Ok(f) => Value::Int(f as i64),
                    Err(_) => Value::Undefined,
                },
            },
            _ => Value::Undefined,
        },
        "str" | "string" => Value::Str(value.to_display_string()),
        "bool" | "boolean" => Value::Bool(value.is_truthy()),
        "array" => match value {
            Value::Array(_) => value.clone(),
            Value::Group(group) => Value::Array(group.items().to_vec()),
            Value::ObservableArray(items) => Value::Array(items.items()),
            Value::Object(entries) => {
                Value::Array(entries.iter().map(|(_, v)| v.clone()).collect())
            }
            _ => Value::Undefined,
        },
        "enumerable" | "seq" | "sequence" => match value {
            Value::Array(_)
            | Value::Object(_)
            | Value::Group(_)
            | Value::Observable(_)
            | Value::ObservableArray(_) => value.clone(),
            _ => Value::Undefined,
        },
        "observable" => match value {
            Value::Observable(_) => value.clone(),
            Value::Object(entries) => {
                Value::Observable(Observable::from_entries(entries.clone()))
            }
            _ => Value::Undefined,
        },
        "observablearray" => match value {
            Value::ObservableArray(_) => value.clone(),
            Value::Array(items) => {
                Value::ObservableArray(ObservableArray::from_items(items.clone()))
            }
            _ => Value::Undefined,
        },
        "func" | "function" => match value {
            Value::Func(_) => value.clone(),
            Value::Str(source) => match Callback::parse(source) {
                Ok(callback) => Value::Func(callback),
                Err(_) => Value::Undefined,
            },
            _ => Value::Undefined,
        },
        _ => unreachable!("tag validated above"),
    };
    Ok(converted)
}

fn parse_number(s: &str) -> Value {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(f) = trimmed.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::Undefined
    }
}
