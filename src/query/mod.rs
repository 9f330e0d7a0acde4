//! # Query Engine
//!
//! Pull-based sequences over dynamic values with a LINQ-shaped operator
//! library. Sequences are single-pass: combinators drain their source and
//! return fresh array-backed sequences, `select` alone stays lazy.

pub mod cursor;
pub mod grouping;
pub mod ordering;
pub mod sequence;

pub use grouping::Grouping;
pub use ordering::SortSpec;
pub use sequence::Sequence;

use crate::error::{Result, StepseqError};
use crate::value::Value;

/// Sequence over the items of an array value
pub fn from_array(items: Vec<Value>) -> Sequence {
    Sequence::from_items(items)
}

/// Sequence over the property entries of an object value
pub fn from_object(entries: Vec<(String, Value)>) -> Sequence {
    Sequence::from_entries(entries)
}

/// Sequence of exactly the given items
pub fn of(items: Vec<Value>) -> Sequence {
    Sequence::from_items(items)
}

/// Sequence of `count` consecutive integers starting at `start`
pub fn range(start: i64, count: usize) -> Sequence {
    Sequence::range(start, count)
}

/// Build a sequence from any enumerable value; non-enumerable values
/// raise `NotEnumerable`
pub fn create(value: &Value) -> Result<Sequence> {
    match as_enumerable(value, true)? {
        Some(seq) => Ok(seq),
        // as_enumerable with throw=true never returns None
        None => Err(StepseqError::NotEnumerable {
            kind: value.kind().to_string(),
        }),
    }
}

/// Whether a sequence can be built over this value
pub fn is_enumerable(value: &Value) -> bool {
    matches!(
        value,
        Value::Array(_)
            | Value::Object(_)
            | Value::Group(_)
            | Value::Observable(_)
            | Value::ObservableArray(_)
    )
}

/// Coerce a value into a sequence when its kind allows it.
///
/// Arrays and array-like handles enumerate their items; objects and
/// observables enumerate `(name, value)` entries; groupings enumerate
/// their members and carry the group key. Anything else yields `None`,
/// or `NotEnumerable` when `throw_on_invalid` is set.
pub fn as_enumerable(value: &Value, throw_on_invalid: bool) -> Result<Option<Sequence>> {
    let seq = match value {
        Value::Array(items) => Some(Sequence::from_items(items.clone())),
        Value::Object(entries) => Some(Sequence::from_entries(entries.clone())),
        Value::Group(group) => Some(group.to_sequence()),
        Value::Observable(bag) => Some(Sequence::from_entries(bag.entries())),
        Value::ObservableArray(items) => Some(Sequence::from_items(items.items())),
        _ => {
            if throw_on_invalid {
                return Err(StepseqError::NotEnumerable {
                    kind: value.kind().to_string(),
                });
            }
            None
        }
    };
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_from_array() {
        let mut seq = create(&Value::Array(vec![1.into(), 2.into()])).unwrap();
        assert_eq!(seq.to_array().unwrap(), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_create_from_object_enumerates_values() {
        let obj = Value::Object(vec![
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ]);
        let mut seq = create(&obj).unwrap();
        assert!(seq.move_next());
        assert_eq!(seq.item_key(), Value::Str("a".to_string()));
        assert_eq!(seq.current().unwrap(), Value::Int(1));
    }

    #[test]
    fn test_create_rejects_scalars() {
        assert!(matches!(
            create(&Value::Int(3)),
            Err(StepseqError::NotEnumerable { .. })
        ));
        assert!(as_enumerable(&Value::Int(3), false).unwrap().is_none());
    }

    #[test]
    fn test_is_enumerable() {
        assert!(is_enumerable(&Value::Array(vec![])));
        assert!(is_enumerable(&Value::Object(vec![])));
        assert!(!is_enumerable(&Value::Str("abc".into())));
        assert!(!is_enumerable(&Value::Null));
    }

    #[test]
    fn test_range() {
        let mut seq = range(3, 3);
        assert_eq!(
            seq.to_array().unwrap(),
            vec![Value::Int(3), Value::Int(4), Value::Int(5)]
        );
    }
}
