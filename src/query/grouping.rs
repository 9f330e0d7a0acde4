//! Groupings: named sub-sequences keyed by a group key.

use crate::query::Sequence;
use crate::value::Value;

/// A materialized sub-sequence produced by `group_by`/`group_join`
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    key: Value,
    items: Vec<Value>,
}

impl Grouping {
    pub fn new(key: Value, items: Vec<Value>) -> Self {
        Self { key, items }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A fresh sequence over this grouping's members
    pub fn to_sequence(&self) -> Sequence {
        Sequence::grouped(self.key.clone(), self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_to_sequence_carries_key() {
        let group = Grouping::new(Value::Str("a".into()), vec![1.into(), 3.into()]);
        let mut seq = group.to_sequence();
        assert_eq!(seq.group_key(), Some(&Value::Str("a".into())));
        assert_eq!(seq.to_array().unwrap(), vec![Value::Int(1), Value::Int(3)]);
    }
}
