//! Shared mutable state handles: the batch-wide "blackboard".
//!
//! `Observable` is a key/value bag and `ObservableArray` a list, both held
//! behind `Rc<RefCell<..>>` so every operation and hook in a batch sees
//! mutations made by earlier steps. Single-threaded by design; neither type
//! is `Send` or `Sync`.

use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared mutable key/value bag with insertion-ordered keys
#[derive(Clone, Default)]
pub struct Observable {
    inner: Rc<RefCell<Vec<(String, Value)>>>,
}

impl Observable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<(String, Value)>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(entries)),
        }
    }

    /// Read a key; missing keys yield `undefined`
    pub fn get(&self, key: &str) -> Value {
        self.inner
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Undefined)
    }

    /// Write a key, replacing an existing entry or appending a new one
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut entries = self.inner.borrow_mut();
        if let Some(entry) = entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            entries.push((key, value));
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.borrow().iter().any(|(k, _)| k == key)
    }

    /// Remove a key, returning its value if present
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut entries = self.inner.borrow_mut();
        let index = entries.iter().position(|(k, _)| k == key)?;
        Some(entries.remove(index).1)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Snapshot of the current entries
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.inner.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Whether two handles refer to the same underlying bag
    pub fn same_as(&self, other: &Observable) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observable({} entries)", self.len())
    }
}

impl PartialEq for Observable {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

/// Shared mutable list
#[derive(Clone, Default)]
pub struct ObservableArray {
    inner: Rc<RefCell<Vec<Value>>>,
}

impl ObservableArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Value>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(items)),
        }
    }

    pub fn push(&self, value: Value) {
        self.inner.borrow_mut().push(value);
    }

    /// Read by index; out-of-range yields `undefined`
    pub fn get(&self, index: usize) -> Value {
        self.inner
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    /// Write by index; out-of-range writes are ignored
    pub fn set(&self, index: usize, value: Value) {
        let mut items = self.inner.borrow_mut();
        if index < items.len() {
            items[index] = value;
        }
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = self.inner.borrow_mut();
        if index < items.len() {
            Some(items.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Snapshot of the current items
    pub fn items(&self) -> Vec<Value> {
        self.inner.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn same_as(&self, other: &ObservableArray) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObservableArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObservableArray({} items)", self.len())
    }
}

impl PartialEq for ObservableArray {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observable_set_get_replace() {
        let bag = Observable::new();
        bag.set("a", Value::Int(1));
        bag.set("b", Value::Int(2));
        bag.set("a", Value::Int(3));

        assert_eq!(bag.get("a"), Value::Int(3));
        assert_eq!(bag.get("b"), Value::Int(2));
        assert_eq!(bag.get("missing"), Value::Undefined);
        assert_eq!(bag.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_observable_shared_visibility() {
        let bag = Observable::new();
        let alias = bag.clone();
        alias.set("k", Value::Int(42));
        assert_eq!(bag.get("k"), Value::Int(42));
        assert!(bag.same_as(&alias));
    }

    #[test]
    fn test_observable_array_mutation() {
        let items = ObservableArray::new();
        let alias = items.clone();
        items.push(Value::Int(0));
        alias.push(Value::Int(1));

        assert_eq!(items.len(), 2);
        assert_eq!(items.get(1), Value::Int(1));
        items.set(0, Value::Int(9));
        assert_eq!(alias.get(0), Value::Int(9));
        assert_eq!(items.get(5), Value::Undefined);
    }
}
