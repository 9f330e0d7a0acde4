//! # Dynamic Value Model
//!
//! The untyped element kind flowing through sequences and batch pipelines.
//! A tagged union covering scalars, insertion-ordered objects, the shared
//! mutable blackboard handles, groupings and callable values.

pub mod cast;
pub mod observable;

pub use cast::{cast_to, is_known_tag, matches_tag};
pub use observable::{Observable, ObservableArray};

use crate::lambda::Callback;
use crate::query::Grouping;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    /// Insertion-ordered property bag
    Object(Vec<(String, Value)>),
    Observable(Observable),
    ObservableArray(ObservableArray),
    Group(Rc<Grouping>),
    Func(Callback),
}

impl Value {
    /// Truthiness in the source-language sense
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_)
            | Value::Object(_)
            | Value::Observable(_)
            | Value::ObservableArray(_)
            | Value::Group(_)
            | Value::Func(_) => true,
        }
    }

    /// Short name of this value's kind, used in error reporting
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Observable(_) => "observable",
            Value::ObservableArray(_) => "observablearray",
            Value::Group(_) => "group",
            Value::Func(_) => "function",
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Default ordering comparison: numeric less-than for numbers, string
    /// less-than for strings, display-string comparison across kinds.
    pub fn compare(&self, other: &Value) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => self.to_display_string().cmp(&other.to_display_string()),
        }
    }

    /// Equality with numeric cross-type coercion (`1 == 1.0`)
    pub fn loose_eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a == b;
        }
        self == other
    }

    pub fn add(&self, other: &Value) -> crate::error::Result<Value> {
        match (self, other) {
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!(
                "{}{}",
                self.to_display_string(),
                other.to_display_string()
            ))),
            (Value::Int(a), Value::Int(b)) => Ok(a
                .checked_add(*b)
                .map(Value::Int)
                .unwrap_or(Value::Float(*a as f64 + *b as f64))),
            _ => Ok(numeric_or_nan(self, other, |a, b| a + b)),
        }
    }

    pub fn subtract(&self, other: &Value) -> crate::error::Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a
                .checked_sub(*b)
                .map(Value::Int)
                .unwrap_or(Value::Float(*a as f64 - *b as f64))),
            _ => Ok(numeric_or_nan(self, other, |a, b| a - b)),
        }
    }

    pub fn multiply(&self, other: &Value) -> crate::error::Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a
                .checked_mul(*b)
                .map(Value::Int)
                .unwrap_or(Value::Float(*a as f64 * *b as f64))),
            _ => Ok(numeric_or_nan(self, other, |a, b| a * b)),
        }
    }

    /// Division always produces a float, matching the source language
    pub fn divide(&self, other: &Value) -> crate::error::Result<Value> {
        Ok(numeric_or_nan(self, other, |a, b| a / b))
    }

    pub fn remainder(&self, other: &Value) -> crate::error::Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) if *b != 0 => Ok(Value::Int(a % b)),
            _ => Ok(numeric_or_nan(self, other, |a, b| a % b)),
        }
    }

    pub fn negate(&self) -> crate::error::Result<Value> {
        match self {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            _ => Ok(Value::Float(f64::NAN)),
        }
    }

    /// Property lookup; missing properties yield `undefined`
    pub fn get_property(&self, name: &str) -> Value {
        match self {
            Value::Object(entries) => entries
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Undefined),
            Value::Observable(bag) => bag.get(name),
            Value::Group(group) => match name {
                "key" => group.key().clone(),
                "items" => Value::Array(group.items().to_vec()),
                "length" => Value::Int(group.len() as i64),
                _ => Value::Undefined,
            },
            Value::Array(items) if name == "length" => Value::Int(items.len() as i64),
            Value::ObservableArray(items) if name == "length" => Value::Int(items.len() as i64),
            Value::Str(s) if name == "length" => Value::Int(s.chars().count() as i64),
            _ => Value::Undefined,
        }
    }

    /// Index lookup; out-of-range or mismatched kinds yield `undefined`
    pub fn get_index(&self, index: &Value) -> Value {
        match (self, index) {
            (Value::Array(items), Value::Int(i)) => {
                if *i >= 0 {
                    items.get(*i as usize).cloned().unwrap_or(Value::Undefined)
                } else {
                    Value::Undefined
                }
            }
            (Value::ObservableArray(items), Value::Int(i)) => {
                if *i >= 0 {
                    items.get(*i as usize)
                } else {
                    Value::Undefined
                }
            }
            (Value::Object(_), Value::Str(key)) => self.get_property(key),
            (Value::Observable(bag), Value::Str(key)) => bag.get(key),
            (Value::Group(_), Value::Str(key)) => self.get_property(key),
            _ => Value::Undefined,
        }
    }

    /// Render the value as the source language would for string contexts
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }

    /// Convert a `serde_json::Value` into an engine value
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to a `serde_json::Value`. Functions are not representable
    /// and map to null; shared handles and groupings serialize their
    /// current contents.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Func(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Observable(bag) => serde_json::Value::Object(
                bag.entries()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::ObservableArray(items) => {
                serde_json::Value::Array(items.items().iter().map(Value::to_json).collect())
            }
            Value::Group(group) => {
                let mut map = serde_json::Map::new();
                map.insert("key".to_string(), group.key().to_json());
                map.insert(
                    "items".to_string(),
                    serde_json::Value::Array(group.items().iter().map(Value::to_json).collect()),
                );
                serde_json::Value::Object(map)
            }
        }
    }
}

fn numeric_or_nan(a: &Value, b: &Value, f: impl Fn(f64, f64) -> f64) -> Value {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => Value::Float(f(a, b)),
        _ => Value::Float(f64::NAN),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Observable(bag) => write!(f, "[observable {} entries]", bag.len()),
            Value::ObservableArray(items) => write!(f, "[observablearray {} items]", items.len()),
            Value::Group(group) => write!(f, "[group {}]", group.key()),
            Value::Func(_) => write!(f, "[function]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn test_compare_numeric_and_string() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Ordering::Less);
        assert_eq!(Value::Int(2).compare(&Value::Int(2)), Ordering::Equal);
        assert_eq!(
            Value::Str("b".into()).compare(&Value::Str("a".into())),
            Ordering::Greater
        );
    }

    #[test]
    fn test_loose_eq_cross_type() {
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(!Value::Int(1).loose_eq(&Value::Str("1".into())));
    }

    #[test]
    fn test_string_concat() {
        let joined = Value::Str("n=".into()).add(&Value::Int(3)).unwrap();
        assert_eq!(joined, Value::Str("n=3".into()));
    }

    #[test]
    fn test_division_is_float() {
        assert_eq!(
            Value::Int(7).divide(&Value::Int(2)).unwrap(),
            Value::Float(3.5)
        );
    }

    #[test]
    fn test_json_round_trip() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a": 1, "b": [true, "x", 2.5]}"#).unwrap();
        let value = Value::from_json(&json);
        assert_eq!(value.get_property("a"), Value::Int(1));
        assert_eq!(value.to_json(), json);
    }
}
