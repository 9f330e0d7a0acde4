//! Callable values: native closures and compiled lambdas behind one type.
//!
//! Everywhere the engines accept a callback, callers may hand over either a
//! Rust closure or a lambda string; both end up as a [`Callback`].

use crate::error::Result;
use crate::lambda::ast::Lambda;
use crate::lambda::parser::parse_lambda;
use crate::value::Value;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Per-item iteration context exposing the cooperative cancel flag.
///
/// Setting `cancel` inside a per-item callback stops iteration after the
/// current item has been processed.
#[derive(Debug, Default)]
pub struct ItemContext {
    cancelled: Cell<bool>,
}

impl ItemContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self, flag: bool) {
        self.cancelled.set(flag);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

type NativeFn = Rc<dyn Fn(&[Value], &ItemContext) -> Result<Value>>;

/// A callable: either a native Rust closure or a compiled lambda string
#[derive(Clone)]
pub enum Callback {
    Native(NativeFn),
    Lambda(Rc<Lambda>),
}

impl Callback {
    /// Wrap a native closure that wants the iteration context
    pub fn native(f: impl Fn(&[Value], &ItemContext) -> Result<Value> + 'static) -> Self {
        Callback::Native(Rc::new(f))
    }

    /// Wrap a native closure that only looks at its arguments
    pub fn from_fn(f: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Callback::Native(Rc::new(move |args, _ctx| f(args)))
    }

    /// Wrap an infallible `(item, index)` selector
    pub fn selector(f: impl Fn(&Value, usize) -> Value + 'static) -> Self {
        Callback::Native(Rc::new(move |args, _ctx| {
            let item = args.first().cloned().unwrap_or(Value::Undefined);
            let index = match args.get(1) {
                Some(Value::Int(i)) => *i as usize,
                _ => 0,
            };
            Ok(f(&item, index))
        }))
    }

    /// Wrap an infallible single-item predicate
    pub fn predicate(f: impl Fn(&Value) -> bool + 'static) -> Self {
        Callback::Native(Rc::new(move |args, _ctx| {
            let item = args.first().cloned().unwrap_or(Value::Undefined);
            Ok(Value::Bool(f(&item)))
        }))
    }

    /// Wrap a `(a, b) -> -1|0|1` comparer
    pub fn comparer(f: impl Fn(&Value, &Value) -> i32 + 'static) -> Self {
        Callback::Native(Rc::new(move |args, _ctx| {
            let a = args.first().cloned().unwrap_or(Value::Undefined);
            let b = args.get(1).cloned().unwrap_or(Value::Undefined);
            Ok(Value::Int(i64::from(f(&a, &b))))
        }))
    }

    /// Compile a lambda string into a callback
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Callback::Lambda(Rc::new(parse_lambda(source)?)))
    }

    /// Invoke with positional arguments and an iteration context
    pub fn invoke(&self, args: &[Value], ctx: &ItemContext) -> Result<Value> {
        match self {
            Callback::Native(f) => f(args, ctx),
            Callback::Lambda(lambda) => lambda.invoke(args),
        }
    }

    /// Invoke with positional arguments and a throwaway iteration context
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.invoke(args, &ItemContext::new())
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Native(_) => write!(f, "Callback::Native"),
            Callback::Lambda(lambda) => write!(f, "Callback::Lambda({})", lambda.source),
        }
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callback::Native(a), Callback::Native(b)) => Rc::ptr_eq(a, b),
            (Callback::Lambda(a), Callback::Lambda(b)) => {
                Rc::ptr_eq(a, b) || a.source == b.source
            }
            _ => false,
        }
    }
}
