//! Expression AST for compiled lambda strings.
//!
//! The arrow grammar is deliberately small: literals, identifiers, property
//! access, indexing, unary/binary operators and the ternary conditional.
//! Compiled lambdas are interpreted at call time; there is no runtime code
//! generation.

use crate::error::Result;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Property(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// A compiled arrow lambda: parameter names plus a body expression
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Expr,
    pub source: String,
}

impl Lambda {
    /// Invoke the lambda with positional arguments.
    ///
    /// Missing arguments bind their parameters to `undefined`; surplus
    /// arguments are ignored. Unknown identifiers evaluate to `undefined`.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        let mut env = HashMap::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(Value::Undefined);
            env.insert(param.clone(), value);
        }
        eval(&self.body, &env)
    }
}

fn eval(expr: &Expr, env: &HashMap<String, Value>) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => Ok(env.get(name).cloned().unwrap_or(Value::Undefined)),
        Expr::Property(target, name) => {
            let target = eval(target, env)?;
            Ok(target.get_property(name))
        }
        Expr::Index(target, index) => {
            let target = eval(target, env)?;
            let index = eval(index, env)?;
            Ok(target.get_index(&index))
        }
        Expr::Unary(op, operand) => {
            let operand = eval(operand, env)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                UnaryOp::Neg => operand.negate(),
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            // Short-circuit the logical operators before evaluating rhs
            match op {
                BinaryOp::And => {
                    let left = eval(lhs, env)?;
                    if !left.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                    let right = eval(rhs, env)?;
                    return Ok(Value::Bool(right.is_truthy()));
                }
                BinaryOp::Or => {
                    let left = eval(lhs, env)?;
                    if left.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                    let right = eval(rhs, env)?;
                    return Ok(Value::Bool(right.is_truthy()));
                }
                _ => {}
            }

            let left = eval(lhs, env)?;
            let right = eval(rhs, env)?;
            match op {
                BinaryOp::Mul => left.multiply(&right),
                BinaryOp::Div => left.divide(&right),
                BinaryOp::Rem => left.remainder(&right),
                BinaryOp::Add => left.add(&right),
                BinaryOp::Sub => left.subtract(&right),
                BinaryOp::Lt => Ok(Value::Bool(left.compare(&right).is_lt())),
                BinaryOp::Le => Ok(Value::Bool(left.compare(&right).is_le())),
                BinaryOp::Gt => Ok(Value::Bool(left.compare(&right).is_gt())),
                BinaryOp::Ge => Ok(Value::Bool(left.compare(&right).is_ge())),
                BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(&right))),
                BinaryOp::Ne => Ok(Value::Bool(!left.loose_eq(&right))),
                BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            }
        }
        Expr::Conditional(cond, then_expr, else_expr) => {
            let cond = eval(cond, env)?;
            if cond.is_truthy() {
                eval(then_expr, env)
            } else {
                eval(else_expr, env)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lambda::parser::parse_lambda;

    fn run(src: &str, args: &[Value]) -> Value {
        parse_lambda(src).unwrap().invoke(args).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("(x, y) => x + y", &[2.into(), 3.into()]), 5.into());
        assert_eq!(run("x => x * x", &[4.into()]), 16.into());
        assert_eq!(run("x => -x + 1", &[3.into()]), Value::Int(-2));
    }

    #[test]
    fn test_comparison_and_logic() {
        assert_eq!(run("(a, b) => a < b && b < 10", &[1.into(), 5.into()]), true.into());
        assert_eq!(run("x => !x", &[Value::Bool(false)]), true.into());
        assert_eq!(run("x => x == 3 || x == 4", &[4.into()]), true.into());
    }

    #[test]
    fn test_ternary() {
        assert_eq!(
            run("x => x > 0 ? 'pos' : 'neg'", &[7.into()]),
            Value::Str("pos".to_string())
        );
    }

    #[test]
    fn test_property_and_index() {
        let obj = Value::Object(vec![("k".to_string(), Value::Str("a".to_string()))]);
        assert_eq!(run("x => x.k", &[obj]), Value::Str("a".to_string()));

        let arr = Value::Array(vec![10.into(), 20.into()]);
        assert_eq!(run("x => x[1]", &[arr]), 20.into());
    }

    #[test]
    fn test_missing_args_bind_undefined() {
        assert_eq!(run("(x, y) => y", &[1.into()]), Value::Undefined);
    }

    #[test]
    fn test_unknown_identifier_is_undefined() {
        assert_eq!(run("x => nothing", &[1.into()]), Value::Undefined);
    }
}
