//! Formula compilation and evaluation.
//!
//! A formula is parsed once into a [`Formula`] and then evaluated against a
//! [`FieldResolver`] per row. Evaluation is a pure function of the parsed
//! expression and the resolver: there is no engine state to share or lock.

use std::cmp::Ordering;

use super::Value;
use super::parser::{BinaryOp, Expr, parse};
use crate::builtins::lookup_builtin;
use crate::error::{FormulaError, Result};

/// Supplies field values for the row being evaluated.
///
/// `reference` is whatever appeared between the braces of `{...}`: a field
/// name or a field id. Unknown references must fail with
/// [`FormulaError::FieldNotFound`].
pub trait FieldResolver {
    fn resolve(&self, reference: &str) -> Result<Value>;
}

impl<F> FieldResolver for F
where
    F: Fn(&str) -> Result<Value>,
{
    fn resolve(&self, reference: &str) -> Result<Value> {
        self(reference)
    }
}

/// A parsed formula, ready to evaluate against any number of rows.
#[derive(Clone, Debug)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate<R: FieldResolver + ?Sized>(&self, resolver: &R) -> Result<Value> {
        eval_expr(&self.expr, resolver)
    }
}

/// Parse a formula and check that every function it calls exists.
pub fn compile(expression: &str) -> Result<Formula> {
    let expr = parse(expression)?;
    check_functions(&expr)?;
    Ok(Formula {
        source: expression.to_string(),
        expr,
    })
}

/// Compile and evaluate a formula in one step.
pub fn evaluate<R: FieldResolver + ?Sized>(expression: &str, resolver: &R) -> Result<Value> {
    compile(expression)?.evaluate(resolver)
}

fn check_functions(expr: &Expr) -> Result<()> {
    match expr {
        Expr::Literal(_) | Expr::Field(_) => Ok(()),
        Expr::Negate(inner) => check_functions(inner),
        Expr::Chain { first, rest } => {
            check_functions(first)?;
            rest.iter().try_for_each(|(_, operand)| check_functions(operand))
        }
        Expr::Call { name, args } => {
            if lookup_builtin(name).is_none() {
                return Err(FormulaError::UnknownFunction(name.clone()));
            }
            args.iter().try_for_each(check_functions)
        }
    }
}

fn eval_expr<R: FieldResolver + ?Sized>(expr: &Expr, resolver: &R) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Field(reference) => resolver.resolve(reference),
        Expr::Negate(inner) => Ok(Value::Number(-eval_expr(inner, resolver)?.to_number())),
        Expr::Chain { first, rest } => {
            let mut acc = eval_expr(first, resolver)?;
            for (op, operand) in rest {
                let right = eval_expr(operand, resolver)?;
                acc = eval_binary(*op, &acc, &right)?;
            }
            Ok(acc)
        }
        Expr::Call { name, args } => eval_call(name, args, resolver),
    }
}

fn eval_call<R: FieldResolver + ?Sized>(name: &str, args: &[Expr], resolver: &R) -> Result<Value> {
    let builtin =
        lookup_builtin(name).ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // IF only evaluates the branch it takes.
    if builtin.name == "IF" {
        let [cond, then, otherwise] = args else {
            return Err(FormulaError::ArgumentCount {
                function: "IF".to_string(),
                expected: "3",
                got: args.len(),
            });
        };
        let branch = if eval_expr(cond, resolver)?.to_bool() {
            then
        } else {
            otherwise
        };
        return eval_expr(branch, resolver);
    }

    let values = args
        .iter()
        .map(|arg| eval_expr(arg, resolver))
        .collect::<Result<Vec<_>>>()?;
    (builtin.func)(&values)
}

fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let value = match op {
        BinaryOp::Add => Value::Number(left.to_number() + right.to_number()),
        BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Divide => {
            let divisor = right.to_number();
            if divisor == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            Value::Number(left.to_number() / divisor)
        }
        BinaryOp::Concat => Value::String(left.to_text() + &right.to_text()),
        BinaryOp::Equals => Value::Bool(compare(left, right) == Some(Ordering::Equal)),
        BinaryOp::NotEquals => Value::Bool(compare(left, right) != Some(Ordering::Equal)),
        BinaryOp::Less => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::LessEquals => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Greater => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::GreaterEquals => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    };
    Ok(value)
}

/// Numeric comparison when both sides look numeric, text comparison otherwise.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left.as_comparable_number(), right.as_comparable_number()) {
        (Some(l), Some(r)) => l.partial_cmp(&r),
        _ => Some(left.to_text().cmp(&right.to_text())),
    }
}
