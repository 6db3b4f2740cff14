use std::collections::BTreeMap;
use std::io::Write;

use script::ast::{BinaryOperator, Expression, TemplateString, TemplateStringPart, UnaryOperator};

use crate::builtins;
use crate::error::{DiagnosticError, RuntimeError};
use crate::runtime_value::RuntimeValue;
use crate::scope::Scope;

pub const MAX_DEPTH: usize = 256;
/// Longest string (in bytes) or list (in items) an operation may build.
pub const MAX_SEQUENCE_LEN: usize = 1 << 24;

/// Evaluate an expression against `scope`. Anything printed goes to `output`.
pub fn evaluate(
    value: &Expression,
    scope: &mut Scope,
    output: &mut dyn Write,
    depth: usize,
) -> Result<RuntimeValue, DiagnosticError> {
    if depth > MAX_DEPTH {
        return Err(RuntimeError::StackOverflow.into());
    }

    match value {
        // --- Literals ---
        Expression::NumberLiteral(n) => Ok(RuntimeValue::Number(*n)),
        Expression::StringLiteral(s) => Ok(RuntimeValue::String(s.clone())),
        Expression::BooleanLiteral(b) => Ok(RuntimeValue::Boolean(*b)),
        Expression::NoneLiteral => Ok(RuntimeValue::None),

        Expression::FormatString(template) => {
            let s = eval_template_string(template, scope, output, depth + 1)?;
            Ok(RuntimeValue::String(s))
        }

        Expression::ListLiteral(items) => {
            let items = items
                .iter()
                .map(|item| evaluate(item, scope, output, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RuntimeValue::List(items))
        }

        Expression::MapLiteral(entries) => {
            let mut map = BTreeMap::new();
            for (key, val) in entries {
                let key = match evaluate(key, scope, output, depth + 1)? {
                    RuntimeValue::String(s) => s,
                    other => {
                        return Err(type_error("String map key", &other).into());
                    }
                };
                let val = evaluate(val, scope, output, depth + 1)?;
                map.insert(key, val);
            }
            Ok(RuntimeValue::Map(map))
        }

        // --- References ---
        Expression::VariableReference(name, span) => {
            if let Some(value) = scope.get(name) {
                return Ok(value.clone());
            }
            builtins::lookup(name)
                .map(RuntimeValue::Native)
                .ok_or_else(|| DiagnosticError {
                    error: RuntimeError::UndefinedVariable(name.clone()),
                    span: Some(span.clone()),
                })
        }

        // --- Postfix ---
        Expression::Call {
            callee,
            arguments,
            span,
        } => {
            let function = evaluate(callee, scope, output, depth + 1)?;
            let arguments = arguments
                .iter()
                .map(|a| evaluate(a, scope, output, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            match function {
                RuntimeValue::Native(func) => func.call(&arguments, output).map_err(|error| {
                    DiagnosticError {
                        error,
                        span: Some(span.clone()),
                    }
                }),
                other => Err(DiagnosticError {
                    error: RuntimeError::NotCallable(other.type_name().to_string()),
                    span: Some(span.clone()),
                }),
            }
        }

        Expression::Index {
            target,
            index,
            span,
        } => {
            let target = evaluate(target, scope, output, depth + 1)?;
            let index = evaluate(index, scope, output, depth + 1)?;
            eval_index(&target, &index).map_err(|error| DiagnosticError {
                error,
                span: Some(span.clone()),
            })
        }

        // --- Operations ---
        Expression::UnaryOperation { operator, operand } => {
            let val = evaluate(operand, scope, output, depth + 1)?;
            match operator {
                UnaryOperator::Negation => {
                    let n = coerce_number(&val)?;
                    Ok(RuntimeValue::Number(-n))
                }
                UnaryOperator::LogicalNot => Ok(RuntimeValue::Boolean(val.is_falsy())),
            }
        }

        Expression::BinaryOperation {
            operator,
            left,
            right,
        } => {
            let l = evaluate(left, scope, output, depth + 1)?;
            // Short-circuit: the right operand is only evaluated when needed.
            match operator {
                BinaryOperator::LogicalAnd if l.is_falsy() => return Ok(l),
                BinaryOperator::LogicalOr if l.is_truthy() => return Ok(l),
                BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => {
                    return evaluate(right, scope, output, depth + 1);
                }
                _ => {}
            }
            let r = evaluate(right, scope, output, depth + 1)?;
            Ok(eval_binary_op(operator, &l, &r)?)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn type_error(expected: &str, got: &RuntimeValue) -> RuntimeError {
    RuntimeError::TypeError {
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

pub(crate) fn coerce_number(val: &RuntimeValue) -> Result<f64, RuntimeError> {
    match val {
        RuntimeValue::Number(n) => Ok(*n),
        other => Err(type_error("Number", other)),
    }
}

/// Resolve a possibly negative index against a sequence of `len` items.
fn resolve_index(index: &RuntimeValue, len: usize) -> Result<usize, RuntimeError> {
    let n = coerce_number(index)?;
    if n != n.floor() {
        return Err(RuntimeError::TypeError {
            expected: "integer index".to_string(),
            got: n.to_string(),
        });
    }
    let i = n as i64;
    let resolved = if i < 0 { len as i64 + i } else { i };
    if resolved < 0 || resolved >= len as i64 {
        return Err(RuntimeError::IndexOutOfBounds(i));
    }
    Ok(resolved as usize)
}

fn eval_index(target: &RuntimeValue, index: &RuntimeValue) -> Result<RuntimeValue, RuntimeError> {
    match target {
        RuntimeValue::List(items) => {
            let i = resolve_index(index, items.len())?;
            Ok(items[i].clone())
        }
        RuntimeValue::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = resolve_index(index, chars.len())?;
            Ok(RuntimeValue::String(chars[i].to_string()))
        }
        RuntimeValue::Map(entries) => match index {
            RuntimeValue::String(key) => entries
                .get(key)
                .cloned()
                .ok_or_else(|| RuntimeError::KeyNotFound(key.clone())),
            other => Err(type_error("String key", other)),
        },
        other => Err(type_error("List, String or Map", other)),
    }
}

/// Fail with [`RuntimeError::TooLarge`] when `len` overflowed or passes
/// [`MAX_SEQUENCE_LEN`].
pub fn check_len(len: Option<usize>, what: &str) -> Result<usize, RuntimeError> {
    match len {
        Some(len) if len <= MAX_SEQUENCE_LEN => Ok(len),
        _ => Err(RuntimeError::TooLarge(what.to_string())),
    }
}

/// `s * count`. Negative and NaN counts give the empty string.
fn repeat(s: &str, count: f64) -> Result<RuntimeValue, RuntimeError> {
    // `as` saturates, so huge counts land on usize::MAX and fail the check.
    let count = if count > 0.0 { count as usize } else { 0 };
    if s.is_empty() || count == 0 {
        return Ok(RuntimeValue::String(String::new()));
    }
    check_len(s.len().checked_mul(count), "repeated string")?;
    Ok(RuntimeValue::String(s.repeat(count)))
}

fn eval_binary_op(
    op: &BinaryOperator,
    left: &RuntimeValue,
    right: &RuntimeValue,
) -> Result<RuntimeValue, RuntimeError> {
    match op {
        BinaryOperator::Addition => match (left, right) {
            (RuntimeValue::Number(a), RuntimeValue::Number(b)) => Ok(RuntimeValue::Number(a + b)),
            (RuntimeValue::String(a), RuntimeValue::String(b)) => {
                check_len(a.len().checked_add(b.len()), "concatenated string")?;
                Ok(RuntimeValue::String(format!("{}{}", a, b)))
            }
            (RuntimeValue::List(a), RuntimeValue::List(b)) => {
                check_len(a.len().checked_add(b.len()), "concatenated list")?;
                Ok(RuntimeValue::List(a.iter().chain(b).cloned().collect()))
            }
            _ => Err(RuntimeError::TypeError {
                expected: "matching numeric, string or list types".to_string(),
                got: format!("{} + {}", left.type_name(), right.type_name()),
            }),
        },
        BinaryOperator::Subtraction => numeric_binop(left, right, |a, b| a - b),
        BinaryOperator::Multiplication => match (left, right) {
            (RuntimeValue::String(s), RuntimeValue::Number(n))
            | (RuntimeValue::Number(n), RuntimeValue::String(s)) => repeat(s, *n),
            _ => numeric_binop(left, right, |a, b| a * b),
        },
        BinaryOperator::Division => {
            let a = coerce_number(left)?;
            let b = coerce_number(right)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(RuntimeValue::Number(a / b))
        }
        BinaryOperator::Modulo => {
            let a = coerce_number(left)?;
            let b = coerce_number(right)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(RuntimeValue::Number(a.rem_euclid(b)))
        }
        BinaryOperator::Equality => Ok(RuntimeValue::Boolean(left == right)),
        BinaryOperator::Inequality => Ok(RuntimeValue::Boolean(left != right)),
        BinaryOperator::GreaterThan => compare(left, right, |o| o.is_gt()),
        BinaryOperator::LessThan => compare(left, right, |o| o.is_lt()),
        BinaryOperator::GreaterThanOrEqual => compare(left, right, |o| o.is_ge()),
        BinaryOperator::LessThanOrEqual => compare(left, right, |o| o.is_le()),
        // Short-circuited in `evaluate`.
        BinaryOperator::LogicalAnd => Ok(RuntimeValue::Boolean(
            left.is_truthy() && right.is_truthy(),
        )),
        BinaryOperator::LogicalOr => Ok(RuntimeValue::Boolean(
            left.is_truthy() || right.is_truthy(),
        )),
    }
}

fn numeric_binop(
    left: &RuntimeValue,
    right: &RuntimeValue,
    f: impl Fn(f64, f64) -> f64,
) -> Result<RuntimeValue, RuntimeError> {
    let a = coerce_number(left)?;
    let b = coerce_number(right)?;
    Ok(RuntimeValue::Number(f(a, b)))
}

/// Numbers compare numerically, strings lexicographically.
fn compare(
    left: &RuntimeValue,
    right: &RuntimeValue,
    f: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<RuntimeValue, RuntimeError> {
    let ordering = match (left, right) {
        (RuntimeValue::String(a), RuntimeValue::String(b)) => a.cmp(b),
        _ => {
            let a = coerce_number(left)?;
            let b = coerce_number(right)?;
            match a.partial_cmp(&b) {
                Some(o) => o,
                None => return Ok(RuntimeValue::Boolean(false)),
            }
        }
    };
    Ok(RuntimeValue::Boolean(f(ordering)))
}

pub fn eval_template_string(
    ts: &TemplateString,
    scope: &mut Scope,
    output: &mut dyn Write,
    depth: usize,
) -> Result<String, DiagnosticError> {
    let mut result = String::new();
    for part in &ts.parts {
        match part {
            TemplateStringPart::Literal(s) => result.push_str(s),
            TemplateStringPart::Expression(expr) => {
                let val = evaluate(expr, scope, output, depth)?;
                result.push_str(&val.to_string());
            }
        }
    }
    Ok(result)
}
