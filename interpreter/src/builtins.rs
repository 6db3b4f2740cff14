//! Functions available to every piece of embedded code. A builtin is only
//! consulted when the name is not bound in the scope, so page data can
//! shadow any of them.

use std::io::Write;

use crate::error::RuntimeError;
use crate::evaluator::{check_len, coerce_number};
use crate::runtime_value::{NativeFunction, RuntimeValue};

type Builtin = fn(&[RuntimeValue], &mut dyn Write) -> Result<RuntimeValue, RuntimeError>;

const BUILTINS: &[(&str, Builtin)] = &[
    ("print", print),
    ("len", len),
    ("str", stringify),
    ("range", range),
    ("join", join),
    ("keys", keys),
    ("upper", upper),
    ("lower", lower),
    ("get", get),
];

/// Look up a builtin by name.
pub fn lookup(name: &str) -> Option<NativeFunction> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(builtin, func)| NativeFunction::new(*builtin, *func))
}

fn arity(name: &str, args: &[RuntimeValue], min: usize, max: usize) -> Result<(), RuntimeError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(RuntimeError::ArityMismatch {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn expect_string<'a>(value: &'a RuntimeValue) -> Result<&'a str, RuntimeError> {
    match value {
        RuntimeValue::String(s) => Ok(s),
        other => Err(RuntimeError::TypeError {
            expected: "String".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}

fn expect_integer(value: &RuntimeValue) -> Result<i64, RuntimeError> {
    let n = coerce_number(value)?;
    if n != n.floor() {
        return Err(RuntimeError::TypeError {
            expected: "integer".to_string(),
            got: n.to_string(),
        });
    }
    Ok(n as i64)
}

fn print(args: &[RuntimeValue], output: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    let line = args
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(output, "{}", line).map_err(|e| RuntimeError::IoError(e.to_string()))?;
    Ok(RuntimeValue::None)
}

fn len(args: &[RuntimeValue], _: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    arity("len", args, 1, 1)?;
    let n = match &args[0] {
        RuntimeValue::String(s) => s.chars().count(),
        RuntimeValue::List(items) => items.len(),
        RuntimeValue::Map(entries) => entries.len(),
        other => {
            return Err(RuntimeError::TypeError {
                expected: "String, List or Map".to_string(),
                got: other.type_name().to_string(),
            });
        }
    };
    Ok(RuntimeValue::Number(n as f64))
}

fn stringify(args: &[RuntimeValue], _: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    arity("str", args, 1, 1)?;
    Ok(RuntimeValue::String(args[0].to_string()))
}

fn range(args: &[RuntimeValue], _: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    arity("range", args, 1, 2)?;
    let (start, end) = match args {
        [end] => (0, expect_integer(end)?),
        [start, end] => (expect_integer(start)?, expect_integer(end)?),
        _ => unreachable!("arity checked"),
    };
    let count = usize::try_from(end.saturating_sub(start)).unwrap_or(0);
    check_len(Some(count), "range")?;
    Ok(RuntimeValue::List(
        (start..end).map(|n| RuntimeValue::Number(n as f64)).collect(),
    ))
}

fn join(args: &[RuntimeValue], _: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    arity("join", args, 1, 2)?;
    let separator = match args.get(1) {
        Some(sep) => expect_string(sep)?,
        None => "",
    };
    match &args[0] {
        RuntimeValue::List(items) => Ok(RuntimeValue::String(
            items
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(separator),
        )),
        other => Err(RuntimeError::TypeError {
            expected: "List".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}

fn keys(args: &[RuntimeValue], _: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    arity("keys", args, 1, 1)?;
    match &args[0] {
        RuntimeValue::Map(entries) => Ok(RuntimeValue::List(
            entries
                .keys()
                .map(|k| RuntimeValue::String(k.clone()))
                .collect(),
        )),
        other => Err(RuntimeError::TypeError {
            expected: "Map".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}

fn upper(args: &[RuntimeValue], _: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    arity("upper", args, 1, 1)?;
    Ok(RuntimeValue::String(expect_string(&args[0])?.to_uppercase()))
}

fn lower(args: &[RuntimeValue], _: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    arity("lower", args, 1, 1)?;
    Ok(RuntimeValue::String(expect_string(&args[0])?.to_lowercase()))
}

/// `get(map, key, default)`: like indexing, but falls back instead of failing.
fn get(args: &[RuntimeValue], _: &mut dyn Write) -> Result<RuntimeValue, RuntimeError> {
    arity("get", args, 2, 3)?;
    let fallback = args.get(2).cloned().unwrap_or(RuntimeValue::None);
    match &args[0] {
        RuntimeValue::Map(entries) => {
            let key = expect_string(&args[1])?;
            Ok(entries.get(key).cloned().unwrap_or(fallback))
        }
        other => Err(RuntimeError::TypeError {
            expected: "Map".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}
