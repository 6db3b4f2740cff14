use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::error::RuntimeError;

type NativeFn = dyn Fn(&[RuntimeValue], &mut dyn Write) -> Result<RuntimeValue, RuntimeError>;

/// A function implemented in Rust and callable from embedded code.
/// Receives the evaluated arguments and the captured output sink.
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[RuntimeValue], &mut dyn Write) -> Result<RuntimeValue, RuntimeError>
        + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(
        &self,
        arguments: &[RuntimeValue],
        output: &mut dyn Write,
    ) -> Result<RuntimeValue, RuntimeError> {
        (self.func)(arguments, output)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}

/// A runtime value produced by evaluating an expression.
#[derive(Debug, Clone)]
pub enum RuntimeValue {
    Number(f64),
    Boolean(bool),
    String(String),
    None,
    List(Vec<RuntimeValue>),
    /// String-keyed mapping, iterated in key order.
    Map(BTreeMap<String, RuntimeValue>),
    Native(NativeFunction),
}

impl RuntimeValue {
    pub fn is_truthy(&self) -> bool {
        !self.is_falsy()
    }

    pub fn is_falsy(&self) -> bool {
        match self {
            RuntimeValue::Boolean(b) => !b,
            RuntimeValue::None => true,
            RuntimeValue::Number(n) => *n == 0.0,
            RuntimeValue::String(s) => s.is_empty(),
            RuntimeValue::List(items) => items.is_empty(),
            RuntimeValue::Map(entries) => entries.is_empty(),
            RuntimeValue::Native(_) => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Number(_) => "Number",
            RuntimeValue::Boolean(_) => "Boolean",
            RuntimeValue::String(_) => "String",
            RuntimeValue::None => "None",
            RuntimeValue::List(_) => "List",
            RuntimeValue::Map(_) => "Map",
            RuntimeValue::Native(_) => "Function",
        }
    }

    /// Convert back into JSON. Functions have no JSON form and become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RuntimeValue::Number(n) => {
                if is_integral(*n) {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            RuntimeValue::Boolean(b) => serde_json::Value::Bool(*b),
            RuntimeValue::String(s) => serde_json::Value::String(s.clone()),
            RuntimeValue::None | RuntimeValue::Native(_) => serde_json::Value::Null,
            RuntimeValue::List(items) => {
                serde_json::Value::Array(items.iter().map(RuntimeValue::to_json).collect())
            }
            RuntimeValue::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Representation used for values nested inside lists and maps:
    /// strings are quoted, everything else displays as usual.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::String(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            other => write!(f, "{}", other),
        }
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n == n.floor() && n.abs() < 1e15
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Number(n) => {
                if is_integral(*n) {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            RuntimeValue::Boolean(b) => write!(f, "{}", b),
            RuntimeValue::String(s) => write!(f, "{}", s),
            RuntimeValue::None => write!(f, "none"),
            RuntimeValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                write!(f, "]")
            }
            RuntimeValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\": ", key)?;
                    value.fmt_nested(f)?;
                }
                write!(f, "}}")
            }
            RuntimeValue::Native(func) => write!(f, "{:?}", func),
        }
    }
}

impl PartialEq for RuntimeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeValue::Number(a), RuntimeValue::Number(b)) => a == b, // NaN != NaN per IEEE 754
            (RuntimeValue::Boolean(a), RuntimeValue::Boolean(b)) => a == b,
            (RuntimeValue::String(a), RuntimeValue::String(b)) => a == b,
            (RuntimeValue::None, RuntimeValue::None) => true,
            (RuntimeValue::List(a), RuntimeValue::List(b)) => a == b,
            (RuntimeValue::Map(a), RuntimeValue::Map(b)) => a == b,
            (RuntimeValue::Native(a), RuntimeValue::Native(b)) => Rc::ptr_eq(&a.func, &b.func),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for RuntimeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RuntimeValue::None,
            serde_json::Value::Bool(b) => RuntimeValue::Boolean(b),
            serde_json::Value::Number(n) => RuntimeValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => RuntimeValue::String(s),
            serde_json::Value::Array(items) => {
                RuntimeValue::List(items.into_iter().map(RuntimeValue::from).collect())
            }
            serde_json::Value::Object(entries) => RuntimeValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, RuntimeValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for RuntimeValue {
    fn from(s: &str) -> Self {
        RuntimeValue::String(s.to_string())
    }
}
