use std::fmt;
use std::ops::Range;

use script::parser::ParseError;

#[derive(Debug)]
pub enum RuntimeError {
    TypeError { expected: String, got: String },
    UndefinedVariable(String),
    NotCallable(String),
    ArityMismatch { name: String, expected: String, got: usize },
    IndexOutOfBounds(i64),
    KeyNotFound(String),
    DivisionByZero,
    IoError(String),
    StackOverflow,
    /// A string or list would grow past [`crate::MAX_SEQUENCE_LEN`].
    TooLarge(String),
    Custom(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeError { expected, got } => {
                write!(f, "type error: expected {}, got {}", expected, got)
            }
            RuntimeError::UndefinedVariable(name) => write!(f, "undefined variable: {}", name),
            RuntimeError::NotCallable(type_name) => {
                write!(f, "value of type {} is not callable", type_name)
            }
            RuntimeError::ArityMismatch {
                name,
                expected,
                got,
            } => write!(
                f,
                "{}() takes {} argument(s), {} given",
                name, expected, got
            ),
            RuntimeError::IndexOutOfBounds(idx) => write!(f, "index {} out of bounds", idx),
            RuntimeError::KeyNotFound(key) => write!(f, "key not found: {:?}", key),
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::IoError(msg) => write!(f, "I/O error: {}", msg),
            RuntimeError::StackOverflow => write!(f, "stack overflow"),
            RuntimeError::TooLarge(what) => write!(f, "{} is too large", what),
            RuntimeError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// A runtime error enriched with the byte span of the code that raised it.
#[derive(Debug)]
pub struct DiagnosticError {
    pub error: RuntimeError,
    pub span: Option<Range<usize>>,
}

impl DiagnosticError {
    /// Attach `span` unless a more precise one is already recorded.
    pub fn or_span(mut self, span: &Range<usize>) -> Self {
        if self.span.is_none() {
            self.span = Some(span.clone());
        }
        self
    }
}

impl From<RuntimeError> for DiagnosticError {
    fn from(error: RuntimeError) -> Self {
        DiagnosticError { error, span: None }
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for DiagnosticError {}

/// Failure of [`crate::Interpreter::execute`]: the code either did not parse
/// or raised while running.
#[derive(Debug)]
pub enum ExecutionError {
    Parse(ParseError),
    Runtime(DiagnosticError),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::Parse(e) => e.fmt(f),
            ExecutionError::Runtime(e) => write!(f, "runtime error: {}", e),
        }
    }
}

// Display already includes the wrapped error, so it is not reported again as
// a source.
impl std::error::Error for ExecutionError {}

impl From<ParseError> for ExecutionError {
    fn from(error: ParseError) -> Self {
        ExecutionError::Parse(error)
    }
}

impl From<DiagnosticError> for ExecutionError {
    fn from(error: DiagnosticError) -> Self {
        ExecutionError::Runtime(error)
    }
}
