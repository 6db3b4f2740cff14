pub mod builtins;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod runtime_value;
pub mod scope;

pub use error::{DiagnosticError, ExecutionError, RuntimeError};
pub use evaluator::MAX_SEQUENCE_LEN;
pub use executor::Interpreter;
pub use runtime_value::{NativeFunction, RuntimeValue};
pub use scope::Scope;
