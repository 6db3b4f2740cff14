use std::io::Write;

use interpreter::{ExecutionError, Interpreter, Scope};

/// Something that can run a piece of embedded code against a shared scope.
///
/// Implementations must write everything the code prints to `output` and
/// nowhere else.
pub trait Executor {
    fn execute(
        &self,
        code: &str,
        scope: &mut Scope,
        output: &mut dyn Write,
    ) -> Result<(), ExecutionError>;
}

impl Executor for Interpreter {
    fn execute(
        &self,
        code: &str,
        scope: &mut Scope,
        output: &mut dyn Write,
    ) -> Result<(), ExecutionError> {
        Interpreter::execute(self, code, scope, output)
    }
}

/// Run `code` and return what it printed.
pub fn capture(
    executor: &dyn Executor,
    code: &str,
    scope: &mut Scope,
) -> Result<String, ExecutionError> {
    let mut buffer = Vec::new();
    executor.execute(code, scope, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
