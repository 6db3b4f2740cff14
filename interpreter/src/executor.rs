use std::io::Write;

use script::Program;
use script::ast::Statement;
use script::parser::Parser;

use crate::error::{DiagnosticError, ExecutionError, RuntimeError};
use crate::evaluator::{MAX_DEPTH, evaluate};
use crate::runtime_value::RuntimeValue;
use crate::scope::Scope;

/// Runs embedded code against a caller-owned [`Scope`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Interpreter
    }

    /// Parse and run `source`. Bindings persist in `scope`; everything the
    /// code prints is written to `output`.
    pub fn execute(
        &self,
        source: &str,
        scope: &mut Scope,
        output: &mut dyn Write,
    ) -> Result<(), ExecutionError> {
        let program = Parser::new(source).parse()?;
        self.run(&program, scope, output)?;
        Ok(())
    }

    /// Run an already parsed program.
    pub fn run(
        &self,
        program: &Program,
        scope: &mut Scope,
        output: &mut dyn Write,
    ) -> Result<(), DiagnosticError> {
        execute_statements(&program.statements, scope, output, 0)
    }
}

/// Execute statements in order, stopping at the first error.
pub fn execute_statements(
    statements: &[Statement],
    scope: &mut Scope,
    output: &mut dyn Write,
    depth: usize,
) -> Result<(), DiagnosticError> {
    if depth > MAX_DEPTH {
        return Err(RuntimeError::StackOverflow.into());
    }
    for statement in statements {
        execute_statement(statement, scope, output, depth)
            .map_err(|e| e.or_span(statement.span()))?;
    }
    Ok(())
}

fn execute_statement(
    statement: &Statement,
    scope: &mut Scope,
    output: &mut dyn Write,
    depth: usize,
) -> Result<(), DiagnosticError> {
    match statement {
        Statement::Assignment {
            variable, value, ..
        } => {
            let value = evaluate(value, scope, output, depth + 1)?;
            scope.set(variable.clone(), value);
        }

        Statement::Expression { value, .. } => {
            evaluate(value, scope, output, depth + 1)?;
        }

        Statement::If {
            branches,
            otherwise,
            ..
        } => {
            for (condition, body) in branches {
                if evaluate(condition, scope, output, depth + 1)?.is_truthy() {
                    return execute_statements(body, scope, output, depth + 1);
                }
            }
            if let Some(body) = otherwise {
                execute_statements(body, scope, output, depth + 1)?;
            }
        }

        Statement::For {
            variable,
            iterable,
            body,
            ..
        } => {
            let items = iteration_items(evaluate(iterable, scope, output, depth + 1)?)?;
            for item in items {
                scope.set(variable.clone(), item);
                execute_statements(body, scope, output, depth + 1)?;
            }
        }
    }
    Ok(())
}

/// Lists yield their items, maps their keys, strings their characters.
fn iteration_items(value: RuntimeValue) -> Result<Vec<RuntimeValue>, RuntimeError> {
    match value {
        RuntimeValue::List(items) => Ok(items),
        RuntimeValue::Map(entries) => Ok(entries.into_keys().map(RuntimeValue::String).collect()),
        RuntimeValue::String(s) => Ok(s
            .chars()
            .map(|c| RuntimeValue::String(c.to_string()))
            .collect()),
        other => Err(RuntimeError::TypeError {
            expected: "List, Map or String".to_string(),
            got: other.type_name().to_string(),
        }),
    }
}
