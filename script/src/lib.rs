pub mod ast;
pub mod parser;

use crate::ast::Statement;

/// A parsed piece of embedded code: one code segment or one template
/// expression.
#[derive(Debug, Clone)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
}
