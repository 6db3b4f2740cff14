pub mod error;
mod expression;
mod lexer;
mod statement;

pub use error::ParseError;

use crate::Program;

/// Parser entry point.
pub struct Parser {
    source: String,
}

impl Parser {
    pub fn new(source: impl Into<String>) -> Self {
        Parser {
            source: source.into(),
        }
    }

    /// Parse the source into a complete Program.
    pub fn parse(&self) -> Result<Program, ParseError> {
        let tokens = lexer::tokenize(&self.source, 0)?;
        let statements = statement::parse_statements(tokens, self.source.len())?;
        Ok(Program { statements })
    }
}
