use crate::ast::Statement;
use crate::parser::error::ParseError;
use crate::parser::expression::{ExprParser, describe};
use crate::parser::lexer::{Spanned, Token};

/// Parse a full token stream into top-level statements.
pub(crate) fn parse_statements(
    tokens: Vec<Spanned>,
    source_len: usize,
) -> Result<Vec<Statement>, ParseError> {
    let mut parser = ExprParser::new(tokens, source_len);
    parse_body(&mut parser, false)
}

fn is_separator(token: Option<&Token>) -> bool {
    matches!(token, Some(Token::Newline | Token::Semicolon))
}

/// Parse statements until end of input, or until the closing `}` when `braced`.
fn parse_body(parser: &mut ExprParser, braced: bool) -> Result<Vec<Statement>, ParseError> {
    let mut statements = Vec::new();

    loop {
        while is_separator(parser.peek()) {
            parser.advance();
        }

        if parser.at_end() {
            if braced {
                return Err(parser.error("expected '}' to close block"));
            }
            break;
        }
        if braced && parser.peek() == Some(&Token::RBrace) {
            parser.advance();
            break;
        }

        statements.push(parse_statement(parser)?);

        // Every statement ends at a separator, a block close, or end of input.
        let terminated = parser.at_end()
            || is_separator(parser.peek())
            || (braced && parser.peek() == Some(&Token::RBrace));
        if !terminated {
            let found = parser.peek().map(describe).unwrap_or_default();
            return Err(parser.error(format!("expected end of statement, found {}", found)));
        }
    }

    Ok(statements)
}

fn parse_statement(parser: &mut ExprParser) -> Result<Statement, ParseError> {
    let start = parser.current_start();

    match parser.peek() {
        Some(Token::If) => parse_if(parser, start),
        Some(Token::For) => parse_for(parser, start),
        Some(Token::Ident(_)) if parser.peek_at(1) == Some(&Token::Eq) => {
            let variable = parser.expect_ident()?;
            parser.advance();
            let value = parser.parse_expr(0)?;
            Ok(Statement::Assignment {
                variable,
                value,
                span: start..parser.last_end(),
            })
        }
        Some(Token::Else) => Err(parser.error("'else' without a matching 'if'")),
        _ => {
            let value = parser.parse_expr(0)?;
            if parser.peek() == Some(&Token::Eq) {
                return Err(parser
                    .error("invalid assignment target")
                    .with_note("only plain variable names can be assigned to"));
            }
            Ok(Statement::Expression {
                value,
                span: start..parser.last_end(),
            })
        }
    }
}

fn parse_block(parser: &mut ExprParser) -> Result<Vec<Statement>, ParseError> {
    parser.expect(Token::LBrace, "'{' to open block")?;
    parse_body(parser, true)
}

fn parse_if(parser: &mut ExprParser, start: usize) -> Result<Statement, ParseError> {
    let mut branches = Vec::new();
    let mut otherwise = None;

    parser.expect(Token::If, "'if'")?;
    let condition = parser.parse_expr(0)?;
    let body = parse_block(parser)?;
    branches.push((condition, body));

    loop {
        // `else` may sit on the line after the closing brace.
        let checkpoint = parser.position();
        parser.skip_newlines();
        if parser.peek() != Some(&Token::Else) {
            parser.rewind(checkpoint);
            break;
        }
        parser.advance();

        if parser.peek() == Some(&Token::If) {
            parser.advance();
            let condition = parser.parse_expr(0)?;
            let body = parse_block(parser)?;
            branches.push((condition, body));
        } else {
            otherwise = Some(parse_block(parser)?);
            break;
        }
    }

    Ok(Statement::If {
        branches,
        otherwise,
        span: start..parser.last_end(),
    })
}

fn parse_for(parser: &mut ExprParser, start: usize) -> Result<Statement, ParseError> {
    parser.expect(Token::For, "'for'")?;
    let variable = parser.expect_ident()?;
    parser.expect(Token::In, "'in'")?;
    let iterable = parser.parse_expr(0)?;
    let body = parse_block(parser)?;

    Ok(Statement::For {
        variable,
        iterable,
        body,
        span: start..parser.last_end(),
    })
}
