use std::ops::Range;

use crate::ast::{BinaryOperator, Expression, TemplateString, TemplateStringPart, UnaryOperator};
use crate::parser::error::ParseError;
use crate::parser::lexer::{self, Spanned, Token};

// Binding powers (precedence). Higher = tighter binding.
const BP_OR: u8 = 1;
const BP_AND: u8 = 3;
const BP_NOT: u8 = 4;
const BP_EQUALITY: u8 = 5;
const BP_COMPARISON: u8 = 7;
const BP_ADDITIVE: u8 = 9;
const BP_MULTIPLICATIVE: u8 = 11;
const BP_UNARY: u8 = 13;

/// Cursor over a token stream, shared by the statement and expression parsers.
pub(crate) struct ExprParser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Byte offset used for "unexpected end" errors.
    end: usize,
}

impl ExprParser {
    pub(crate) fn new(tokens: Vec<Spanned>, end: usize) -> Self {
        ExprParser {
            tokens,
            pos: 0,
            end,
        }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    pub(crate) fn advance(&mut self) -> Option<Spanned> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn rewind(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Byte offset where the next token starts.
    pub(crate) fn current_start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start)
            .unwrap_or(self.end)
    }

    /// Byte offset where the most recently consumed token ends.
    pub(crate) fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.tokens.get(p))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn current_span(&self) -> Range<usize> {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.clone())
            .unwrap_or(self.end..self.end)
    }

    pub(crate) fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError::error(msg, self.current_span())
    }

    pub(crate) fn expect(&mut self, expected: Token, what: &str) -> Result<Spanned, ParseError> {
        if self.peek() == Some(&expected) {
            return self.advance().ok_or_else(|| self.error(what));
        }
        match self.peek() {
            Some(found) => Err(self.error(format!("expected {}, found {}", what, describe(found)))),
            None => Err(self.error(format!("expected {}, found end of code", what))),
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(Token::Newline)) {
            self.pos += 1;
        }
    }

    // ------------------------------------------------------------------
    // Pratt parser core
    // ------------------------------------------------------------------

    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;

        loop {
            let Some(token) = self.peek() else { break };
            let Some((l_bp, r_bp, operator)) = infix_bp(token) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let right = self.parse_expr(r_bp)?;
            left = Expression::BinaryOperation {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Expression::UnaryOperation {
                    operator: UnaryOperator::Negation,
                    operand: Box::new(operand),
                })
            }
            Some(Token::Bang) => {
                self.advance();
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Expression::UnaryOperation {
                    operator: UnaryOperator::LogicalNot,
                    operand: Box::new(operand),
                })
            }
            Some(Token::Not) => {
                self.advance();
                let operand = self.parse_expr(BP_NOT)?;
                Ok(Expression::UnaryOperation {
                    operator: UnaryOperator::LogicalNot,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let start = self.current_start();
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.advance();
                    let arguments = self.parse_comma_list(Token::RParen, "')'")?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        arguments,
                        span: start..self.last_end(),
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr(0)?;
                    self.expect(Token::RBracket, "']'")?;
                    expr = Expression::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                        span: start..self.last_end(),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let Some(spanned) = self.advance() else {
            return Err(self.error("unexpected end of expression"));
        };

        match spanned.token {
            Token::Number(n) => Ok(Expression::NumberLiteral(n)),
            Token::StringLit(s) => Ok(Expression::StringLiteral(s)),
            Token::FormatString(raw, offset) => Ok(Expression::FormatString(
                parse_template_string(&raw, offset)?,
            )),
            Token::True => Ok(Expression::BooleanLiteral(true)),
            Token::False => Ok(Expression::BooleanLiteral(false)),
            Token::NoneLit => Ok(Expression::NoneLiteral),
            Token::Ident(name) => Ok(Expression::VariableReference(name, spanned.span)),

            Token::LParen => {
                let inner = self.parse_expr(0)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }

            Token::LBracket => {
                let items = self.parse_comma_list(Token::RBracket, "']'")?;
                Ok(Expression::ListLiteral(items))
            }

            Token::LBrace => {
                let mut entries = Vec::new();
                loop {
                    self.skip_newlines();
                    if matches!(self.peek(), Some(Token::RBrace)) {
                        self.advance();
                        break;
                    }
                    let key = self.parse_expr(0)?;
                    self.skip_newlines();
                    self.expect(Token::Colon, "':' after map key")?;
                    self.skip_newlines();
                    let value = self.parse_expr(0)?;
                    entries.push((key, value));
                    self.skip_newlines();
                    match self.peek() {
                        Some(Token::Comma) => {
                            self.advance();
                        }
                        Some(Token::RBrace) => {
                            self.advance();
                            break;
                        }
                        _ => return Err(self.error("expected ',' or '}' in map literal")),
                    }
                }
                Ok(Expression::MapLiteral(entries))
            }

            other => Err(ParseError::error(
                format!("expected expression, found {}", describe(&other)),
                spanned.span,
            )),
        }
    }

    /// Parse `a, b, c` up to and including `close`. A trailing comma is allowed.
    fn parse_comma_list(
        &mut self,
        close: Token,
        what: &str,
    ) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&close) {
                self.advance();
                break;
            }
            items.push(self.parse_expr(0)?);
            if self.peek() == Some(&Token::Comma) {
                self.advance();
            } else if self.peek() == Some(&close) {
                self.advance();
                break;
            } else {
                return Err(self.error(format!("expected ',' or {}", what)));
            }
        }
        Ok(items)
    }
}

/// Infix binding powers: returns (left_bp, right_bp, operator) or None if not infix.
fn infix_bp(token: &Token) -> Option<(u8, u8, BinaryOperator)> {
    let (bp, op) = match token {
        Token::Or | Token::PipePipe => (BP_OR, BinaryOperator::LogicalOr),
        Token::And | Token::AmpAmp => (BP_AND, BinaryOperator::LogicalAnd),
        Token::EqEq => (BP_EQUALITY, BinaryOperator::Equality),
        Token::BangEq => (BP_EQUALITY, BinaryOperator::Inequality),
        Token::Gt => (BP_COMPARISON, BinaryOperator::GreaterThan),
        Token::Lt => (BP_COMPARISON, BinaryOperator::LessThan),
        Token::GtEq => (BP_COMPARISON, BinaryOperator::GreaterThanOrEqual),
        Token::LtEq => (BP_COMPARISON, BinaryOperator::LessThanOrEqual),
        Token::Plus => (BP_ADDITIVE, BinaryOperator::Addition),
        Token::Minus => (BP_ADDITIVE, BinaryOperator::Subtraction),
        Token::Star => (BP_MULTIPLICATIVE, BinaryOperator::Multiplication),
        Token::Slash => (BP_MULTIPLICATIVE, BinaryOperator::Division),
        Token::Percent => (BP_MULTIPLICATIVE, BinaryOperator::Modulo),
        _ => return None,
    };
    Some((bp, bp + 1, op))
}

pub(crate) fn describe(token: &Token) -> String {
    match token {
        Token::Newline => "end of line".to_string(),
        Token::Ident(name) => format!("identifier '{}'", name),
        Token::Number(n) => format!("number {}", n),
        Token::StringLit(_) | Token::FormatString(..) => "string".to_string(),
        other => format!("{:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Format string parsing
// ---------------------------------------------------------------------------

/// Split a raw f-string body into literal text and `{expr}` interpolations.
/// `offset` is the byte position of the body in the enclosing source.
fn parse_template_string(raw: &str, offset: usize) -> Result<TemplateString, ParseError> {
    let mut parts = Vec::new();
    let mut current_literal = String::new();
    let chars: Vec<(usize, char)> = raw.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                let pair: String = [c, chars[i + 1].1].iter().collect();
                current_literal.push_str(&lexer::unescape(&pair));
                i += 2;
            }
            '{' => {
                if !current_literal.is_empty() {
                    parts.push(TemplateStringPart::Literal(std::mem::take(
                        &mut current_literal,
                    )));
                }
                // Find matching }
                i += 1;
                let mut depth = 1u32;
                let start = i;
                while i < chars.len() {
                    match chars[i].1 {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(ParseError::error(
                        "unclosed '{' in format string",
                        offset + pos..offset + raw.len(),
                    ));
                }
                let expr_start = chars.get(start).map(|(b, _)| *b).unwrap_or(raw.len());
                let expr_end = chars[i].0;
                i += 1; // skip closing }

                let tokens = lexer::tokenize(&raw[expr_start..expr_end], offset + expr_start)?;
                let mut parser = ExprParser::new(tokens, offset + expr_end);
                let expr = parser.parse_expr(0)?;
                if !parser.at_end() {
                    return Err(parser.error("unexpected tokens in format string expression"));
                }
                parts.push(TemplateStringPart::Expression(expr));
            }
            _ => {
                current_literal.push(c);
                i += 1;
            }
        }
    }

    if !current_literal.is_empty() {
        parts.push(TemplateStringPart::Literal(current_literal));
    }
    if parts.is_empty() {
        return Ok(TemplateString::literal(""));
    }

    Ok(TemplateString { parts })
}
