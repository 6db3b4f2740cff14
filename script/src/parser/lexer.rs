use std::ops::Range;

use crate::parser::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    // Literals
    Number(f64),
    StringLit(String),
    /// Raw f-string body (escapes unresolved) and the byte offset it starts at.
    FormatString(String, usize),
    True,
    False,
    NoneLit,

    Ident(String),

    // Keywords
    If,
    Else,
    For,
    In,
    And,
    Or,
    Not,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,     // =
    EqEq,   // ==
    BangEq, // !=
    Gt,
    Lt,
    GtEq,
    LtEq,
    AmpAmp,   // &&
    PipePipe, // ||
    Bang,     // !
    Comma,
    Colon,

    // Separators
    Semicolon,
    Newline,

    // Grouping
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Tokenize `text`. Spans are shifted by `base_offset` so nested f-string
/// expressions report positions in the enclosing source.
pub(crate) fn tokenize(text: &str, base_offset: usize) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = chars.len();
    let byte_at = |idx: usize| -> usize {
        base_offset + chars.get(idx).map(|(b, _)| *b).unwrap_or(text.len())
    };

    let mut tokens = Vec::new();
    // Newlines inside () and [] never end a statement.
    let mut nesting = 0usize;
    let mut i = 0;

    let push = |tokens: &mut Vec<Spanned>, token: Token, start: usize, end: usize| {
        tokens.push(Spanned {
            token,
            span: start..end,
        });
    };

    while i < len {
        let (_, c) = chars[i];
        let start = byte_at(i);
        match c {
            ' ' | '\t' | '\r' => {
                i += 1;
            }

            '\n' => {
                i += 1;
                if nesting == 0 {
                    push(&mut tokens, Token::Newline, start, byte_at(i));
                }
            }

            // Comment to end of line
            '#' => {
                while i < len && chars[i].1 != '\n' {
                    i += 1;
                }
            }

            '"' | '\'' => {
                let (raw, next) = scan_string(&chars, i, start)?;
                i = next;
                push(&mut tokens, Token::StringLit(unescape(&raw)), start, byte_at(i));
            }

            '0'..='9' => {
                let begin = i;
                while i < len && chars[i].1.is_ascii_digit() {
                    i += 1;
                }
                if i + 1 < len && chars[i].1 == '.' && chars[i + 1].1.is_ascii_digit() {
                    i += 1;
                    while i < len && chars[i].1.is_ascii_digit() {
                        i += 1;
                    }
                }
                let num_str: String = chars[begin..i].iter().map(|(_, c)| c).collect();
                let n = num_str.parse::<f64>().map_err(|_| {
                    ParseError::error(format!("invalid number '{}'", num_str), start..byte_at(i))
                })?;
                push(&mut tokens, Token::Number(n), start, byte_at(i));
            }

            'a'..='z' | 'A'..='Z' | '_' => {
                // Format string prefix
                if c == 'f' && i + 1 < len && matches!(chars[i + 1].1, '"' | '\'') {
                    let body_start = byte_at(i + 2);
                    let (raw, next) = scan_string(&chars, i + 1, start)?;
                    i = next;
                    push(
                        &mut tokens,
                        Token::FormatString(raw, body_start),
                        start,
                        byte_at(i),
                    );
                    continue;
                }

                let begin = i;
                while i < len && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                let ident: String = chars[begin..i].iter().map(|(_, c)| c).collect();
                let token = match ident.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "none" => Token::NoneLit,
                    "if" => Token::If,
                    "else" => Token::Else,
                    "for" => Token::For,
                    "in" => Token::In,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(ident),
                };
                push(&mut tokens, token, start, byte_at(i));
            }

            // Two-character operators
            '=' | '!' | '>' | '<' => {
                i += 1;
                let followed_by_eq = i < len && chars[i].1 == '=';
                if followed_by_eq {
                    i += 1;
                }
                let token = match (c, followed_by_eq) {
                    ('=', true) => Token::EqEq,
                    ('=', false) => Token::Eq,
                    ('!', true) => Token::BangEq,
                    ('!', false) => Token::Bang,
                    ('>', true) => Token::GtEq,
                    ('>', false) => Token::Gt,
                    ('<', true) => Token::LtEq,
                    _ => Token::Lt,
                };
                push(&mut tokens, token, start, byte_at(i));
            }
            '&' | '|' => {
                if i + 1 < len && chars[i + 1].1 == c {
                    i += 2;
                    let token = if c == '&' { Token::AmpAmp } else { Token::PipePipe };
                    push(&mut tokens, token, start, byte_at(i));
                } else {
                    return Err(ParseError::error(
                        format!("unexpected character '{}'", c),
                        start..byte_at(i + 1),
                    )
                    .with_note(format!("did you mean '{}{}'?", c, c)));
                }
            }

            // Single-character tokens
            '+' | '-' | '*' | '/' | '%' | ',' | ':' | ';' | '{' | '}' => {
                i += 1;
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    ';' => Token::Semicolon,
                    '{' => Token::LBrace,
                    _ => Token::RBrace,
                };
                push(&mut tokens, token, start, byte_at(i));
            }
            '(' | '[' => {
                i += 1;
                nesting += 1;
                let token = if c == '(' { Token::LParen } else { Token::LBracket };
                push(&mut tokens, token, start, byte_at(i));
            }
            ')' | ']' => {
                i += 1;
                nesting = nesting.saturating_sub(1);
                let token = if c == ')' { Token::RParen } else { Token::RBracket };
                push(&mut tokens, token, start, byte_at(i));
            }

            _ => {
                return Err(ParseError::error(
                    format!("unexpected character '{}'", c),
                    start..byte_at(i + 1),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Scan a quoted string starting at the quote at `open`. Returns the raw body
/// (escapes untouched) and the index just past the closing quote.
fn scan_string(
    chars: &[(usize, char)],
    open: usize,
    start: usize,
) -> Result<(String, usize), ParseError> {
    let quote = chars[open].1;
    let mut i = open + 1;
    let mut raw = String::new();
    while i < chars.len() {
        let c = chars[i].1;
        if c == '\\' && i + 1 < chars.len() {
            raw.push(c);
            raw.push(chars[i + 1].1);
            i += 2;
            continue;
        }
        if c == quote {
            return Ok((raw, i + 1));
        }
        if c == '\n' {
            break;
        }
        raw.push(c);
        i += 1;
    }
    let end = chars.get(i).map(|(b, _)| *b).unwrap_or(start + raw.len() + 1);
    Err(ParseError::error("unterminated string literal", start..end.max(start + 1)))
}

/// Resolve backslash escapes in a raw string body.
pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(e @ ('\\' | '\'' | '"' | '{' | '}')) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
