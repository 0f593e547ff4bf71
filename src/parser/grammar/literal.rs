//! Literal parsers

use crate::ast::expression::{Boolean, Ident, Number, StringLiteral, Unit};
use crate::lexer::Token;

use crate::parser::combinators::{BoxedParser, expect_lparen, expect_rparen};
use crate::parser::state::{ParseError, ParseState, Parser};

fn unexpected(state: &mut ParseState, expected: &'static str) -> ParseError {
    let err = match state.peek() {
        Some(tok) => ParseError::new("unexpected token")
            .expected(expected)
            .found(tok.describe())
            .at(tok.pos()),
        None => ParseError::new("unexpected end of input").expected(expected),
    };
    state.record_error(err.clone());
    err
}

/// Parse a unit literal: "()"
pub fn unit() -> BoxedParser<Unit<()>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let start = expect_lparen().parse(state)?;
        let end = expect_rparen().parse(state)?;
        Ok(Unit {
            position: start.pos().merge(&end.pos()),
            info: (),
        })
    })
}

/// Parse an identifier
pub fn ident() -> BoxedParser<Ident<()>> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::Ident(_)) => match state.advance() {
            Some(Token::Ident(id)) => Ok(Ident {
                value: id.value,
                position: id.position,
                info: (),
            }),
            _ => Err(unexpected(state, "identifier")),
        },
        _ => Err(unexpected(state, "identifier")),
    })
}

/// Parse a number literal
pub fn number() -> BoxedParser<Number<()>> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::Number(_)) => match state.advance() {
            Some(Token::Number(num)) => {
                let value = num.value.parse::<f64>().map_err(|_| {
                    ParseError::new("invalid number literal")
                        .found(num.value.clone())
                        .at(num.position.clone())
                })?;
                Ok(Number {
                    value,
                    position: num.position,
                    info: (),
                })
            }
            _ => Err(unexpected(state, "number")),
        },
        _ => Err(unexpected(state, "number")),
    })
}

/// Parse a string literal, resolving escape sequences
pub fn string_literal() -> BoxedParser<StringLiteral<()>> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::StringLiteral(_)) => match state.advance() {
            Some(Token::StringLiteral(s)) => {
                let raw = s
                    .value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(&s.value);
                Ok(StringLiteral {
                    value: unescape(raw),
                    position: s.position,
                    info: (),
                })
            }
            _ => Err(unexpected(state, "string")),
        },
        _ => Err(unexpected(state, "string")),
    })
}

/// Parse a boolean literal
pub fn boolean() -> BoxedParser<Boolean<()>> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::True(_)) | Some(Token::False(_)) => match state.advance() {
            Some(Token::True(t)) => Ok(Boolean {
                value: true,
                position: t.position,
                info: (),
            }),
            Some(Token::False(f)) => Ok(Boolean {
                value: false,
                position: f.position,
                info: (),
            }),
            _ => Err(unexpected(state, "boolean")),
        },
        _ => Err(unexpected(state, "boolean")),
    })
}

fn unescape(raw: &str) -> String {
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
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

pub fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
